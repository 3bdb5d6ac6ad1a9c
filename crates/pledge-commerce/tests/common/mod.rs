//! Shared fixtures for integration tests.

#![allow(dead_code)]

use pledge_commerce::prelude::*;
use std::sync::Arc;

pub const CATALOG_TOML: &str = r#"
[project]
id = "hollow-deep"
name = "Hollow Deep: The Board Game"
currency = "USD"
minimum_pledge = { amount_minor = 100, currency = "USD" }
maximum_pledge = { amount_minor = 1000000, currency = "USD" }

[project.fx]
from = "USD"
to = "EUR"
rate = 0.92
taken_at = "2026-10-01T00:00:00Z"

[[rewards]]
id = "core-game"
title = "Core Game"
price = { amount_minor = 2000, currency = "USD" }
shipping_type = "multiple_locations"
has_add_ons = true

[[rewards.items]]
item_id = "box"
name = "Core box"

[[rewards.shipping_rules]]
location = { id = "us", name = "United States" }
cost = { amount_minor = 1000, currency = "USD" }

[[rewards.shipping_rules]]
location = { id = "anywhere", name = "Rest of world" }
cost = { amount_minor = 2500, currency = "USD" }

[[rewards]]
id = "early-bird"
title = "Early Bird"
price = { amount_minor = 1800, currency = "USD" }
limit = 1
remaining = 0
shipping_type = "anywhere"

[[rewards]]
id = "digital"
title = "Digital Edition"
price = { amount_minor = 1200, currency = "USD" }
shipping_type = "anywhere"

[[rewards.items]]
item_id = "pdf"
name = "Print and play PDF"
digital = true

[[add_ons]]
id = "dice"
title = "Metal Dice"
price = { amount_minor = 500, currency = "USD" }
limit = 200
remaining = 3

[[add_ons]]
id = "neoprene-mat"
title = "Neoprene Mat"
price = { amount_minor = 3000, currency = "USD" }
shipping_type = "single_location"

[[add_ons.shipping_rules]]
location = { id = "us", name = "United States" }
cost = { amount_minor = 400, currency = "USD" }

[[add_ons]]
id = "artbook"
title = "Artbook"
price = { amount_minor = 1500, currency = "USD" }
limit = 1
remaining = 0
"#;

pub fn usd(amount: i64) -> Money {
    Money::from_major(amount, Currency::USD)
}

pub fn us() -> Location {
    Location::new("us", "United States")
}

pub fn japan() -> Location {
    Location::new("jp", "Japan")
}

pub fn catalog() -> Arc<RewardCatalog> {
    Arc::new(RewardCatalog::from_toml_str(CATALOG_TOML).expect("fixture catalog is valid"))
}

pub fn flow() -> PledgeFlow {
    let catalog = catalog();
    let limits = PledgeLimits::for_project(&catalog.project, &PledgeSettings::default());
    PledgeFlow::new(catalog, limits)
}

/// A base reward with add-ons that ships to the US.
pub fn shipped_tier(id: &str, price: i64, shipping: i64) -> RewardTier {
    RewardTier::new(id, "Reward", usd(price))
        .with_add_ons(true)
        .with_shipping(
            ShippingType::MultipleLocations,
            vec![ShippingRule::new(us(), usd(shipping))],
        )
}

pub fn add_on(id: &str, price: i64) -> RewardTier {
    RewardTier::add_on(id, id, usd(price))
}

pub fn limited_add_on(id: &str, price: i64, limit: u32, remaining: u32) -> RewardTier {
    add_on(id, price).with_limit(limit, remaining)
}
