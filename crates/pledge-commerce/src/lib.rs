//! Reward and add-on pledge composition for crowdfunding checkouts.
//!
//! - **Catalog**: Reward tiers, add-ons, availability limits
//! - **Pledge**: Add-on selection, composition, amount aggregation
//! - **Checkout**: Shipping rule resolution, the multi-step pledge flow
//! - **FX**: Display-only currency conversion and locale formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use pledge_commerce::prelude::*;
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(RewardCatalog::from_toml_str(&std::fs::read_to_string("catalog.toml")?)?);
//! let limits = PledgeLimits::for_project(&catalog.project, &PledgeSettings::default());
//!
//! let mut flow = PledgeFlow::new(catalog, limits);
//! flow.set_location(Location::new("us", "United States"))?;
//! flow.select_reward(&RewardId::new("core-game"))?;
//! flow.advance()?;
//! flow.select_add_on(&RewardId::new("dice"), 2)?;
//! flow.advance()?;
//! println!("Total: {}", flow.total()?.display());
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod catalog;
pub mod checkout;
pub mod fx;
pub mod pledge;
pub mod settings;

pub use error::PledgeError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::PledgeError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Catalog
    pub use crate::catalog::{
        ProjectInfo, RewardAvailability, RewardCatalog, RewardItem, RewardKind, RewardTier,
        ShippingType,
    };

    // Pledge
    pub use crate::pledge::{
        compute_breakdown, compute_total, AddOnSelection, AddOnSelector, BreakdownLine,
        ContinueLabel, LineKind, PledgeBreakdown, PledgeComposition, SelectedAddOn,
    };

    // Checkout
    pub use crate::checkout::{CheckoutStep, FinalizedPledge, Location, PledgeFlow, ShippingRule};

    pub use crate::fx::{FxSnapshot, MoneyFormatter, StandardFormatter};
    pub use crate::settings::{PledgeLimits, PledgeSettings};
}
