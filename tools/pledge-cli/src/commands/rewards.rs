//! Reward listing command.

use anyhow::Result;
use chrono::Utc;
use pledge_commerce::catalog::{RewardCatalog, RewardTier};
use pledge_commerce::checkout::shipping;
use serde::Serialize;

use super::RewardsArgs;
use crate::context::Context;
use crate::output::availability_badge;

#[derive(Serialize)]
struct RewardListing<'a> {
    project: &'a str,
    rewards: Vec<&'a RewardTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    add_ons: Option<Vec<&'a RewardTier>>,
}

/// Run the rewards command.
pub fn run(args: RewardsArgs, ctx: &Context) -> Result<()> {
    let catalog = ctx.load_catalog(args.catalog.as_deref())?;
    let now = Utc::now();

    let rewards: Vec<&RewardTier> = if args.all {
        catalog.rewards.iter().collect()
    } else {
        catalog.available_rewards(now)
    };
    let add_ons: Option<Vec<&RewardTier>> = args.add_ons.then(|| {
        catalog
            .add_ons
            .iter()
            .filter(|a| args.all || a.is_available_at(now))
            .collect()
    });

    if ctx.output.is_json() {
        ctx.output.json(&RewardListing {
            project: &catalog.project.name,
            rewards,
            add_ons,
        });
        return Ok(());
    }

    ctx.output.header(&format!("Rewards for {}", catalog.project.name));
    if rewards.is_empty() {
        ctx.output.info("No rewards available.");
    }
    print_tiers(&rewards, &catalog, ctx);

    if let Some(add_ons) = add_ons {
        ctx.output.header("Add-ons");
        if add_ons.is_empty() {
            ctx.output.info("No add-ons available.");
        }
        print_tiers(&add_ons, &catalog, ctx);
    }

    Ok(())
}

fn print_tiers(tiers: &[&RewardTier], catalog: &RewardCatalog, ctx: &Context) {
    let widths = [16, 28, 14, 18];
    ctx.output.table_row(&["ID", "TITLE", "PRICE", "SHIPPING"], &widths);
    for tier in tiers {
        let price = ctx.money_with_converted(&tier.price, catalog);
        let shipping = if tier.requires_shipping() {
            let count = shipping::shippable_locations(tier).len();
            format!("{} location(s)", count)
        } else {
            tier.shipping_type.as_str().to_string()
        };
        let badge = availability_badge(tier);
        ctx.output.table_row(
            &[
                tier.id.as_str(),
                tier.title.as_str(),
                price.as_str(),
                shipping.as_str(),
                badge.as_str(),
            ],
            &[widths[0], widths[1], widths[2], widths[3], 0],
        );
        if let Some(estimate) = &tier.estimated_delivery {
            ctx.output.kv("delivery", estimate);
        }
        for item in &tier.items {
            ctx.output.list_item(&format!("{} × {}", item.quantity, item.name));
        }
    }
}
