//! Catalog validation command.

use anyhow::{bail, Result};
use chrono::Utc;
use pledge_commerce::catalog::{RewardCatalog, ShippingType};
use serde::Serialize;

use super::ValidateArgs;
use crate::context::Context;

#[derive(Serialize)]
struct ValidationReport {
    project: String,
    rewards: usize,
    add_ons: usize,
    available: usize,
    warnings: Vec<String>,
}

/// Run the validate command.
///
/// Hard invariants are enforced while loading; this adds warnings for data
/// that loads fine but will block or surprise backers.
pub fn run(args: ValidateArgs, ctx: &Context) -> Result<()> {
    ctx.output.header("Validating catalog");

    let catalog = match ctx.load_catalog(args.catalog.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            bail!("Catalog is invalid");
        }
    };

    let report = ValidationReport {
        project: catalog.project.name.clone(),
        rewards: catalog.rewards.len(),
        add_ons: catalog.add_ons.len(),
        available: catalog.available_rewards(Utc::now()).len(),
        warnings: catalog_warnings(&catalog),
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.kv("project", &report.project);
    ctx.output.kv("rewards", &report.rewards.to_string());
    ctx.output.kv("add-ons", &report.add_ons.to_string());
    ctx.output.kv("available now", &report.available.to_string());

    if report.warnings.is_empty() {
        ctx.output.success("Catalog is valid");
        return Ok(());
    }

    for warning in &report.warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }
    ctx.output.success("Catalog is valid (with warnings)");
    Ok(())
}

fn catalog_warnings(catalog: &RewardCatalog) -> Vec<String> {
    let mut warnings = Vec::new();

    for tier in catalog.rewards.iter().chain(catalog.add_ons.iter()) {
        if tier.requires_shipping() && tier.shipping_rules.is_empty() {
            warnings.push(format!(
                "{} ships ({}) but has no shipping rules; backers cannot check out",
                tier.id,
                tier.shipping_type.as_str()
            ));
        }
        if tier.shipping_type == ShippingType::LocalPickup && tier.local_pickup.is_none() {
            warnings.push(format!("{} is local pickup but names no pickup location", tier.id));
        }
        if tier.availability.is_sold_out() {
            warnings.push(format!("{} is sold out", tier.id));
        }
    }

    if catalog.add_ons.is_empty() && catalog.rewards.iter().any(|r| r.has_add_ons) {
        warnings.push("rewards offer add-ons but the catalog lists none".to_string());
    }

    warnings
}
