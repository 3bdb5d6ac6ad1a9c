//! Pledge quote command.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use chrono::Utc;
use console::Term;
use dialoguer::Select;
use pledge_commerce::catalog::RewardCatalog;
use pledge_commerce::checkout::{CheckoutStep, Location, PledgeFlow};
use pledge_commerce::pledge::{LineKind, PledgeBreakdown};
use pledge_commerce::{Money, PledgeError, RewardId};

use super::QuoteArgs;
use crate::context::Context;

const TOTAL_STEPS: u8 = 4;

/// Run the quote command.
pub fn run(args: QuoteArgs, ctx: &Context) -> Result<()> {
    let catalog = ctx.load_catalog(args.catalog.as_deref())?;
    let mut flow = PledgeFlow::new(Arc::clone(&catalog), ctx.limits(&catalog));

    if let Some(id) = &args.location {
        flow.set_location(find_location(&catalog, id))?;
    }

    announce(ctx, flow.step());
    match choose_reward(&args, &catalog, ctx)? {
        Some(id) => flow
            .select_reward(&id)
            .with_context(|| format!("Cannot select reward '{}'", id))?,
        None => flow.pledge_without_reward()?,
    }
    if let Some(bonus) = &args.bonus {
        let bonus = Money::parse(bonus, catalog.currency())
            .with_context(|| format!("Invalid bonus amount '{}'", bonus))?;
        flow.set_bonus_support(bonus)?;
    }

    if flow.advance()? == CheckoutStep::AddOnSelect {
        announce(ctx, flow.step());
        for spec in &args.add_ons {
            let (id, quantity) = parse_add_on(spec)?;
            apply_add_on(&mut flow, &id, quantity, ctx)?;
        }
        ctx.output.info(&flow.continue_label().text());
        flow.advance()?;
    } else if !args.add_ons.is_empty() {
        ctx.output.warn("The selected reward offers no add-ons; ignoring --add-on");
    }

    announce(ctx, flow.step());
    let breakdown = flow.breakdown()?;

    if args.dry_run {
        if ctx.output.is_json() {
            ctx.output.json(&serde_json::json!({
                "checkout_id": flow.id(),
                "step": flow.step(),
                "breakdown": breakdown,
                "converted_total": flow.converted_total(),
            }));
        } else {
            print_summary(&breakdown, &catalog, ctx);
            ctx.output.info("Dry run - pledge not finalized");
        }
        return Ok(());
    }

    flow.advance()?;
    announce(ctx, flow.step());
    let pledge = flow
        .finalized()
        .ok_or_else(|| anyhow!("Checkout ended without a finalized pledge"))?;

    if ctx.output.is_json() {
        ctx.output.json(pledge);
        return Ok(());
    }

    print_summary(&pledge.breakdown, &catalog, ctx);
    ctx.output.success(&format!(
        "Pledge {} ready for payment: {}",
        pledge.checkout_id,
        ctx.money(&pledge.total)
    ));
    Ok(())
}

fn announce(ctx: &Context, step: CheckoutStep) {
    ctx.output.step(step.number(), TOTAL_STEPS, step.display_name());
}

/// Reward from the arguments, or an interactive pick on a terminal.
fn choose_reward(args: &QuoteArgs, catalog: &RewardCatalog, ctx: &Context) -> Result<Option<RewardId>> {
    if args.no_reward {
        return Ok(None);
    }
    if let Some(id) = &args.reward {
        return Ok(Some(RewardId::new(id.as_str())));
    }
    if ctx.output.is_json() || !Term::stdout().is_term() {
        bail!("No reward given. Pass --reward <id> or --no-reward.");
    }

    let rewards = catalog.available_rewards(Utc::now());
    let mut items: Vec<String> = rewards
        .iter()
        .map(|r| format!("{} ({})", r.title, ctx.money(&r.price)))
        .collect();
    items.push("No reward, just support".to_string());

    let selection = Select::new()
        .with_prompt("Select a reward")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(rewards.get(selection).map(|r| r.id.clone()))
}

/// Location by id, named after the first rule or pickup point that uses it.
fn find_location(catalog: &RewardCatalog, id: &str) -> Location {
    catalog
        .rewards
        .iter()
        .chain(catalog.add_ons.iter())
        .flat_map(|tier| {
            tier.shipping_rules
                .iter()
                .map(|rule| &rule.location)
                .chain(tier.local_pickup.iter())
        })
        .find(|location| location.id.as_str() == id)
        .cloned()
        .unwrap_or_else(|| Location::new(id, id))
}

/// Parse `id` or `id=quantity`.
fn parse_add_on(spec: &str) -> Result<(RewardId, u32)> {
    let (id, quantity) = match spec.split_once('=') {
        Some((id, quantity)) => (
            id.trim(),
            quantity
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid add-on quantity in '{}'", spec))?,
        ),
        None => (spec.trim(), 1),
    };
    if id.is_empty() {
        bail!("Add-on id missing in '{}'", spec);
    }
    Ok((RewardId::new(id), quantity))
}

/// Select `quantity` units, settling for the cap when the tier runs out.
fn apply_add_on(flow: &mut PledgeFlow, id: &RewardId, quantity: u32, ctx: &Context) -> Result<()> {
    let delta = i32::try_from(quantity).context("Add-on quantity too large")?;
    match flow.select_add_on(id, delta) {
        Ok(_) => Ok(()),
        Err(PledgeError::LimitReached { cap, .. }) => {
            ctx.output.warn(&format!(
                "Only {} of '{}' can be selected; using {}",
                cap, id, cap
            ));
            let current = flow.selector().map_or(0, |s| s.quantity(id));
            let remaining = i32::try_from(cap.saturating_sub(current)).unwrap_or(i32::MAX);
            if remaining > 0 {
                flow.select_add_on(id, remaining)?;
            }
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Cannot add '{}'", id)),
    }
}

fn print_summary(breakdown: &PledgeBreakdown, catalog: &RewardCatalog, ctx: &Context) {
    ctx.output.header("Pledge summary");
    for line in &breakdown.lines {
        let amount = match line.kind {
            LineKind::AddOn if line.quantity > 1 => format!(
                "{} × {} = {}",
                line.quantity,
                ctx.money(&line.unit_price),
                ctx.money(&line.subtotal)
            ),
            _ => ctx.money(&line.subtotal),
        };
        ctx.output.kv(&line.label, &amount);
    }
    if breakdown.has_shipping() {
        ctx.output.kv("Shipping total", &ctx.money(&breakdown.shipping_total));
    }
    ctx.output
        .kv("Total", &ctx.money_with_converted(&breakdown.total, catalog));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_on() {
        assert_eq!(parse_add_on("dice").unwrap(), (RewardId::new("dice"), 1));
        assert_eq!(parse_add_on("dice=3").unwrap(), (RewardId::new("dice"), 3));
        assert_eq!(parse_add_on(" mat = 2 ").unwrap(), (RewardId::new("mat"), 2));
        assert!(parse_add_on("dice=-1").is_err());
        assert!(parse_add_on("=2").is_err());
    }

    #[test]
    fn test_find_location_uses_catalog_name() {
        let catalog = RewardCatalog::from_toml_str(
            r#"
            [project]
            id = "p"
            name = "P"
            currency = "USD"
            minimum_pledge = { amount_minor = 100, currency = "USD" }

            [[rewards]]
            id = "r"
            title = "R"
            price = { amount_minor = 1000, currency = "USD" }
            shipping_type = "single_location"

            [[rewards.shipping_rules]]
            location = { id = "ca", name = "Canada" }
            cost = { amount_minor = 500, currency = "USD" }
            "#,
        )
        .unwrap();

        assert_eq!(find_location(&catalog, "ca").name, "Canada");
        assert_eq!(find_location(&catalog, "xx").name, "xx");
    }
}
