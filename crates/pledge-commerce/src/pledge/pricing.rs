//! Pledge amount aggregation.

use crate::error::PledgeError;
use crate::ids::RewardId;
use crate::money::{Currency, Money};
use crate::pledge::PledgeComposition;
use serde::{Deserialize, Serialize};

/// What a breakdown line is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Reward,
    AddOn,
    Shipping,
    BonusSupport,
}

/// One row of the checkout summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreakdownLine {
    pub kind: LineKind,
    /// Reward the line belongs to (None for bonus support).
    pub reward_id: Option<RewardId>,
    /// Display label.
    pub label: String,
    pub unit_price: Money,
    pub quantity: u32,
    /// unit_price * quantity.
    pub subtotal: Money,
}

/// Complete pricing breakdown for a pledge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PledgeBreakdown {
    /// Base reward price.
    pub reward_total: Money,
    /// Sum of add-on price * quantity.
    pub add_ons_total: Money,
    /// Base and add-on shipping.
    pub shipping_total: Money,
    /// Extra support.
    pub bonus_support: Money,
    /// reward + add-ons + shipping + bonus.
    pub total: Money,
    /// Itemized rows in display order.
    pub lines: Vec<BreakdownLine>,
}

impl PledgeBreakdown {
    /// Check if any shipping is charged.
    pub fn has_shipping(&self) -> bool {
        self.shipping_total.is_positive()
    }
}

fn line(
    kind: LineKind,
    reward_id: Option<RewardId>,
    label: String,
    unit_price: Money,
    quantity: u32,
    currency: Currency,
) -> Result<BreakdownLine, PledgeError> {
    if unit_price.currency != currency {
        return Err(PledgeError::CurrencyMismatch {
            expected: currency.code().to_string(),
            got: unit_price.currency.code().to_string(),
        });
    }
    Ok(BreakdownLine {
        kind,
        reward_id,
        label,
        unit_price,
        quantity,
        subtotal: unit_price.try_multiply(i64::from(quantity))?,
    })
}

/// Itemize a pledge.
///
/// Every reward line that ships adds its own rule cost per unit. The result
/// depends only on the final quantities, not on selection order.
pub fn compute_breakdown(composition: &PledgeComposition) -> Result<PledgeBreakdown, PledgeError> {
    let currency = composition.currency;
    let mut lines = Vec::new();

    if let Some(reward) = &composition.base_reward {
        lines.push(line(
            LineKind::Reward,
            Some(reward.id.clone()),
            reward.title.clone(),
            reward.price,
            1,
            currency,
        )?);
        if let Some(rule) = &composition.shipping_rule {
            lines.push(line(
                LineKind::Shipping,
                Some(reward.id.clone()),
                format!("Shipping to {}", rule.location.name),
                rule.cost,
                1,
                currency,
            )?);
        }
    }

    for add_on in composition.add_ons.iter().filter(|a| a.quantity > 0) {
        lines.push(line(
            LineKind::AddOn,
            Some(add_on.reward.id.clone()),
            add_on.reward.title.clone(),
            add_on.reward.price,
            add_on.quantity,
            currency,
        )?);
        if let Some(rule) = &add_on.shipping_rule {
            lines.push(line(
                LineKind::Shipping,
                Some(add_on.reward.id.clone()),
                format!("{} shipping to {}", add_on.reward.title, rule.location.name),
                rule.cost,
                add_on.quantity,
                currency,
            )?);
        }
    }

    if composition.bonus_support.is_positive() {
        lines.push(line(
            LineKind::BonusSupport,
            None,
            "Bonus support".to_string(),
            composition.bonus_support,
            1,
            currency,
        )?);
    } else if composition.bonus_support.currency != currency {
        return Err(PledgeError::CurrencyMismatch {
            expected: currency.code().to_string(),
            got: composition.bonus_support.currency.code().to_string(),
        });
    }

    let sum_of = |kind: LineKind| {
        Money::try_sum(
            lines.iter().filter(|l| l.kind == kind).map(|l| &l.subtotal),
            currency,
        )
    };
    let reward_total = sum_of(LineKind::Reward)?;
    let add_ons_total = sum_of(LineKind::AddOn)?;
    let shipping_total = sum_of(LineKind::Shipping)?;
    let bonus_support = sum_of(LineKind::BonusSupport)?;
    let total = Money::try_sum(
        [reward_total, add_ons_total, shipping_total, bonus_support].iter(),
        currency,
    )?;

    Ok(PledgeBreakdown {
        reward_total,
        add_ons_total,
        shipping_total,
        bonus_support,
        total,
        lines,
    })
}

/// Pledge total in project currency.
pub fn compute_total(composition: &PledgeComposition) -> Result<Money, PledgeError> {
    compute_breakdown(composition).map(|b| b.total)
}
