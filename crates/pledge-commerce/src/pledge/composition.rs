//! The pledge being built by a checkout flow.

use crate::catalog::RewardTier;
use crate::checkout::{Location, ShippingRule};
use crate::error::PledgeError;
use crate::money::{Currency, Money};
use crate::pledge::{compute_breakdown, compute_total, AddOnSelection, PledgeBreakdown};
use serde::{Deserialize, Serialize};

/// An add-on chosen for the pledge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedAddOn {
    /// The add-on tier.
    pub reward: RewardTier,
    /// Units selected.
    pub quantity: u32,
    /// Shipping rule for the backer's location, if the add-on ships.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_rule: Option<ShippingRule>,
}

/// Reward, add-ons, shipping and bonus support making up one pledge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PledgeComposition {
    /// Project currency; every amount must be in it.
    pub currency: Currency,
    /// Main reward (None for a no-reward pledge).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_reward: Option<RewardTier>,
    /// Shipping rule for the base reward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_rule: Option<ShippingRule>,
    /// Chosen add-ons.
    #[serde(default)]
    pub add_ons: Vec<SelectedAddOn>,
    /// Backer's shipping location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Extra support beyond the reward price.
    pub bonus_support: Money,
}

impl PledgeComposition {
    /// Create an empty composition.
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            base_reward: None,
            shipping_rule: None,
            add_ons: Vec::new(),
            location: None,
            bonus_support: Money::zero(currency),
        }
    }

    /// Create a pledge with no reward, only support.
    pub fn no_reward(bonus_support: Money) -> Self {
        Self {
            bonus_support,
            ..Self::new(bonus_support.currency)
        }
    }

    pub fn with_base_reward(mut self, reward: RewardTier, shipping_rule: Option<ShippingRule>) -> Self {
        self.base_reward = Some(reward);
        self.shipping_rule = shipping_rule;
        self
    }

    pub fn with_add_on(mut self, reward: RewardTier, quantity: u32, shipping_rule: Option<ShippingRule>) -> Self {
        self.add_ons.push(SelectedAddOn {
            reward,
            quantity,
            shipping_rule,
        });
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_bonus_support(mut self, bonus: Money) -> Self {
        self.bonus_support = bonus;
        self
    }

    /// Check if this pledge has no reward.
    pub fn is_no_reward(&self) -> bool {
        self.base_reward.is_none()
    }

    /// Check if any selected reward ships.
    pub fn requires_shipping(&self) -> bool {
        self.base_reward
            .as_ref()
            .map_or(false, |r| r.requires_shipping())
            || self.add_ons.iter().any(|a| a.reward.requires_shipping())
    }

    /// Add-on quantities as a selection map.
    pub fn add_on_selection(&self) -> AddOnSelection {
        self.add_ons
            .iter()
            .map(|a| (a.reward.id.clone(), a.quantity))
            .collect()
    }

    /// Total add-on units, saturating at `u32::MAX`.
    pub fn add_on_count(&self) -> u32 {
        self.add_ons
            .iter()
            .fold(0u32, |sum, a| sum.saturating_add(a.quantity))
    }

    /// Set bonus support, rejecting negative or foreign-currency amounts.
    pub fn set_bonus_support(&mut self, bonus: Money) -> Result<(), PledgeError> {
        if bonus.currency != self.currency {
            return Err(PledgeError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: bonus.currency.code().to_string(),
            });
        }
        if bonus.is_negative() {
            return Err(PledgeError::InvalidAmount(format!(
                "bonus support cannot be negative: {}",
                bonus
            )));
        }
        self.bonus_support = bonus;
        Ok(())
    }

    /// Pledge total.
    pub fn total(&self) -> Result<Money, PledgeError> {
        compute_total(self)
    }

    /// Itemized pledge summary.
    pub fn breakdown(&self) -> Result<PledgeBreakdown, PledgeError> {
        compute_breakdown(self)
    }
}
