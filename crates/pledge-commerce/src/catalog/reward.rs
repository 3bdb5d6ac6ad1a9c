//! Reward tier types.

use crate::catalog::RewardAvailability;
use crate::checkout::{Location, ShippingRule};
use crate::error::PledgeError;
use crate::ids::{ItemId, RewardId};
use crate::money::{Currency, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a tier is a base reward or an add-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    /// Selectable as the pledge's main reward.
    #[default]
    Base,
    /// Optional extra purchasable alongside a base reward.
    AddOn,
}

/// How a reward reaches the backer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingType {
    /// Nothing is shipped.
    #[default]
    None,
    /// Ships to one location only.
    SingleLocation,
    /// Ships to a list of locations.
    MultipleLocations,
    /// Collected in person.
    LocalPickup,
    /// Ships worldwide.
    Anywhere,
}

impl ShippingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingType::None => "none",
            ShippingType::SingleLocation => "single_location",
            ShippingType::MultipleLocations => "multiple_locations",
            ShippingType::LocalPickup => "local_pickup",
            ShippingType::Anywhere => "anywhere",
        }
    }

    /// Check if rewards of this type need a shipping rule.
    pub fn is_shippable(&self) -> bool {
        matches!(
            self,
            ShippingType::SingleLocation | ShippingType::MultipleLocations | ShippingType::Anywhere
        )
    }
}

/// An item included in a reward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardItem {
    /// Item identifier.
    pub item_id: ItemId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Units of this item in the reward.
    #[serde(default = "default_item_quantity")]
    pub quantity: u32,
    /// Delivered electronically.
    #[serde(default)]
    pub digital: bool,
}

fn default_item_quantity() -> u32 {
    1
}

impl RewardItem {
    /// Create a physical item.
    pub fn new(item_id: impl Into<ItemId>, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            quantity,
            digital: false,
        }
    }

    /// Create a single digital item.
    pub fn digital(item_id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            digital: true,
            ..Self::new(item_id, name, 1)
        }
    }
}

/// A priced pledge level, either a base reward or an add-on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewardTier {
    /// Unique reward identifier.
    pub id: RewardId,
    /// Display title.
    pub title: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Base reward or add-on.
    #[serde(default)]
    pub kind: RewardKind,
    /// Price per unit in project currency.
    pub price: Money,
    /// Limits and remaining count.
    #[serde(flatten)]
    pub availability: RewardAvailability,
    /// Delivery method.
    #[serde(default)]
    pub shipping_type: ShippingType,
    /// Whether add-ons are offered with this reward.
    #[serde(default)]
    pub has_add_ons: bool,
    /// Included items, in display order.
    #[serde(default)]
    pub items: Vec<RewardItem>,
    /// Per-location shipping costs.
    #[serde(default)]
    pub shipping_rules: Vec<ShippingRule>,
    /// Pickup location for local-pickup rewards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_pickup: Option<Location>,
    /// Reward becomes available at this time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    /// Reward stops being available at this time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Estimated delivery (e.g. "2027-03").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
}

impl RewardTier {
    /// Create an unlimited, non-shipping base reward.
    pub fn new(id: impl Into<RewardId>, title: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            kind: RewardKind::Base,
            price,
            availability: RewardAvailability::unlimited(),
            shipping_type: ShippingType::None,
            has_add_ons: false,
            items: Vec::new(),
            shipping_rules: Vec::new(),
            local_pickup: None,
            starts_at: None,
            ends_at: None,
            estimated_delivery: None,
        }
    }

    /// Create an unlimited, non-shipping add-on.
    pub fn add_on(id: impl Into<RewardId>, title: impl Into<String>, price: Money) -> Self {
        Self {
            kind: RewardKind::AddOn,
            ..Self::new(id, title, price)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_availability(mut self, availability: RewardAvailability) -> Self {
        self.availability = availability;
        self
    }

    /// Cap the reward at `limit` backers with `remaining` left.
    pub fn with_limit(mut self, limit: u32, remaining: u32) -> Self {
        self.availability.limit = Some(limit);
        self.availability.remaining = Some(remaining);
        self
    }

    pub fn with_limit_per_backer(mut self, cap: u32) -> Self {
        self.availability.limit_per_backer = Some(cap);
        self
    }

    pub fn with_shipping(mut self, shipping_type: ShippingType, rules: Vec<ShippingRule>) -> Self {
        self.shipping_type = shipping_type;
        self.shipping_rules = rules;
        self
    }

    pub fn with_local_pickup(mut self, location: Location) -> Self {
        self.shipping_type = ShippingType::LocalPickup;
        self.local_pickup = Some(location);
        self
    }

    pub fn with_item(mut self, item: RewardItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_add_ons(mut self, has_add_ons: bool) -> Self {
        self.has_add_ons = has_add_ons;
        self
    }

    pub fn with_window(mut self, starts_at: Option<DateTime<Utc>>, ends_at: Option<DateTime<Utc>>) -> Self {
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self
    }

    pub fn with_estimated_delivery(mut self, estimate: impl Into<String>) -> Self {
        self.estimated_delivery = Some(estimate.into());
        self
    }

    /// Check if this tier is an add-on.
    pub fn is_add_on(&self) -> bool {
        self.kind == RewardKind::AddOn
    }

    /// Check if delivering this reward costs shipping.
    ///
    /// A shippable type whose items are all digital ships nothing.
    pub fn requires_shipping(&self) -> bool {
        if !self.shipping_type.is_shippable() {
            return false;
        }
        self.items.is_empty() || self.items.iter().any(|item| !item.digital)
    }

    /// Check if the reward's availability window contains `now`.
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        let started = self.starts_at.map_or(true, |start| now >= start);
        let not_ended = self.ends_at.map_or(true, |end| now < end);
        started && not_ended
    }

    /// Check if the reward can be backed at `now`.
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        !self.availability.is_sold_out() && self.is_within_window(now)
    }

    /// Largest quantity one backer may select, or None if unbounded.
    pub fn selection_cap(&self) -> Option<u32> {
        self.availability.selection_cap()
    }

    /// Check the reward's invariants against the project currency.
    pub fn validate(&self, currency: Currency) -> Result<(), PledgeError> {
        let invalid = |msg: String| PledgeError::InvalidCatalog(format!("{}: {}", self.id, msg));

        self.availability
            .validate()
            .map_err(|e| invalid(e.to_string()))?;

        if self.price.currency != currency {
            return Err(invalid(format!(
                "price in {} but project uses {}",
                self.price.currency, currency
            )));
        }
        if self.price.is_negative() {
            return Err(invalid("negative price".to_string()));
        }
        if let Some(rule) = self
            .shipping_rules
            .iter()
            .find(|rule| rule.cost.currency != currency || rule.cost.is_negative())
        {
            return Err(invalid(format!(
                "shipping rule for {} has invalid cost {}",
                rule.location.id, rule.cost
            )));
        }
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at) {
            if end <= start {
                return Err(invalid("ends before it starts".to_string()));
            }
        }
        if self.is_add_on() && self.has_add_ons {
            return Err(invalid("add-ons cannot offer add-ons".to_string()));
        }
        Ok(())
    }
}
