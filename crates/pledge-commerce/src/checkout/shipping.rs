//! Shipping locations, rules and rule resolution.

use crate::catalog::RewardTier;
use crate::error::PledgeError;
use crate::ids::LocationId;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Location id of a rule that covers every destination.
pub const ANYWHERE_LOCATION_ID: &str = "anywhere";

/// A shipping destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// Location identifier (country or region code).
    pub id: LocationId,
    /// Display name.
    pub name: String,
}

impl Location {
    /// Create a new location.
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The catch-all location used by "ships anywhere" rules.
    pub fn anywhere() -> Self {
        Self::new(ANYWHERE_LOCATION_ID, "Anywhere in the world")
    }

    /// Check if this is the catch-all location.
    pub fn is_anywhere(&self) -> bool {
        self.id.as_str() == ANYWHERE_LOCATION_ID
    }
}

/// Cost of delivering one unit of a reward to a location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingRule {
    /// Destination covered by this rule.
    pub location: Location,
    /// Cost per shipped unit.
    pub cost: Money,
}

impl ShippingRule {
    /// Create a new shipping rule.
    pub fn new(location: Location, cost: Money) -> Self {
        Self { location, cost }
    }

    /// Check if this rule ships for free.
    pub fn is_free(&self) -> bool {
        self.cost.is_zero()
    }
}

/// Find the rule for `location`, falling back to an "anywhere" rule.
pub fn resolve(location: &Location, candidates: &[ShippingRule]) -> Option<ShippingRule> {
    candidates
        .iter()
        .find(|rule| rule.location.id == location.id)
        .or_else(|| candidates.iter().find(|rule| rule.location.is_anywhere()))
        .cloned()
}

/// Resolve the shipping rule for a reward delivered to `location`.
///
/// Returns `Ok(None)` when the reward needs no shipping (no shipping type,
/// local pickup, or only digital items). A shippable reward with no location
/// or no matching rule is a data error and yields `ShippingUnavailable`.
pub fn resolve_for_reward(
    location: Option<&Location>,
    reward: &RewardTier,
) -> Result<Option<ShippingRule>, PledgeError> {
    if !reward.requires_shipping() {
        return Ok(None);
    }

    let Some(location) = location else {
        return Err(PledgeError::ShippingUnavailable {
            reward_id: reward.id.to_string(),
            location: "no location selected".to_string(),
        });
    };

    match resolve(location, &reward.shipping_rules) {
        Some(rule) => {
            debug!(reward = %reward.id, location = %location.id, cost = %rule.cost, "resolved shipping rule");
            Ok(Some(rule))
        }
        None => {
            warn!(reward = %reward.id, location = %location.id, "no shipping rule for location");
            Err(PledgeError::ShippingUnavailable {
                reward_id: reward.id.to_string(),
                location: location.name.clone(),
            })
        }
    }
}

/// Locations a reward can ship to, sorted by name, for a location picker.
pub fn shippable_locations(reward: &RewardTier) -> Vec<Location> {
    let mut locations: Vec<Location> = Vec::new();
    for rule in &reward.shipping_rules {
        if !locations.iter().any(|l| l.id == rule.location.id) {
            locations.push(rule.location.clone());
        }
    }
    locations.sort_by(|a, b| a.name.cmp(&b.name));
    locations
}
