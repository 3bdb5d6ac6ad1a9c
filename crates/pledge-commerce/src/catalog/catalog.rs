//! Project reward catalog.

use crate::catalog::{RewardKind, RewardTier};
use crate::checkout::{shipping, Location};
use crate::error::PledgeError;
use crate::fx::FxSnapshot;
use crate::ids::{ProjectId, RewardId};
use crate::money::{Currency, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Project-level pledge settings that come with the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectInfo {
    /// Project identifier.
    pub id: ProjectId,
    /// Project name.
    pub name: String,
    /// Currency all amounts are computed in.
    pub currency: Currency,
    /// Smallest pledge accepted (applies to no-reward pledges).
    pub minimum_pledge: Money,
    /// Largest pledge accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_pledge: Option<Money>,
    /// Exchange rate captured when the project was loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<FxSnapshot>,
}

/// Read-only list of base rewards and add-ons for one project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewardCatalog {
    pub project: ProjectInfo,
    #[serde(default)]
    pub rewards: Vec<RewardTier>,
    #[serde(default)]
    pub add_ons: Vec<RewardTier>,
}

impl RewardCatalog {
    /// Create and validate a catalog.
    pub fn new(
        project: ProjectInfo,
        rewards: Vec<RewardTier>,
        add_ons: Vec<RewardTier>,
    ) -> Result<Self, PledgeError> {
        let mut catalog = Self {
            project,
            rewards,
            add_ons,
        };
        catalog.normalize_kinds();
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a TOML catalog.
    pub fn from_toml_str(input: &str) -> Result<Self, PledgeError> {
        let catalog: RewardCatalog = toml::from_str(input)?;
        Self::new(catalog.project, catalog.rewards, catalog.add_ons)
    }

    /// Parse and validate a JSON catalog.
    pub fn from_json_str(input: &str) -> Result<Self, PledgeError> {
        let catalog: RewardCatalog = serde_json::from_str(input)?;
        Self::new(catalog.project, catalog.rewards, catalog.add_ons)
    }

    /// Tiers listed under `add_ons` are add-ons regardless of their `kind` field.
    fn normalize_kinds(&mut self) {
        for reward in &mut self.rewards {
            reward.kind = RewardKind::Base;
        }
        for add_on in &mut self.add_ons {
            add_on.kind = RewardKind::AddOn;
        }
    }

    /// Check every catalog invariant.
    pub fn validate(&self) -> Result<(), PledgeError> {
        let currency = self.project.currency;

        if self.project.minimum_pledge.currency != currency
            || self.project.minimum_pledge.is_negative()
        {
            return Err(PledgeError::InvalidCatalog(format!(
                "minimum pledge {} is not a valid {} amount",
                self.project.minimum_pledge, currency
            )));
        }
        if let Some(max) = self.project.maximum_pledge {
            if max.currency != currency || max.amount_minor < self.project.minimum_pledge.amount_minor {
                return Err(PledgeError::InvalidCatalog(format!(
                    "maximum pledge {} is not a valid {} amount above the minimum",
                    max, currency
                )));
            }
        }
        if let Some(fx) = &self.project.fx {
            if fx.from != currency {
                return Err(PledgeError::InvalidCatalog(format!(
                    "fx snapshot converts from {} but project uses {}",
                    fx.from, currency
                )));
            }
            fx.validate()?;
        }

        let mut seen = HashSet::new();
        for tier in self.rewards.iter().chain(self.add_ons.iter()) {
            if !seen.insert(tier.id.clone()) {
                return Err(PledgeError::InvalidCatalog(format!(
                    "duplicate reward id {}",
                    tier.id
                )));
            }
            tier.validate(currency)?;
        }
        Ok(())
    }

    /// Project currency.
    pub fn currency(&self) -> Currency {
        self.project.currency
    }

    /// Look up a base reward.
    pub fn reward(&self, id: &RewardId) -> Option<&RewardTier> {
        self.rewards.iter().find(|r| &r.id == id)
    }

    /// Look up an add-on.
    pub fn add_on(&self, id: &RewardId) -> Option<&RewardTier> {
        self.add_ons.iter().find(|r| &r.id == id)
    }

    /// Look up any tier by id.
    pub fn find(&self, id: &RewardId) -> Option<&RewardTier> {
        self.reward(id).or_else(|| self.add_on(id))
    }

    /// Base rewards that can be backed at `now`, in catalog order.
    pub fn available_rewards(&self, now: DateTime<Utc>) -> Vec<&RewardTier> {
        self.rewards
            .iter()
            .filter(|r| r.is_available_at(now))
            .collect()
    }

    /// Add-ons offered with `base` for a backer in `location`.
    ///
    /// Only available add-ons are offered. Add-ons that need shipping are
    /// offered only when they have a rule for the location. A local-pickup
    /// base reward offers add-ons picked up at the same place and add-ons
    /// that need no delivery; pickup add-ons need a base picked up there.
    pub fn add_ons_for(
        &self,
        base: &RewardTier,
        location: Option<&Location>,
        now: DateTime<Utc>,
    ) -> Vec<&RewardTier> {
        if !base.has_add_ons {
            return Vec::new();
        }

        let offered: Vec<&RewardTier> = self
            .add_ons
            .iter()
            .filter(|add_on| add_on.is_available_at(now))
            .filter(|add_on| match (&base.local_pickup, &add_on.local_pickup) {
                (Some(base_pickup), Some(pickup)) => base_pickup.id == pickup.id,
                (None, Some(_)) => false,
                (Some(_), None) => !add_on.requires_shipping(),
                (None, None) => {
                    !add_on.requires_shipping()
                        || location.map_or(false, |loc| {
                            shipping::resolve(loc, &add_on.shipping_rules).is_some()
                        })
                }
            })
            .collect();

        debug!(base = %base.id, offered = offered.len(), "computed offered add-ons");
        offered
    }
}
