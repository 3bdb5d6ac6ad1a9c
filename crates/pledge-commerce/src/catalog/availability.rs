//! Backer limits and remaining counts for a reward tier.

use crate::error::PledgeError;
use serde::{Deserialize, Serialize};

/// How many more of a reward can be backed.
///
/// `remaining` is owned by the platform's system of record; locally it only
/// ever decreases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RewardAvailability {
    /// Maximum number of backers (None = unlimited).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Units still available (None = unlimited).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    /// Maximum quantity a single backer may select (add-ons only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_per_backer: Option<u32>,
}

impl RewardAvailability {
    /// Availability with no limits at all.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Availability capped at `limit` backers with `remaining` left.
    pub fn limited(limit: u32, remaining: u32) -> Self {
        Self {
            limit: Some(limit),
            remaining: Some(remaining),
            limit_per_backer: None,
        }
    }

    /// Set the per-backer cap.
    pub fn with_limit_per_backer(mut self, cap: u32) -> Self {
        self.limit_per_backer = Some(cap);
        self
    }

    /// Check if no units are left.
    pub fn is_sold_out(&self) -> bool {
        self.remaining == Some(0) || self.limit == Some(0)
    }

    /// Largest quantity one backer can select, or None if unbounded.
    pub fn selection_cap(&self) -> Option<u32> {
        [self.limit, self.remaining, self.limit_per_backer]
            .into_iter()
            .flatten()
            .min()
    }

    /// Check the `remaining <= limit` invariant.
    pub fn validate(&self) -> Result<(), PledgeError> {
        if let (Some(limit), Some(remaining)) = (self.limit, self.remaining) {
            if remaining > limit {
                return Err(PledgeError::InvalidCatalog(format!(
                    "remaining {} exceeds limit {}",
                    remaining, limit
                )));
            }
        }
        Ok(())
    }
}
