//! Pledge settings and minimum/maximum enforcement.

use crate::catalog::ProjectInfo;
use crate::error::PledgeError;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Client-side pledge settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PledgeSettings {
    /// Locale used for money formatting.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Show the converted amount next to totals when the project has an FX snapshot.
    #[serde(default = "default_true")]
    pub show_converted: bool,

    /// Replace the project's minimum pledge, in project minor units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pledge_override: Option<i64>,

    /// Replace the project's maximum pledge, in project minor units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pledge_override: Option<i64>,
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PledgeSettings {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            show_converted: true,
            min_pledge_override: None,
            max_pledge_override: None,
        }
    }
}

/// Bounds a pledge total must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PledgeLimits {
    /// Smallest total accepted for a no-reward pledge.
    pub minimum: Money,
    /// Largest total accepted.
    pub maximum: Option<Money>,
}

impl PledgeLimits {
    /// Limits from the project, with any overrides from settings applied.
    pub fn for_project(project: &ProjectInfo, settings: &PledgeSettings) -> Self {
        let currency = project.currency;
        Self {
            minimum: settings
                .min_pledge_override
                .map(|amount| Money::new(amount, currency))
                .unwrap_or(project.minimum_pledge),
            maximum: settings
                .max_pledge_override
                .map(|amount| Money::new(amount, currency))
                .or(project.maximum_pledge),
        }
    }

    /// Check a pledge total.
    ///
    /// The minimum only applies to pledges without a reward; a reward
    /// pledge is already at least the reward price.
    pub fn check(&self, total: &Money, has_reward: bool) -> Result<(), PledgeError> {
        if !has_reward && total.amount_minor < self.minimum.amount_minor {
            return Err(PledgeError::BelowMinimum {
                amount: total.display(),
                minimum: self.minimum.display(),
            });
        }
        if let Some(max) = self.maximum {
            if total.amount_minor > max.amount_minor {
                return Err(PledgeError::AboveMaximum {
                    amount: total.display(),
                    maximum: max.display(),
                });
            }
        }
        Ok(())
    }
}
