//! Pledge error types.

use thiserror::Error;

/// Errors that can occur while composing a pledge.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PledgeError {
    /// Reward or add-on not found in the catalog.
    #[error("Reward not found: {0}")]
    RewardNotFound(String),

    /// Reward exists but cannot be backed right now (sold out or outside its window).
    #[error("Reward unavailable: {0}")]
    RewardUnavailable(String),

    /// Add-on is not offered alongside the selected base reward.
    #[error("Add-on {0} is not offered with the selected reward")]
    AddOnNotCompatible(String),

    /// Selecting another unit would exceed the tier's limit or remaining count.
    #[error("Limit reached for {reward_id}: at most {cap} can be selected")]
    LimitReached { reward_id: String, cap: u32 },

    /// No shipping rule covers a shippable reward for the chosen location.
    #[error("Shipping unavailable for {reward_id} to {location}")]
    ShippingUnavailable { reward_id: String, location: String },

    /// Pledge total is below the project minimum.
    #[error("Pledge of {amount} is below the minimum of {minimum}")]
    BelowMinimum { amount: String, minimum: String },

    /// Pledge total is above the project maximum.
    #[error("Pledge of {amount} is above the maximum of {maximum}")]
    AboveMaximum { amount: String, maximum: String },

    /// Malformed or negative money amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid checkout state transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Checkout cannot advance yet.
    #[error("Checkout incomplete: missing {0}")]
    CheckoutIncomplete(String),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Catalog data violates an invariant.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Currency formatting failed.
    #[error("Format error: {0}")]
    FormatError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PledgeError {
    /// Whether the UI can recover from this error without leaving the current step.
    ///
    /// `LimitReached` only disables the stepper; `ShippingUnavailable` blocks
    /// checkout until a different location or reward is chosen.
    pub fn is_blocking(&self) -> bool {
        !matches!(
            self,
            PledgeError::LimitReached { .. } | PledgeError::FormatError(_)
        )
    }
}

impl From<serde_json::Error> for PledgeError {
    fn from(e: serde_json::Error) -> Self {
        PledgeError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for PledgeError {
    fn from(e: toml::de::Error) -> Self {
        PledgeError::SerializationError(e.to_string())
    }
}
