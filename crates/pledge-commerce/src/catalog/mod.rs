//! Reward catalog module.
//!
//! Contains reward tiers, their availability, and the per-project catalog.

mod availability;
mod catalog;
mod reward;

pub use availability::RewardAvailability;
pub use catalog::{ProjectInfo, RewardCatalog};
pub use reward::{RewardItem, RewardKind, RewardTier, ShippingType};
