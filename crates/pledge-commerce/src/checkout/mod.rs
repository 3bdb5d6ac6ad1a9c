//! Checkout module.
//!
//! Contains the pledge checkout state machine and shipping resolution.

mod flow;
pub mod shipping;

pub use flow::{CheckoutStep, FinalizedPledge, PledgeFlow};
pub use shipping::{Location, ShippingRule, ANYWHERE_LOCATION_ID};
