//! Pledge composition module.
//!
//! Contains add-on selection, the pledge composition, and amount aggregation.

mod composition;
mod pricing;
mod selection;

pub use composition::{PledgeComposition, SelectedAddOn};
pub use pricing::{compute_breakdown, compute_total, BreakdownLine, LineKind, PledgeBreakdown};
pub use selection::{AddOnSelection, AddOnSelector, ContinueLabel};
