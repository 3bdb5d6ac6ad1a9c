//! Add-on quantity selection.

use crate::catalog::{RewardCatalog, RewardTier};
use crate::checkout::{shipping, Location};
use crate::error::PledgeError;
use crate::ids::RewardId;
use crate::pledge::SelectedAddOn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Selected quantity per add-on. Zero quantities are never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct AddOnSelection(BTreeMap<RewardId, u32>);

impl AddOnSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity selected for `id` (0 if absent).
    pub fn quantity(&self, id: &RewardId) -> u32 {
        self.0.get(id).copied().unwrap_or(0)
    }

    /// Set the quantity for `id`; zero removes the entry.
    pub fn set(&mut self, id: RewardId, quantity: u32) {
        if quantity == 0 {
            self.0.remove(&id);
        } else {
            self.0.insert(id, quantity);
        }
    }

    /// Sum of all quantities, saturating at `u32::MAX`.
    pub fn total_count(&self) -> u32 {
        self.0.values().fold(0u32, |sum, qty| sum.saturating_add(*qty))
    }

    /// Number of distinct add-ons selected.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate selected add-ons in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&RewardId, u32)> {
        self.0.iter().map(|(id, qty)| (id, *qty))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<(RewardId, u32)> for AddOnSelection {
    fn from_iter<I: IntoIterator<Item = (RewardId, u32)>>(iter: I) -> Self {
        let mut selection = Self::new();
        for (id, quantity) in iter {
            selection.set(id, quantity);
        }
        selection
    }
}

/// Label for the add-on step's continue button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueLabel {
    /// Nothing selected.
    Skip,
    /// Exactly one add-on unit.
    Single,
    /// More than one unit.
    Plural(u32),
}

impl ContinueLabel {
    pub fn from_count(count: u32) -> Self {
        match count {
            0 => ContinueLabel::Skip,
            1 => ContinueLabel::Single,
            n => ContinueLabel::Plural(n),
        }
    }

    pub fn text(&self) -> String {
        match self {
            ContinueLabel::Skip => "Skip add-ons".to_string(),
            ContinueLabel::Single => "Continue with 1 add-on".to_string(),
            ContinueLabel::Plural(n) => format!("Continue with {} add-ons", n),
        }
    }
}

/// Tracks add-on quantities for one base reward, enforcing each tier's cap.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOnSelector {
    offered: Vec<RewardTier>,
    selection: AddOnSelection,
}

impl AddOnSelector {
    /// Create a selector over the given add-ons.
    pub fn new(offered: impl IntoIterator<Item = RewardTier>) -> Self {
        Self {
            offered: offered.into_iter().collect(),
            selection: AddOnSelection::new(),
        }
    }

    /// Create a selector with the add-ons the catalog offers for `base`.
    pub fn for_reward(
        catalog: &RewardCatalog,
        base: &RewardTier,
        location: Option<&Location>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(catalog.add_ons_for(base, location, now).into_iter().cloned())
    }

    /// Restore a previous selection.
    ///
    /// Entries for add-ons that are no longer offered are dropped and
    /// quantities above the current cap are clamped.
    pub fn with_selection(mut self, selection: &AddOnSelection) -> Self {
        for (id, quantity) in selection.iter() {
            let Some(tier) = self.offered_tier(id) else {
                debug!(add_on = %id, "dropping add-on no longer offered");
                continue;
            };
            let clamped = tier.selection_cap().map_or(quantity, |cap| quantity.min(cap));
            self.selection.set(id.clone(), clamped);
        }
        self
    }

    fn offered_tier(&self, id: &RewardId) -> Option<&RewardTier> {
        self.offered.iter().find(|tier| &tier.id == id)
    }

    /// Apply a stepper change of `delta` units to `id`.
    ///
    /// Decrementing below zero leaves the quantity at zero. Incrementing past
    /// the tier's cap fails with `LimitReached` and changes nothing.
    pub fn select(&mut self, id: &RewardId, delta: i32) -> Result<&AddOnSelection, PledgeError> {
        let tier = self
            .offered_tier(id)
            .ok_or_else(|| PledgeError::AddOnNotCompatible(id.to_string()))?;
        let cap = tier.selection_cap();

        let current = i64::from(self.selection.quantity(id));
        let requested = current + i64::from(delta);

        let next = if delta <= 0 {
            requested.max(0)
        } else {
            let limit = i64::from(cap.unwrap_or(u32::MAX));
            if requested > limit {
                warn!(add_on = %id, cap = limit, "add-on limit reached");
                return Err(PledgeError::LimitReached {
                    reward_id: id.to_string(),
                    cap: cap.unwrap_or(u32::MAX),
                });
            }
            requested
        };

        // next is within [0, u32::MAX] here
        let next = u32::try_from(next).map_err(|_| PledgeError::Overflow)?;
        self.selection.set(id.clone(), next);
        debug!(add_on = %id, quantity = next, total = self.selection.total_count(), "add-on quantity changed");
        Ok(&self.selection)
    }

    /// Add one unit.
    pub fn increment(&mut self, id: &RewardId) -> Result<&AddOnSelection, PledgeError> {
        self.select(id, 1)
    }

    /// Remove one unit.
    pub fn decrement(&mut self, id: &RewardId) -> Result<&AddOnSelection, PledgeError> {
        self.select(id, -1)
    }

    /// Whether the increment control for `id` should be enabled.
    pub fn can_increment(&self, id: &RewardId) -> bool {
        self.offered_tier(id).map_or(false, |tier| {
            tier.selection_cap()
                .map_or(true, |cap| self.selection.quantity(id) < cap)
        })
    }

    pub fn quantity(&self, id: &RewardId) -> u32 {
        self.selection.quantity(id)
    }

    pub fn selection(&self) -> &AddOnSelection {
        &self.selection
    }

    /// Add-ons on offer, in catalog order.
    pub fn offered(&self) -> &[RewardTier] {
        &self.offered
    }

    /// Total selected units across all add-ons.
    pub fn total_count(&self) -> u32 {
        self.selection.total_count()
    }

    pub fn continue_label(&self) -> ContinueLabel {
        ContinueLabel::from_count(self.total_count())
    }

    /// Selected add-ons with their shipping rules resolved for `location`.
    pub fn selected_add_ons(&self, location: Option<&Location>) -> Result<Vec<SelectedAddOn>, PledgeError> {
        self.offered
            .iter()
            .filter_map(|tier| {
                let quantity = self.selection.quantity(&tier.id);
                (quantity > 0).then_some((tier, quantity))
            })
            .map(|(tier, quantity)| {
                Ok(SelectedAddOn {
                    reward: tier.clone(),
                    quantity,
                    shipping_rule: shipping::resolve_for_reward(location, tier)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};

    fn usd(amount: i64) -> Money {
        Money::from_major(amount, Currency::USD)
    }

    fn selector() -> AddOnSelector {
        AddOnSelector::new(vec![
            RewardTier::add_on("pin", "Enamel pin", usd(5)).with_limit(10, 3),
            RewardTier::add_on("sticker", "Stickers", usd(2)),
            RewardTier::add_on("sold-out", "Print", usd(30)).with_limit(1, 0),
        ])
    }

    #[test]
    fn test_increment_until_cap() {
        let mut s = selector();
        let pin = RewardId::new("pin");
        for _ in 0..3 {
            s.increment(&pin).unwrap();
        }
        assert_eq!(s.quantity(&pin), 3);
        assert!(!s.can_increment(&pin));

        let err = s.increment(&pin).unwrap_err();
        assert_eq!(
            err,
            PledgeError::LimitReached {
                reward_id: "pin".to_string(),
                cap: 3
            }
        );
        assert!(!err.is_blocking());
        assert_eq!(s.quantity(&pin), 3);
    }

    #[test]
    fn test_decrement_below_zero_is_noop() {
        let mut s = selector();
        let sticker = RewardId::new("sticker");
        s.decrement(&sticker).unwrap();
        s.decrement(&sticker).unwrap();
        assert_eq!(s.quantity(&sticker), 0);
        assert!(s.selection().is_empty());

        s.increment(&sticker).unwrap();
        s.select(&sticker, -5).unwrap();
        assert_eq!(s.quantity(&sticker), 0);
    }

    #[test]
    fn test_sold_out_add_on_cannot_be_selected() {
        let mut s = selector();
        let print = RewardId::new("sold-out");
        assert!(!s.can_increment(&print));
        assert!(matches!(
            s.increment(&print),
            Err(PledgeError::LimitReached { cap: 0, .. })
        ));
        assert_eq!(s.quantity(&print), 0);
    }

    #[test]
    fn test_unknown_add_on() {
        let mut s = selector();
        assert!(matches!(
            s.increment(&RewardId::new("nope")),
            Err(PledgeError::AddOnNotCompatible(_))
        ));
        assert!(!s.can_increment(&RewardId::new("nope")));
    }

    #[test]
    fn test_large_delta_is_rejected_whole() {
        let mut s = selector();
        let pin = RewardId::new("pin");
        assert!(s.select(&pin, 4).is_err());
        assert_eq!(s.quantity(&pin), 0);
        s.select(&pin, 3).unwrap();
        assert_eq!(s.quantity(&pin), 3);
    }

    #[test]
    fn test_continue_label() {
        let mut s = selector();
        assert_eq!(s.continue_label(), ContinueLabel::Skip);
        assert_eq!(s.continue_label().text(), "Skip add-ons");

        s.increment(&RewardId::new("pin")).unwrap();
        assert_eq!(s.continue_label().text(), "Continue with 1 add-on");

        s.select(&RewardId::new("sticker"), 2).unwrap();
        assert_eq!(s.continue_label(), ContinueLabel::Plural(3));
        assert_eq!(s.continue_label().text(), "Continue with 3 add-ons");
    }

    #[test]
    fn test_huge_unlimited_quantities_saturate_count() {
        let mut s = selector();
        let sticker = RewardId::new("sticker");
        s.select(&sticker, i32::MAX).unwrap();
        s.select(&sticker, i32::MAX).unwrap();
        s.increment(&RewardId::new("pin")).unwrap();
        s.increment(&RewardId::new("pin")).unwrap();

        assert_eq!(s.quantity(&sticker), 2 * i32::MAX as u32);
        assert_eq!(s.total_count(), u32::MAX);
        assert_eq!(s.continue_label(), ContinueLabel::Plural(u32::MAX));
    }

    #[test]
    fn test_restore_clamps_and_drops() {
        let previous: AddOnSelection = [
            (RewardId::new("pin"), 7),
            (RewardId::new("sticker"), 2),
            (RewardId::new("gone"), 1),
        ]
        .into_iter()
        .collect();

        let s = selector().with_selection(&previous);
        assert_eq!(s.quantity(&RewardId::new("pin")), 3);
        assert_eq!(s.quantity(&RewardId::new("sticker")), 2);
        assert_eq!(s.selection().len(), 2);
    }

    #[test]
    fn test_selection_serializes_as_map() {
        let selection: AddOnSelection = [(RewardId::new("pin"), 2)].into_iter().collect();
        assert_eq!(serde_json::to_string(&selection).unwrap(), r#"{"pin":2}"#);
    }
}
