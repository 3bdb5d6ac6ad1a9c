//! Pledge checkout state machine.

use crate::catalog::{RewardCatalog, RewardTier};
use crate::checkout::{shipping, Location, ShippingRule};
use crate::error::PledgeError;
use crate::ids::{CheckoutId, ProjectId, RewardId};
use crate::money::Money;
use crate::pledge::{
    AddOnSelection, AddOnSelector, ContinueLabel, PledgeBreakdown, PledgeComposition,
    SelectedAddOn,
};
use crate::settings::PledgeLimits;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Steps in the pledge flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    /// Choosing a base reward (or no reward).
    RewardSelect,
    /// Choosing add-on quantities.
    AddOnSelect,
    /// Reviewing location, bonus support and the summary.
    ConfirmDetails,
    /// Handed to payment processing.
    Payment,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::RewardSelect => "reward_select",
            CheckoutStep::AddOnSelect => "add_on_select",
            CheckoutStep::ConfirmDetails => "confirm_details",
            CheckoutStep::Payment => "payment",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CheckoutStep::RewardSelect => "Select reward",
            CheckoutStep::AddOnSelect => "Add-ons",
            CheckoutStep::ConfirmDetails => "Confirm",
            CheckoutStep::Payment => "Payment",
        }
    }

    /// Get the step number (1-indexed).
    pub fn number(&self) -> u8 {
        match self {
            CheckoutStep::RewardSelect => 1,
            CheckoutStep::AddOnSelect => 2,
            CheckoutStep::ConfirmDetails => 3,
            CheckoutStep::Payment => 4,
        }
    }
}

/// Immutable snapshot of a confirmed pledge, handed to payment processing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalizedPledge {
    pub checkout_id: CheckoutId,
    pub project_id: ProjectId,
    pub composition: PledgeComposition,
    pub breakdown: PledgeBreakdown,
    /// Amount to charge, in project currency.
    pub total: Money,
    /// Display-only total in the backer's currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_total: Option<Money>,
    pub finalized_at: DateTime<Utc>,
}

/// One backer's pass through the pledge flow.
///
/// Owns the pledge composition exclusively; the catalog is shared and never
/// mutated. Every operation is synchronous.
#[derive(Debug, Clone)]
pub struct PledgeFlow {
    id: CheckoutId,
    catalog: Arc<RewardCatalog>,
    limits: PledgeLimits,
    step: CheckoutStep,
    history: Vec<CheckoutStep>,
    reward_chosen: bool,
    composition: PledgeComposition,
    selector: Option<AddOnSelector>,
    finalized: Option<FinalizedPledge>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PledgeFlow {
    /// Open a new pledge flow for the catalog's project.
    pub fn new(catalog: Arc<RewardCatalog>, limits: PledgeLimits) -> Self {
        let now = Utc::now();
        let composition = PledgeComposition::new(catalog.currency());
        Self {
            id: CheckoutId::generate(),
            catalog,
            limits,
            step: CheckoutStep::RewardSelect,
            history: Vec::new(),
            reward_chosen: false,
            composition,
            selector: None,
            finalized: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a flow at `ConfirmDetails` from a saved composition.
    ///
    /// Rewards are re-read from the catalog and shipping is re-resolved, so
    /// a stale saved copy cannot smuggle in old prices.
    pub fn resume(
        catalog: Arc<RewardCatalog>,
        limits: PledgeLimits,
        saved: &PledgeComposition,
    ) -> Result<Self, PledgeError> {
        let mut flow = Self::new(catalog, limits);
        if let Some(location) = &saved.location {
            flow.composition.location = Some(location.clone());
        }
        match &saved.base_reward {
            Some(reward) => flow.select_reward(&reward.id)?,
            None => flow.pledge_without_reward()?,
        }
        flow.composition.set_bonus_support(saved.bonus_support)?;

        flow.advance()?;
        if flow.step == CheckoutStep::AddOnSelect {
            let selection = saved.add_on_selection();
            flow.selector = flow.selector.take().map(|s| s.with_selection(&selection));
            flow.advance()?;
        }
        Ok(flow)
    }

    pub fn id(&self) -> &CheckoutId {
        &self.id
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn catalog(&self) -> &RewardCatalog {
        &self.catalog
    }

    pub fn limits(&self) -> &PledgeLimits {
        &self.limits
    }

    pub fn composition(&self) -> &PledgeComposition {
        &self.composition
    }

    /// The add-on selector, once the flow has reached the add-on step.
    pub fn selector(&self) -> Option<&AddOnSelector> {
        self.selector.as_ref()
    }

    /// The confirmed pledge, once the flow has reached payment.
    pub fn finalized(&self) -> Option<&FinalizedPledge> {
        self.finalized.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.step == CheckoutStep::Payment
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn ensure_step(&self, allowed: &[CheckoutStep], action: &str) -> Result<(), PledgeError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(PledgeError::InvalidTransition {
                from: self.step.as_str().to_string(),
                to: action.to_string(),
            })
        }
    }

    /// Choose the base reward.
    ///
    /// Switching to a different reward clears the add-on selection.
    pub fn select_reward(&mut self, id: &RewardId) -> Result<(), PledgeError> {
        self.ensure_step(&[CheckoutStep::RewardSelect], "select_reward")?;

        let reward = self
            .catalog
            .reward(id)
            .cloned()
            .ok_or_else(|| PledgeError::RewardNotFound(id.to_string()))?;
        if !reward.is_available_at(Utc::now()) {
            return Err(PledgeError::RewardUnavailable(id.to_string()));
        }

        let changed = self.composition.base_reward.as_ref().map(|r| &r.id) != Some(id);
        if changed || !self.reward_chosen {
            self.clear_add_ons();
        }
        self.composition.base_reward = Some(reward);
        self.reward_chosen = true;
        self.touch();
        debug!(checkout = %self.id, reward = %id, "reward selected");
        Ok(())
    }

    /// Pledge without a reward; the total is bonus support alone.
    pub fn pledge_without_reward(&mut self) -> Result<(), PledgeError> {
        self.ensure_step(&[CheckoutStep::RewardSelect], "pledge_without_reward")?;
        self.composition.base_reward = None;
        self.clear_add_ons();
        self.reward_chosen = true;
        self.touch();
        debug!(checkout = %self.id, "no-reward pledge selected");
        Ok(())
    }

    fn clear_add_ons(&mut self) {
        self.selector = None;
        self.composition.add_ons.clear();
        self.composition.shipping_rule = None;
    }

    /// Set the backer's shipping location.
    ///
    /// From the add-on step on, a location that a selected add-on cannot
    /// reach is rejected with `ShippingUnavailable` and nothing changes. At
    /// `ConfirmDetails` shipping is re-resolved immediately and the location
    /// is only accepted if every shippable reward covers it.
    pub fn set_location(&mut self, location: Location) -> Result<(), PledgeError> {
        self.ensure_step(
            &[
                CheckoutStep::RewardSelect,
                CheckoutStep::AddOnSelect,
                CheckoutStep::ConfirmDetails,
            ],
            "set_location",
        )?;

        if let (Some(selector), Some(base)) = (&self.selector, &self.composition.base_reward) {
            let rebuilt = AddOnSelector::for_reward(&self.catalog, base, Some(&location), Utc::now())
                .with_selection(selector.selection());

            if self.step != CheckoutStep::RewardSelect {
                let lost = selector
                    .selection()
                    .iter()
                    .map(|(id, _)| id)
                    .find(|id| !rebuilt.offered().iter().any(|tier| &tier.id == *id));
                if let Some(id) = lost {
                    warn!(checkout = %self.id, add_on = %id, location = %location.id, "selected add-on cannot ship to location");
                    return Err(PledgeError::ShippingUnavailable {
                        reward_id: id.to_string(),
                        location: location.name.clone(),
                    });
                }
            }

            if self.step == CheckoutStep::ConfirmDetails {
                let (rule, add_ons) = self.resolve_shipping(Some(&location), Some(&rebuilt))?;
                self.composition.shipping_rule = rule;
                self.composition.add_ons = add_ons;
            } else {
                self.composition
                    .add_ons
                    .retain(|a| rebuilt.quantity(&a.reward.id) > 0);
            }
            self.selector = Some(rebuilt);
        } else if self.step == CheckoutStep::ConfirmDetails {
            let (rule, _) = self.resolve_shipping(Some(&location), None)?;
            self.composition.shipping_rule = rule;
        }

        debug!(checkout = %self.id, location = %location.id, "location set");
        self.composition.location = Some(location);
        self.touch();
        Ok(())
    }

    /// Set bonus support on top of the reward.
    pub fn set_bonus_support(&mut self, bonus: Money) -> Result<(), PledgeError> {
        self.ensure_step(
            &[
                CheckoutStep::RewardSelect,
                CheckoutStep::AddOnSelect,
                CheckoutStep::ConfirmDetails,
            ],
            "set_bonus_support",
        )?;
        self.composition.set_bonus_support(bonus)?;
        self.touch();
        Ok(())
    }

    /// Change an add-on quantity by `delta` stepper taps.
    pub fn select_add_on(&mut self, id: &RewardId, delta: i32) -> Result<&AddOnSelection, PledgeError> {
        self.ensure_step(&[CheckoutStep::AddOnSelect], "select_add_on")?;
        if self.catalog.find(id).is_none() {
            return Err(PledgeError::RewardNotFound(id.to_string()));
        }
        self.updated_at = Utc::now();
        let selector = self
            .selector
            .as_mut()
            .ok_or_else(|| PledgeError::CheckoutIncomplete("add-on selector".to_string()))?;
        selector.select(id, delta)
    }

    /// Label for the add-on step's continue button.
    pub fn continue_label(&self) -> ContinueLabel {
        self.selector
            .as_ref()
            .map(|s| s.continue_label())
            .unwrap_or(ContinueLabel::Skip)
    }

    fn resolve_shipping(
        &self,
        location: Option<&Location>,
        selector: Option<&AddOnSelector>,
    ) -> Result<(Option<ShippingRule>, Vec<SelectedAddOn>), PledgeError> {
        let rule = match &self.composition.base_reward {
            Some(reward) => shipping::resolve_for_reward(location, reward)?,
            None => None,
        };
        let add_ons = match selector {
            Some(selector) => selector.selected_add_ons(location)?,
            None => Vec::new(),
        };
        Ok((rule, add_ons))
    }

    /// Move to the next step.
    ///
    /// A reward without add-ons on offer skips straight to `ConfirmDetails`.
    /// Entering `ConfirmDetails` requires shipping to resolve; entering
    /// `Payment` requires the total within the pledge limits and produces the
    /// finalized pledge.
    pub fn advance(&mut self) -> Result<CheckoutStep, PledgeError> {
        let next = match self.step {
            CheckoutStep::RewardSelect => {
                if !self.reward_chosen {
                    return Err(PledgeError::CheckoutIncomplete("reward".to_string()));
                }
                self.enter_after_reward()?
            }
            CheckoutStep::AddOnSelect => {
                self.enter_confirm_details()?;
                CheckoutStep::ConfirmDetails
            }
            CheckoutStep::ConfirmDetails => {
                self.finalize()?;
                CheckoutStep::Payment
            }
            CheckoutStep::Payment => {
                return Err(PledgeError::InvalidTransition {
                    from: self.step.as_str().to_string(),
                    to: "none".to_string(),
                })
            }
        };

        self.history.push(self.step);
        debug!(checkout = %self.id, from = self.step.as_str(), to = next.as_str(), "checkout advanced");
        self.step = next;
        self.touch();
        Ok(next)
    }

    fn enter_after_reward(&mut self) -> Result<CheckoutStep, PledgeError> {
        let Some(base) = self.composition.base_reward.clone() else {
            self.enter_confirm_details()?;
            return Ok(CheckoutStep::ConfirmDetails);
        };

        let previous = self
            .selector
            .as_ref()
            .map(|s| s.selection().clone())
            .unwrap_or_default();
        let selector = AddOnSelector::for_reward(
            &self.catalog,
            &base,
            self.composition.location.as_ref(),
            Utc::now(),
        )
        .with_selection(&previous);

        if selector.offered().is_empty() {
            self.selector = None;
            self.enter_confirm_details()?;
            Ok(CheckoutStep::ConfirmDetails)
        } else {
            self.selector = Some(selector);
            Ok(CheckoutStep::AddOnSelect)
        }
    }

    fn enter_confirm_details(&mut self) -> Result<(), PledgeError> {
        let (rule, add_ons) = self.resolve_shipping(
            self.composition.location.as_ref(),
            self.selector.as_ref(),
        )?;
        self.composition.shipping_rule = rule;
        self.composition.add_ons = add_ons;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), PledgeError> {
        let breakdown = self.composition.breakdown()?;
        self.limits
            .check(&breakdown.total, !self.composition.is_no_reward())?;

        let finalized = FinalizedPledge {
            checkout_id: self.id.clone(),
            project_id: self.catalog.project.id.clone(),
            composition: self.composition.clone(),
            total: breakdown.total,
            converted_total: self.converted(&breakdown.total),
            breakdown,
            finalized_at: Utc::now(),
        };
        info!(
            checkout = %self.id,
            project = %finalized.project_id,
            total = %finalized.total,
            add_ons = self.composition.add_on_count(),
            "pledge finalized"
        );
        self.finalized = Some(finalized);
        Ok(())
    }

    /// Return to the previous step, keeping every selection as it was.
    pub fn go_back(&mut self) -> Result<CheckoutStep, PledgeError> {
        let prev = self
            .history
            .pop()
            .ok_or_else(|| PledgeError::InvalidTransition {
                from: self.step.as_str().to_string(),
                to: "none".to_string(),
            })?;

        if self.step == CheckoutStep::Payment {
            self.finalized = None;
        }
        debug!(checkout = %self.id, from = self.step.as_str(), to = prev.as_str(), "checkout went back");
        self.step = prev;
        self.touch();
        Ok(prev)
    }

    /// Composition as it stands right now.
    ///
    /// Before `ConfirmDetails` shipping and add-on lines are recomputed from
    /// the live selection. Shipping that does not resolve yet is left out
    /// here; `advance` enforces it.
    fn current_composition(&self) -> Cow<'_, PledgeComposition> {
        if !matches!(self.step, CheckoutStep::RewardSelect | CheckoutStep::AddOnSelect) {
            return Cow::Borrowed(&self.composition);
        }

        let location = self.composition.location.as_ref();
        let mut composition = self.composition.clone();
        composition.shipping_rule = composition
            .base_reward
            .as_ref()
            .and_then(|reward| preview_rule(location, reward));

        if let (CheckoutStep::AddOnSelect, Some(selector)) = (self.step, &self.selector) {
            composition.add_ons = selector
                .offered()
                .iter()
                .filter_map(|tier| {
                    let quantity = selector.quantity(&tier.id);
                    (quantity > 0).then(|| SelectedAddOn {
                        reward: tier.clone(),
                        quantity,
                        shipping_rule: preview_rule(location, tier),
                    })
                })
                .collect();
        }
        Cow::Owned(composition)
    }

    /// Itemized summary of the current composition.
    pub fn breakdown(&self) -> Result<PledgeBreakdown, PledgeError> {
        self.current_composition().breakdown()
    }

    /// Current total in project currency.
    pub fn total(&self) -> Result<Money, PledgeError> {
        self.current_composition().total()
    }

    /// Display-only total in the backer's currency, if the project has a rate.
    pub fn converted_total(&self) -> Option<Money> {
        let total = self.total().ok()?;
        self.converted(&total)
    }

    fn converted(&self, total: &Money) -> Option<Money> {
        let fx = self.catalog.project.fx.as_ref()?;
        match fx.convert(total) {
            Ok(converted) => Some(converted),
            Err(e) => {
                warn!(error = %e, "converted total unavailable");
                None
            }
        }
    }
}

fn preview_rule(location: Option<&Location>, tier: &RewardTier) -> Option<ShippingRule> {
    if !tier.requires_shipping() {
        return None;
    }
    shipping::resolve(location?, &tier.shipping_rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ProjectInfo, RewardTier, ShippingType};
    use crate::fx::FxSnapshot;
    use crate::money::Currency;

    fn usd(amount: i64) -> Money {
        Money::from_major(amount, Currency::USD)
    }

    fn us() -> Location {
        Location::new("us", "United States")
    }

    fn catalog() -> Arc<RewardCatalog> {
        let project = ProjectInfo {
            id: ProjectId::new("proj-1"),
            name: "Card game".to_string(),
            currency: Currency::USD,
            minimum_pledge: usd(1),
            maximum_pledge: Some(usd(1_000)),
            fx: Some(FxSnapshot::new(Currency::USD, Currency::EUR, 0.9)),
        };
        let rewards = vec![
            RewardTier::new("deck", "Deck", usd(20))
                .with_add_ons(true)
                .with_shipping(
                    ShippingType::MultipleLocations,
                    vec![ShippingRule::new(us(), usd(10))],
                ),
            RewardTier::new("pdf", "Print and play", usd(8)),
            RewardTier::new("gone", "Kickstarter exclusive", usd(99)).with_limit(1, 0),
        ];
        let add_ons = vec![
            RewardTier::add_on("sleeves", "Sleeves", usd(5)).with_limit(50, 2),
            RewardTier::add_on("playmat", "Playmat", usd(25)).with_shipping(
                ShippingType::SingleLocation,
                vec![ShippingRule::new(us(), usd(4))],
            ),
        ];
        Arc::new(RewardCatalog::new(project, rewards, add_ons).unwrap())
    }

    fn limits(catalog: &RewardCatalog) -> PledgeLimits {
        PledgeLimits::for_project(&catalog.project, &Default::default())
    }

    fn flow() -> PledgeFlow {
        let catalog = catalog();
        let limits = limits(&catalog);
        PledgeFlow::new(catalog, limits)
    }

    #[test]
    fn test_cannot_advance_without_reward_choice() {
        let mut f = flow();
        assert!(matches!(
            f.advance(),
            Err(PledgeError::CheckoutIncomplete(_))
        ));
        assert_eq!(f.step(), CheckoutStep::RewardSelect);
    }

    #[test]
    fn test_reward_without_add_ons_skips_add_on_step() {
        let mut f = flow();
        f.select_reward(&RewardId::new("pdf")).unwrap();
        assert_eq!(f.advance().unwrap(), CheckoutStep::ConfirmDetails);
        assert_eq!(f.total().unwrap(), usd(8));
    }

    #[test]
    fn test_sold_out_reward_rejected() {
        let mut f = flow();
        assert!(matches!(
            f.select_reward(&RewardId::new("gone")),
            Err(PledgeError::RewardUnavailable(_))
        ));
        assert!(matches!(
            f.select_reward(&RewardId::new("sleeves")),
            Err(PledgeError::RewardNotFound(_))
        ));
    }

    #[test]
    fn test_full_flow() {
        let mut f = flow();
        f.set_location(us()).unwrap();
        f.select_reward(&RewardId::new("deck")).unwrap();
        assert_eq!(f.advance().unwrap(), CheckoutStep::AddOnSelect);
        assert_eq!(f.continue_label(), ContinueLabel::Skip);

        f.select_add_on(&RewardId::new("sleeves"), 2).unwrap();
        f.select_add_on(&RewardId::new("playmat"), 1).unwrap();
        assert_eq!(f.continue_label(), ContinueLabel::Plural(3));

        assert_eq!(f.advance().unwrap(), CheckoutStep::ConfirmDetails);
        // deck 20 + ship 10 + sleeves 10 + playmat 25 + playmat shipping 4
        assert_eq!(f.total().unwrap(), usd(69));

        f.set_bonus_support(usd(1)).unwrap();
        assert_eq!(f.advance().unwrap(), CheckoutStep::Payment);

        let pledge = f.finalized().unwrap();
        assert_eq!(pledge.total, usd(70));
        assert_eq!(pledge.converted_total, Some(Money::new(6300, Currency::EUR)));
        assert!(f.is_complete());
        assert!(f.advance().is_err());
    }

    #[test]
    fn test_running_total_follows_selection() {
        let mut f = flow();
        f.set_location(us()).unwrap();
        f.select_reward(&RewardId::new("deck")).unwrap();
        assert_eq!(f.total().unwrap(), usd(30));

        f.advance().unwrap();
        assert_eq!(f.total().unwrap(), usd(30));
        f.select_add_on(&RewardId::new("sleeves"), 2).unwrap();
        assert_eq!(f.total().unwrap(), usd(40));
        f.select_add_on(&RewardId::new("playmat"), 1).unwrap();
        assert_eq!(f.breakdown().unwrap().shipping_total, usd(14));
        f.select_add_on(&RewardId::new("sleeves"), -2).unwrap();
        assert_eq!(f.total().unwrap(), usd(59));
    }

    #[test]
    fn test_local_pickup_flow() {
        let nyc = Location::new("nyc", "New York studio");
        let project = catalog().project.clone();
        let catalog = Arc::new(
            RewardCatalog::new(
                project,
                vec![RewardTier::new("pickup", "Studio pickup", usd(20))
                    .with_add_ons(true)
                    .with_local_pickup(nyc.clone())],
                vec![
                    RewardTier::add_on("playmat", "Playmat", usd(25)).with_shipping(
                        ShippingType::SingleLocation,
                        vec![ShippingRule::new(us(), usd(4))],
                    ),
                    RewardTier::add_on("tote", "Tote bag", usd(8)).with_local_pickup(nyc),
                ],
            )
            .unwrap(),
        );
        let limits = limits(&catalog);
        let mut f = PledgeFlow::new(catalog, limits);

        f.select_reward(&RewardId::new("pickup")).unwrap();
        assert_eq!(f.advance().unwrap(), CheckoutStep::AddOnSelect);
        assert!(matches!(
            f.select_add_on(&RewardId::new("playmat"), 1),
            Err(PledgeError::AddOnNotCompatible(_))
        ));
        f.select_add_on(&RewardId::new("tote"), 1).unwrap();
        assert_eq!(f.advance().unwrap(), CheckoutStep::ConfirmDetails);
        assert_eq!(f.total().unwrap(), usd(28));
        assert!(!f.composition().requires_shipping());
    }

    #[test]
    fn test_shipping_unavailable_blocks_confirm() {
        let mut f = flow();
        f.set_location(Location::new("jp", "Japan")).unwrap();
        f.select_reward(&RewardId::new("deck")).unwrap();
        f.advance().unwrap();

        let err = f.advance().unwrap_err();
        assert!(matches!(err, PledgeError::ShippingUnavailable { .. }));
        assert_eq!(f.step(), CheckoutStep::AddOnSelect);
    }

    #[test]
    fn test_back_navigation_keeps_selection() {
        let mut f = flow();
        f.set_location(us()).unwrap();
        f.select_reward(&RewardId::new("deck")).unwrap();
        f.advance().unwrap();
        f.select_add_on(&RewardId::new("sleeves"), 2).unwrap();
        f.advance().unwrap();
        let total = f.total().unwrap();

        assert_eq!(f.go_back().unwrap(), CheckoutStep::AddOnSelect);
        assert_eq!(f.total().unwrap(), total);
        assert_eq!(f.go_back().unwrap(), CheckoutStep::RewardSelect);
        assert_eq!(f.total().unwrap(), total);

        f.select_reward(&RewardId::new("deck")).unwrap();
        f.advance().unwrap();
        assert_eq!(f.selector().unwrap().quantity(&RewardId::new("sleeves")), 2);
        f.advance().unwrap();
        assert_eq!(f.total().unwrap(), total);
        assert!(f.go_back().is_ok());
        assert!(f.go_back().is_ok());
        assert!(f.go_back().is_err());
    }

    #[test]
    fn test_changing_reward_clears_add_ons() {
        let mut f = flow();
        f.set_location(us()).unwrap();
        f.select_reward(&RewardId::new("deck")).unwrap();
        f.advance().unwrap();
        f.select_add_on(&RewardId::new("sleeves"), 1).unwrap();
        f.go_back().unwrap();

        f.select_reward(&RewardId::new("pdf")).unwrap();
        assert!(f.selector().is_none());
        assert_eq!(f.advance().unwrap(), CheckoutStep::ConfirmDetails);
        assert!(f.composition().add_ons.is_empty());
    }

    #[test]
    fn test_no_reward_minimum() {
        let mut f = flow();
        f.pledge_without_reward().unwrap();
        f.advance().unwrap();
        assert!(matches!(
            f.advance(),
            Err(PledgeError::BelowMinimum { .. })
        ));

        f.set_bonus_support(usd(15)).unwrap();
        f.advance().unwrap();
        assert_eq!(f.finalized().unwrap().total, usd(15));
    }

    #[test]
    fn test_go_back_from_payment_discards_snapshot() {
        let mut f = flow();
        f.select_reward(&RewardId::new("pdf")).unwrap();
        f.advance().unwrap();
        f.advance().unwrap();
        assert!(f.finalized().is_some());
        f.go_back().unwrap();
        assert!(f.finalized().is_none());
    }

    #[test]
    fn test_step_guards() {
        let mut f = flow();
        assert!(matches!(
            f.select_add_on(&RewardId::new("sleeves"), 1),
            Err(PledgeError::InvalidTransition { .. })
        ));
        f.select_reward(&RewardId::new("pdf")).unwrap();
        f.advance().unwrap();
        assert!(f.select_reward(&RewardId::new("deck")).is_err());
    }

    #[test]
    fn test_unknown_and_incompatible_add_ons() {
        let mut f = flow();
        f.set_location(us()).unwrap();
        f.select_reward(&RewardId::new("deck")).unwrap();
        f.advance().unwrap();
        assert!(matches!(
            f.select_add_on(&RewardId::new("missing"), 1),
            Err(PledgeError::RewardNotFound(_))
        ));
        assert!(matches!(
            f.select_add_on(&RewardId::new("pdf"), 1),
            Err(PledgeError::AddOnNotCompatible(_))
        ));
    }
}
