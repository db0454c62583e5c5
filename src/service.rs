// 🎛️ Control Service - Tick entry points for the scheduler shell
//
// One method per cadence, all routed through the same components:
//
//   on_daily_tick / on_monthly_tick  -> ResetCoordinator
//   on_budget_sweep_tick             -> deactivation pass over exceeded brands
//   on_daypart_sweep_tick            -> window pass over dayparting campaigns
//   on_spend_event                   -> ledger + budget-triggered evaluation
//
// Ticks are delivered at-least-once by the shell; every entry point
// re-derives state from scratch, so a duplicate or late tick lands on the
// same answer.

use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{debug, warn};

use crate::activation::{ActivationEngine, SweepSummary};
use crate::error::{ControlError, Result};
use crate::ledger::{BrandLocks, BudgetLedger, SpendTotals};
use crate::reset::{current_time_of_day, ResetCoordinator};
use crate::store::BudgetStore;

pub struct ControlService {
    store: Arc<dyn BudgetStore>,
    ledger: Arc<BudgetLedger>,
    engine: Arc<ActivationEngine>,
    resets: ResetCoordinator,
}

impl ControlService {
    /// Wire the full engine stack over one store. All components share the
    /// same per-brand lock table.
    pub fn new(store: Arc<dyn BudgetStore>) -> Self {
        let locks = Arc::new(BrandLocks::new());
        let ledger = Arc::new(BudgetLedger::new(store.clone(), locks.clone()));
        let engine = Arc::new(ActivationEngine::new(store.clone(), locks));
        let resets = ResetCoordinator::new(store.clone(), ledger.clone(), engine.clone());

        ControlService {
            store,
            ledger,
            engine,
            resets,
        }
    }

    pub fn store(&self) -> Arc<dyn BudgetStore> {
        self.store.clone()
    }

    // ========================================================================
    // SCHEDULED TICKS
    // ========================================================================

    /// Midnight: zero daily counters, re-admit what the monthly ceiling and
    /// dayparting windows allow.
    pub fn on_daily_tick(&self) -> Result<SweepSummary> {
        self.on_daily_tick_at(current_time_of_day())
    }

    pub fn on_daily_tick_at(&self, now: NaiveTime) -> Result<SweepSummary> {
        self.resets.run_daily_reset(now)
    }

    /// First of the month, midnight: zero both counters, re-admit
    /// everything dayparting allows.
    pub fn on_monthly_tick(&self) -> Result<SweepSummary> {
        self.on_monthly_tick_at(current_time_of_day())
    }

    pub fn on_monthly_tick_at(&self, now: NaiveTime) -> Result<SweepSummary> {
        self.resets.run_monthly_reset(now)
    }

    /// Every few minutes: spend can pass a ceiling at any time, so catch
    /// brands that slipped over and shut their campaigns down.
    pub fn on_budget_sweep_tick(&self) -> Result<SweepSummary> {
        self.on_budget_sweep_tick_at(current_time_of_day())
    }

    pub fn on_budget_sweep_tick_at(&self, now: NaiveTime) -> Result<SweepSummary> {
        let brands = self.store.get_all_brands()?;
        let mut total = SweepSummary::default();

        for brand in brands {
            if !brand.is_budget_exceeded() {
                continue;
            }
            match self.engine.evaluate_brand(&brand.id, now) {
                Ok(summary) => {
                    total.evaluated += summary.evaluated;
                    total.activated += summary.activated;
                    total.deactivated += summary.deactivated;
                    total.failures += summary.failures;
                }
                Err(e) => {
                    total.failures += 1;
                    warn!(brand = %brand.name, error = %e, "budget sweep failed for brand");
                }
            }
        }

        debug!(
            deactivated = total.deactivated,
            failures = total.failures,
            "budget sweep complete"
        );
        Ok(total)
    }

    /// Every ~15 minutes: re-derive activation for dayparting campaigns as
    /// their windows open and close. Budget-blocked campaigns stay dark; the
    /// full decision runs, not just the window check.
    pub fn on_daypart_sweep_tick(&self) -> Result<SweepSummary> {
        self.on_daypart_sweep_tick_at(current_time_of_day())
    }

    pub fn on_daypart_sweep_tick_at(&self, now: NaiveTime) -> Result<SweepSummary> {
        let campaigns = self.store.get_campaigns_using_dayparting()?;
        let mut total = SweepSummary::default();

        for campaign in campaigns {
            total.evaluated += 1;
            let was_active = campaign.is_active;
            match self.engine.evaluate_campaign(&campaign.id, now) {
                Ok(is_active) => {
                    if is_active != was_active {
                        if is_active {
                            total.activated += 1;
                        } else {
                            total.deactivated += 1;
                        }
                    }
                }
                Err(e) => {
                    total.failures += 1;
                    warn!(campaign = %campaign.name, error = %e, "daypart sweep failed for campaign");
                }
            }
        }

        debug!(
            evaluated = total.evaluated,
            changed = total.changed(),
            failures = total.failures,
            "daypart sweep complete"
        );
        Ok(total)
    }

    // ========================================================================
    // SPEND EVENTS
    // ========================================================================

    /// Ad-serving activity reported spend against a campaign. The campaign
    /// must currently be active; then the brand's counters move and every
    /// campaign of the brand is re-evaluated against the new totals.
    pub fn on_spend_event(&self, campaign_id: &str, amount: f64) -> Result<SpendTotals> {
        self.on_spend_event_at(campaign_id, amount, current_time_of_day())
    }

    pub fn on_spend_event_at(
        &self,
        campaign_id: &str,
        amount: f64,
        now: NaiveTime,
    ) -> Result<SpendTotals> {
        let campaign = self.store.get_campaign(campaign_id)?;
        if !campaign.is_active {
            return Err(ControlError::CampaignNotActive(campaign_id.to_string()));
        }

        let totals = self.ledger.record_spend(&campaign.brand_id, amount)?;
        self.engine.evaluate_brand(&campaign.brand_id, now)?;

        Ok(totals)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Brand, Campaign};
    use crate::store::MemoryStore;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn service_fixture() -> (ControlService, Arc<MemoryStore>, Brand, Campaign) {
        let store = Arc::new(MemoryStore::new());
        let brand = Brand::new("FashionCo", 500.0, 10_000.0).unwrap();
        store.insert_brand(&brand).unwrap();

        let campaign = Campaign::new("Summer Sale", &brand.id).unwrap();
        store.insert_campaign(&campaign).unwrap();

        let service = ControlService::new(store.clone() as Arc<dyn BudgetStore>);
        (service, store, brand, campaign)
    }

    #[test]
    fn test_spend_event_rejected_for_inactive_campaign() {
        let (service, store, _brand, campaign) = service_fixture();

        let mut inactive = store.get_campaign(&campaign.id).unwrap();
        inactive.is_active = false;
        store.save_campaign(&inactive).unwrap();

        let result = service.on_spend_event_at(&campaign.id, 50.0, hm(12, 0));
        assert!(matches!(result, Err(ControlError::CampaignNotActive(_))));

        // Nothing was recorded
        let brand = store.get_brand(&campaign.brand_id).unwrap();
        assert_eq!(brand.daily_spend, 0.0);
    }

    #[test]
    fn test_spend_event_rejected_for_unknown_campaign() {
        let (service, _store, _brand, _campaign) = service_fixture();

        assert!(matches!(
            service.on_spend_event_at("missing", 50.0, hm(12, 0)),
            Err(ControlError::CampaignNotFound(_))
        ));
    }

    #[test]
    fn test_budget_sweep_deactivates_exceeded_brand_only() {
        let (service, store, brand, campaign) = service_fixture();

        let other_brand = Brand::new("TechGadgets", 800.0, 20_000.0).unwrap();
        store.insert_brand(&other_brand).unwrap();
        let other_campaign = Campaign::new("Gadget Launch", &other_brand.id).unwrap();
        store.insert_campaign(&other_campaign).unwrap();

        // Push the first brand over its daily ceiling behind the engine's back
        let mut exceeded = store.get_brand(&brand.id).unwrap();
        exceeded.daily_spend = 550.0;
        store.save_brand(&exceeded).unwrap();

        let summary = service.on_budget_sweep_tick_at(hm(12, 0)).unwrap();
        assert_eq!(summary.deactivated, 1);

        assert!(!store.get_campaign(&campaign.id).unwrap().is_active);
        assert!(store.get_campaign(&other_campaign.id).unwrap().is_active);
    }

    #[test]
    fn test_daypart_sweep_tracks_window() {
        let (service, store, brand, _campaign) = service_fixture();

        let parted =
            Campaign::with_dayparting("Lunch Rush", &brand.id, hm(11, 0), hm(14, 0)).unwrap();
        store.insert_campaign(&parted).unwrap();

        // Outside the window: off
        service.on_daypart_sweep_tick_at(hm(9, 0)).unwrap();
        assert!(!store.get_campaign(&parted.id).unwrap().is_active);

        // Inside the window: back on
        service.on_daypart_sweep_tick_at(hm(12, 0)).unwrap();
        assert!(store.get_campaign(&parted.id).unwrap().is_active);

        // Inclusive end boundary
        service.on_daypart_sweep_tick_at(hm(14, 0)).unwrap();
        assert!(store.get_campaign(&parted.id).unwrap().is_active);

        service.on_daypart_sweep_tick_at(hm(14, 1)).unwrap();
        assert!(!store.get_campaign(&parted.id).unwrap().is_active);
    }

    #[test]
    fn test_daypart_sweep_never_overrides_budget_block() {
        let (service, store, brand, _campaign) = service_fixture();

        let parted =
            Campaign::with_dayparting("Lunch Rush", &brand.id, hm(11, 0), hm(14, 0)).unwrap();
        store.insert_campaign(&parted).unwrap();

        let mut exceeded = store.get_brand(&brand.id).unwrap();
        exceeded.monthly_spend = 10_000.0;
        store.save_brand(&exceeded).unwrap();

        // Inside the window, but the monthly ceiling is hit: stays off
        service.on_daypart_sweep_tick_at(hm(12, 0)).unwrap();
        assert!(!store.get_campaign(&parted.id).unwrap().is_active);
    }

    #[test]
    fn test_sweeps_are_idempotent() {
        let (service, store, brand, _campaign) = service_fixture();

        let parted =
            Campaign::with_dayparting("Lunch Rush", &brand.id, hm(11, 0), hm(14, 0)).unwrap();
        store.insert_campaign(&parted).unwrap();

        let first = service.on_daypart_sweep_tick_at(hm(9, 0)).unwrap();
        assert_eq!(first.deactivated, 1);

        // Re-running with unchanged inputs flips nothing
        let second = service.on_daypart_sweep_tick_at(hm(9, 0)).unwrap();
        assert_eq!(second.changed(), 0);

        let third = service.on_budget_sweep_tick_at(hm(9, 0)).unwrap();
        assert_eq!(third.changed(), 0);
    }

    #[test]
    fn test_end_to_end_spend_until_exceeded_then_reset() {
        let (service, store, brand, campaign) = service_fixture();
        let noon = hm(12, 0);

        // 200 spent: well under the 500 daily ceiling
        let totals = service.on_spend_event_at(&campaign.id, 200.0, noon).unwrap();
        assert!(!totals.any_exceeded());
        assert!(store.get_campaign(&campaign.id).unwrap().is_active);

        // 450 total: still under
        let totals = service.on_spend_event_at(&campaign.id, 250.0, noon).unwrap();
        assert!(!totals.any_exceeded());
        assert!(store.get_campaign(&campaign.id).unwrap().is_active);

        // 550 total: 550 >= 500, campaign goes dark
        let totals = service.on_spend_event_at(&campaign.id, 100.0, noon).unwrap();
        assert!(totals.daily_exceeded);
        assert!(!store.get_campaign(&campaign.id).unwrap().is_active);

        // Further spend against the dark campaign is rejected
        assert!(matches!(
            service.on_spend_event_at(&campaign.id, 10.0, noon),
            Err(ControlError::CampaignNotActive(_))
        ));

        // Midnight: daily counter clears, monthly is fine, campaign returns
        let summary = service.on_daily_tick_at(hm(0, 0)).unwrap();
        assert_eq!(summary.activated, 1);

        let reloaded = store.get_brand(&brand.id).unwrap();
        assert_eq!(reloaded.daily_spend, 0.0);
        assert_eq!(reloaded.monthly_spend, 550.0);
        assert!(store.get_campaign(&campaign.id).unwrap().is_active);
    }

    #[test]
    fn test_monthly_tick_clears_monthly_block() {
        let (service, store, brand, campaign) = service_fixture();

        let mut exceeded = store.get_brand(&brand.id).unwrap();
        exceeded.daily_spend = 500.0;
        exceeded.monthly_spend = 10_000.0;
        store.save_brand(&exceeded).unwrap();
        service.on_budget_sweep_tick_at(hm(12, 0)).unwrap();
        assert!(!store.get_campaign(&campaign.id).unwrap().is_active);

        // Daily tick alone cannot help: monthly ceiling still hit
        service.on_daily_tick_at(hm(0, 0)).unwrap();
        assert!(!store.get_campaign(&campaign.id).unwrap().is_active);

        // Month boundary clears both counters
        service.on_monthly_tick_at(hm(0, 0)).unwrap();
        let reloaded = store.get_brand(&brand.id).unwrap();
        assert_eq!(reloaded.daily_spend, 0.0);
        assert_eq!(reloaded.monthly_spend, 0.0);
        assert!(store.get_campaign(&campaign.id).unwrap().is_active);
    }
}
