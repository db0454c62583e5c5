// 🔄 Reset Coordinator - Calendar-boundary counter resets
//
// Zeroes spend counters on schedule, then re-admits campaigns by re-running
// the full activation decision. Reactivation is never automatic: after a
// daily reset the untouched monthly counter can still hold a brand's
// campaigns inactive, and a dayparting window can too.
//
// Both resets are safe to re-run: zeroing an already-zero counter and
// re-deriving an unchanged decision are no-ops.

use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use tracing::{debug, warn};

use crate::activation::{ActivationEngine, SweepSummary};
use crate::error::Result;
use crate::ledger::BudgetLedger;
use crate::store::BudgetStore;

pub struct ResetCoordinator {
    store: Arc<dyn BudgetStore>,
    ledger: Arc<BudgetLedger>,
    engine: Arc<ActivationEngine>,
}

impl ResetCoordinator {
    pub fn new(
        store: Arc<dyn BudgetStore>,
        ledger: Arc<BudgetLedger>,
        engine: Arc<ActivationEngine>,
    ) -> Self {
        ResetCoordinator {
            store,
            ledger,
            engine,
        }
    }

    /// Daily reset: zero every brand's daily counter, then re-evaluate its
    /// campaigns. The decision re-reads the monthly counter, so a brand
    /// over its monthly ceiling stays dark.
    pub fn run_daily_reset(&self, now: NaiveTime) -> Result<SweepSummary> {
        self.run_reset(now, ResetScope::Daily)
    }

    /// Monthly reset: zero both counters for every brand, then re-evaluate.
    /// A new month starts a new day too.
    pub fn run_monthly_reset(&self, now: NaiveTime) -> Result<SweepSummary> {
        self.run_reset(now, ResetScope::Monthly)
    }

    fn run_reset(&self, now: NaiveTime, scope: ResetScope) -> Result<SweepSummary> {
        let brands = self.store.get_all_brands()?;
        let mut total = SweepSummary::default();

        for brand in brands {
            // One failed brand never aborts the rest of the pass
            let outcome = self.reset_brand(&brand.id, now, scope);
            match outcome {
                Ok(summary) => {
                    total.evaluated += summary.evaluated;
                    total.activated += summary.activated;
                    total.deactivated += summary.deactivated;
                    total.failures += summary.failures;
                }
                Err(e) => {
                    total.failures += 1;
                    warn!(brand = %brand.name, error = %e, "brand reset failed");
                }
            }
        }

        debug!(
            scope = scope.as_str(),
            evaluated = total.evaluated,
            activated = total.activated,
            deactivated = total.deactivated,
            failures = total.failures,
            "reset pass complete"
        );

        Ok(total)
    }

    fn reset_brand(&self, brand_id: &str, now: NaiveTime, scope: ResetScope) -> Result<SweepSummary> {
        match scope {
            ResetScope::Daily => self.ledger.reset_daily(brand_id)?,
            ResetScope::Monthly => self.ledger.reset_monthly(brand_id)?,
        };
        self.engine.evaluate_brand(brand_id, now)
    }
}

#[derive(Debug, Clone, Copy)]
enum ResetScope {
    Daily,
    Monthly,
}

impl ResetScope {
    fn as_str(&self) -> &'static str {
        match self {
            ResetScope::Daily => "daily",
            ResetScope::Monthly => "monthly",
        }
    }
}

/// Current UTC time-of-day, the `now` the tick entry points pass down.
pub fn current_time_of_day() -> NaiveTime {
    Utc::now().time()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Brand, Campaign};
    use crate::ledger::BrandLocks;
    use crate::store::MemoryStore;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        coordinator: ResetCoordinator,
        brand: Brand,
        campaign: Campaign,
    }

    fn fixture() -> Fixture {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let brand = Brand::new("FashionCo", 500.0, 10_000.0).unwrap();
        store.insert_brand(&brand).unwrap();

        let campaign = Campaign::new("Summer Sale", &brand.id).unwrap();
        store.insert_campaign(&campaign).unwrap();

        let locks = Arc::new(BrandLocks::new());
        let dyn_store: Arc<dyn BudgetStore> = store.clone();
        let ledger = Arc::new(BudgetLedger::new(dyn_store.clone(), locks.clone()));
        let engine = Arc::new(ActivationEngine::new(dyn_store.clone(), locks));
        let coordinator = ResetCoordinator::new(dyn_store, ledger, engine);

        Fixture {
            store,
            coordinator,
            brand,
            campaign,
        }
    }

    fn force_spend(fx: &Fixture, daily: f64, monthly: f64) {
        let mut brand = fx.store.get_brand(&fx.brand.id).unwrap();
        brand.daily_spend = daily;
        brand.monthly_spend = monthly;
        fx.store.save_brand(&brand).unwrap();
    }

    fn force_inactive(fx: &Fixture) {
        let mut campaign = fx.store.get_campaign(&fx.campaign.id).unwrap();
        campaign.is_active = false;
        fx.store.save_campaign(&campaign).unwrap();
    }

    #[test]
    fn test_daily_reset_reactivates_when_monthly_ok() {
        let fx = fixture();
        force_spend(&fx, 500.0, 4_000.0); // daily exceeded, monthly fine
        force_inactive(&fx);

        let summary = fx.coordinator.run_daily_reset(hm(0, 0)).unwrap();
        assert_eq!(summary.activated, 1);

        let brand = fx.store.get_brand(&fx.brand.id).unwrap();
        assert_eq!(brand.daily_spend, 0.0);
        assert_eq!(brand.monthly_spend, 4_000.0);
        assert!(fx.store.get_campaign(&fx.campaign.id).unwrap().is_active);
    }

    #[test]
    fn test_daily_reset_gated_by_monthly_budget() {
        let fx = fixture();
        force_spend(&fx, 500.0, 10_000.0); // both exceeded
        force_inactive(&fx);

        let summary = fx.coordinator.run_daily_reset(hm(0, 0)).unwrap();
        assert_eq!(summary.activated, 0);

        // Daily counter cleared, but the monthly ceiling still blocks
        let brand = fx.store.get_brand(&fx.brand.id).unwrap();
        assert_eq!(brand.daily_spend, 0.0);
        assert_eq!(brand.monthly_spend, 10_000.0);
        assert!(!fx.store.get_campaign(&fx.campaign.id).unwrap().is_active);
    }

    #[test]
    fn test_monthly_reset_reactivates() {
        let fx = fixture();
        force_spend(&fx, 500.0, 10_000.0);
        force_inactive(&fx);

        let summary = fx.coordinator.run_monthly_reset(hm(0, 0)).unwrap();
        assert_eq!(summary.activated, 1);

        let brand = fx.store.get_brand(&fx.brand.id).unwrap();
        assert_eq!(brand.daily_spend, 0.0);
        assert_eq!(brand.monthly_spend, 0.0);
        assert!(fx.store.get_campaign(&fx.campaign.id).unwrap().is_active);
    }

    #[test]
    fn test_reset_respects_dayparting() {
        let fx = fixture();

        let parted =
            Campaign::with_dayparting("Lunch Rush", &fx.brand.id, hm(11, 0), hm(14, 0)).unwrap();
        fx.store.insert_campaign(&parted).unwrap();

        force_spend(&fx, 500.0, 0.0);
        force_inactive(&fx);

        // Midnight reset: the plain campaign comes back, the dayparted one
        // stays outside its window
        fx.coordinator.run_daily_reset(hm(0, 0)).unwrap();

        assert!(fx.store.get_campaign(&fx.campaign.id).unwrap().is_active);
        assert!(!fx.store.get_campaign(&parted.id).unwrap().is_active);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let fx = fixture();
        force_spend(&fx, 300.0, 300.0);

        fx.coordinator.run_daily_reset(hm(0, 0)).unwrap();
        let brand_after_first = fx.store.get_brand(&fx.brand.id).unwrap();
        let active_after_first = fx.store.get_campaign(&fx.campaign.id).unwrap().is_active;

        let summary = fx.coordinator.run_daily_reset(hm(0, 0)).unwrap();
        let brand_after_second = fx.store.get_brand(&fx.brand.id).unwrap();
        let active_after_second = fx.store.get_campaign(&fx.campaign.id).unwrap().is_active;

        assert_eq!(brand_after_first.daily_spend, brand_after_second.daily_spend);
        assert_eq!(active_after_first, active_after_second);
        assert_eq!(summary.changed(), 0); // second run flips nothing
    }
}
