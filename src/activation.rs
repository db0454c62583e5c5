// ⚡ Activation Engine - Sole writer of the campaign active flag
//
// One pure decision, two invocation shapes (budget-triggered and
// clock-triggered), zero duplicated precedence logic. The desired state is
// always re-derived from fresh brand and campaign snapshots:
//
//   1. either budget ceiling reached  -> inactive (overrides dayparting)
//   2. else dayparting enabled        -> window containment result
//   3. else                           -> active
//
// Re-deriving from scratch (no deltas, no history) keeps every evaluation
// idempotent under repeated or out-of-order ticks.

use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{info, warn};

use crate::daypart;
use crate::entities::{Brand, Campaign};
use crate::error::Result;
use crate::ledger::BrandLocks;
use crate::store::{AuditEvent, BudgetStore};

// ============================================================================
// DECISION FUNCTION
// ============================================================================

/// Desired active state for a campaign, as a pure function of the brand
/// snapshot, the campaign snapshot, and the current time-of-day.
///
/// Budget exhaustion always wins over dayparting. The hour fields are only
/// read when `use_dayparting` is set.
pub fn desired_state(brand: &Brand, campaign: &Campaign, now: NaiveTime) -> bool {
    decide(brand, campaign, now).0
}

fn decide(brand: &Brand, campaign: &Campaign, now: NaiveTime) -> (bool, &'static str) {
    if brand.is_daily_exceeded() || brand.is_monthly_exceeded() {
        return (false, "budget_exceeded");
    }

    if let Some((start, end)) = campaign.daypart_window() {
        if daypart::contains(start, end, now) {
            (true, "within_daypart_window")
        } else {
            (false, "outside_daypart_window")
        }
    } else {
        (true, "no_restrictions")
    }
}

// ============================================================================
// SWEEP SUMMARY
// ============================================================================

/// Outcome counters for a pass over one or more campaigns.
#[derive(Debug, Default, Clone)]
pub struct SweepSummary {
    pub evaluated: usize,
    pub activated: usize,
    pub deactivated: usize,
    pub failures: usize,
}

impl SweepSummary {
    pub fn changed(&self) -> usize {
        self.activated + self.deactivated
    }

    fn absorb(&mut self, changed: bool, desired: bool) {
        self.evaluated += 1;
        if changed {
            if desired {
                self.activated += 1;
            } else {
                self.deactivated += 1;
            }
        }
    }
}

// ============================================================================
// ACTIVATION ENGINE
// ============================================================================

pub struct ActivationEngine {
    store: Arc<dyn BudgetStore>,
    locks: Arc<BrandLocks>,
}

impl ActivationEngine {
    pub fn new(store: Arc<dyn BudgetStore>, locks: Arc<BrandLocks>) -> Self {
        ActivationEngine { store, locks }
    }

    /// Re-derive and apply the active flag for a single campaign.
    ///
    /// Snapshots are read under the brand's lock so no concurrent spend or
    /// reset can race the decision. Returns the desired (now stored) state.
    pub fn evaluate_campaign(&self, campaign_id: &str, now: NaiveTime) -> Result<bool> {
        let campaign = self.store.get_campaign(campaign_id)?;

        let lock = self.locks.for_brand(&campaign.brand_id);
        let _guard = lock.lock().unwrap();

        // Fresh snapshots under the lock; the pre-lock read only located
        // the owning brand.
        let brand = self.store.get_brand(&campaign.brand_id)?;
        let campaign = self.store.get_campaign(campaign_id)?;

        let (desired, _changed) = self.apply_decision(&brand, campaign, now)?;
        Ok(desired)
    }

    /// Re-derive and apply the active flag for every campaign of a brand.
    ///
    /// A failure on one campaign is logged and the pass continues; the
    /// caller sees the failure count in the summary.
    pub fn evaluate_brand(&self, brand_id: &str, now: NaiveTime) -> Result<SweepSummary> {
        let lock = self.locks.for_brand(brand_id);
        let _guard = lock.lock().unwrap();

        let brand = self.store.get_brand(brand_id)?;
        let campaigns = self.store.get_campaigns_by_brand(brand_id)?;

        let mut summary = SweepSummary::default();
        for campaign in campaigns {
            let campaign_id = campaign.id.clone();
            match self.apply_decision(&brand, campaign, now) {
                Ok((desired, changed)) => summary.absorb(changed, desired),
                Err(e) => {
                    summary.failures += 1;
                    warn!(campaign = %campaign_id, error = %e, "campaign evaluation failed");
                }
            }
        }

        Ok(summary)
    }

    /// Decide and write, but only when the stored flag differs. Appends an
    /// audit event on every flip.
    fn apply_decision(
        &self,
        brand: &Brand,
        mut campaign: Campaign,
        now: NaiveTime,
    ) -> Result<(bool, bool)> {
        let (desired, reason) = decide(brand, &campaign, now);

        if campaign.is_active == desired {
            return Ok((desired, false));
        }

        campaign.is_active = desired;
        self.store.save_campaign(&campaign)?;

        info!(
            campaign = %campaign.name,
            brand = %brand.name,
            active = desired,
            reason,
            "campaign activation changed"
        );

        let event = AuditEvent::new(
            if desired {
                "campaign_activated"
            } else {
                "campaign_deactivated"
            },
            "campaign",
            &campaign.id,
            serde_json::json!({ "brand_id": brand.id, "reason": reason }),
            "activation_engine",
        );
        if let Err(e) = self.store.append_event(&event) {
            warn!(campaign = %campaign.id, error = %e, "failed to append audit event");
        }

        Ok((desired, true))
    }
}

// ============================================================================
// TESTS
// ============================================================================
