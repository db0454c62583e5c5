// 💰 Budget Ledger - Spend accumulation and counter resets
//
// Accounting only: the ledger moves the two counters and reports whether a
// ceiling was reached. It never toggles campaigns; activation policy lives
// in the activation engine.
//
// Spend accumulation and resets are both read-modify-write on the same two
// counters, so they are serialized per brand through BrandLocks. Different
// brands proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::entities::Brand;
use crate::error::{ControlError, Result};
use crate::store::{AuditEvent, BudgetStore};

// ============================================================================
// PER-BRAND LOCKS
// ============================================================================

/// One mutual-exclusion scope per brand id, created lazily.
///
/// Holding a brand's lock covers its two spend counters and the activation
/// evaluation of its campaigns (a campaign belongs to exactly one brand, so
/// this also serializes repeated evaluations of the same campaign).
#[derive(Default)]
pub struct BrandLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BrandLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for the given brand's lock. Callers lock the returned mutex
    /// for the duration of their read-modify-write.
    pub fn for_brand(&self, brand_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(brand_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

// ============================================================================
// SPEND TOTALS
// ============================================================================

/// Updated counters returned from a spend recording, with the exceeded
/// status the activation engine needs.
#[derive(Debug, Clone)]
pub struct SpendTotals {
    pub brand_id: String,
    pub daily_spend: f64,
    pub monthly_spend: f64,
    pub daily_exceeded: bool,
    pub monthly_exceeded: bool,
}

impl SpendTotals {
    pub fn any_exceeded(&self) -> bool {
        self.daily_exceeded || self.monthly_exceeded
    }

    fn from_brand(brand: &Brand) -> Self {
        SpendTotals {
            brand_id: brand.id.clone(),
            daily_spend: brand.daily_spend,
            monthly_spend: brand.monthly_spend,
            daily_exceeded: brand.is_daily_exceeded(),
            monthly_exceeded: brand.is_monthly_exceeded(),
        }
    }
}

// ============================================================================
// BUDGET LEDGER
// ============================================================================

pub struct BudgetLedger {
    store: Arc<dyn BudgetStore>,
    locks: Arc<BrandLocks>,
}

impl BudgetLedger {
    pub fn new(store: Arc<dyn BudgetStore>, locks: Arc<BrandLocks>) -> Self {
        BudgetLedger { store, locks }
    }

    /// Add `amount` to both spend counters in one read-modify-write under
    /// the brand's lock. Rejects negative or non-finite amounts before any
    /// write. Returns the updated totals; toggling campaigns is the
    /// activation engine's job.
    pub fn record_spend(&self, brand_id: &str, amount: f64) -> Result<SpendTotals> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ControlError::InvalidAmount { amount });
        }

        let lock = self.locks.for_brand(brand_id);
        let _guard = lock.lock().unwrap();

        let mut brand = self.store.get_brand(brand_id)?;
        brand.daily_spend += amount;
        brand.monthly_spend += amount;
        self.store.save_brand(&brand)?;

        debug!(
            brand = %brand.name,
            amount,
            daily_spend = brand.daily_spend,
            monthly_spend = brand.monthly_spend,
            "spend recorded"
        );

        self.append_event(AuditEvent::new(
            "spend_recorded",
            "brand",
            &brand.id,
            serde_json::json!({
                "amount": amount,
                "daily_spend": brand.daily_spend,
                "monthly_spend": brand.monthly_spend,
            }),
            "budget_ledger",
        ));

        Ok(SpendTotals::from_brand(&brand))
    }

    /// Zero the daily counter. The monthly counter is untouched, which is
    /// what gates reactivation after a daily reset.
    pub fn reset_daily(&self, brand_id: &str) -> Result<Brand> {
        let lock = self.locks.for_brand(brand_id);
        let _guard = lock.lock().unwrap();

        let mut brand = self.store.get_brand(brand_id)?;
        brand.daily_spend = 0.0;
        self.store.save_brand(&brand)?;

        self.append_event(AuditEvent::new(
            "daily_reset",
            "brand",
            &brand.id,
            serde_json::json!({ "monthly_spend": brand.monthly_spend }),
            "budget_ledger",
        ));

        Ok(brand)
    }

    /// Zero both counters. A new month starts a new day too.
    pub fn reset_monthly(&self, brand_id: &str) -> Result<Brand> {
        let lock = self.locks.for_brand(brand_id);
        let _guard = lock.lock().unwrap();

        let mut brand = self.store.get_brand(brand_id)?;
        brand.monthly_spend = 0.0;
        brand.daily_spend = 0.0;
        self.store.save_brand(&brand)?;

        self.append_event(AuditEvent::new(
            "monthly_reset",
            "brand",
            &brand.id,
            serde_json::json!({}),
            "budget_ledger",
        ));

        Ok(brand)
    }

    // Audit append failures are logged, never fatal
    fn append_event(&self, event: AuditEvent) {
        if let Err(e) = self.store.append_event(&event) {
            warn!(event_type = %event.event_type, error = %e, "failed to append audit event");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
