// 🏷️ Brand Entity - Budget ceilings + accumulated spend
//
// A brand owns the money: daily and monthly ceilings, and the two spend
// counters the ledger accumulates into. Campaigns reference the brand and
// inherit its budget state.
//
// Identity: UUID (never changes). Values: budgets and spend counters.
// Spend counters only move in one direction between resets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};

// ============================================================================
// BRAND ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    /// Stable identity (UUID) - NEVER changes
    pub id: String,

    /// Brand name (unique, non-empty)
    pub name: String,

    /// Daily spend ceiling (> 0)
    pub daily_budget: f64,

    /// Monthly spend ceiling (> 0)
    pub monthly_budget: f64,

    /// Spend accumulated since the last daily reset (>= 0)
    pub daily_spend: f64,

    /// Spend accumulated since the last monthly reset (>= 0)
    pub monthly_spend: f64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    /// Create a new brand with zeroed spend counters.
    ///
    /// Validation happens here, at onboarding, so malformed budgets never
    /// reach the engine.
    pub fn new(name: &str, daily_budget: f64, monthly_budget: f64) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(ControlError::InvalidConfiguration(
                "brand name must not be empty".to_string(),
            ));
        }
        if !daily_budget.is_finite() || daily_budget <= 0.0 {
            return Err(ControlError::InvalidConfiguration(format!(
                "daily budget must be positive, got {}",
                daily_budget
            )));
        }
        if !monthly_budget.is_finite() || monthly_budget <= 0.0 {
            return Err(ControlError::InvalidConfiguration(format!(
                "monthly budget must be positive, got {}",
                monthly_budget
            )));
        }

        let now = Utc::now();

        Ok(Brand {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            daily_budget,
            monthly_budget,
            daily_spend: 0.0,
            monthly_spend: 0.0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Daily ceiling reached or passed. Inclusive: spend exactly equal to
    /// the budget already counts as exceeded.
    pub fn is_daily_exceeded(&self) -> bool {
        self.daily_spend >= self.daily_budget
    }

    /// Monthly ceiling reached or passed (inclusive, same as daily).
    pub fn is_monthly_exceeded(&self) -> bool {
        self.monthly_spend >= self.monthly_budget
    }

    /// Either ceiling reached or passed.
    pub fn is_budget_exceeded(&self) -> bool {
        self.is_daily_exceeded() || self.is_monthly_exceeded()
    }

    /// Remaining headroom under the daily ceiling (never negative).
    pub fn daily_remaining(&self) -> f64 {
        (self.daily_budget - self.daily_spend).max(0.0)
    }

    /// Remaining headroom under the monthly ceiling (never negative).
    pub fn monthly_remaining(&self) -> f64 {
        (self.monthly_budget - self.monthly_spend).max(0.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
