// 📣 Campaign Entity - Activation flag + optional dayparting window
//
// A campaign belongs to exactly one brand (immutable reference) and carries
// the `is_active` flag the activation engine derives. Nothing else is
// allowed to write that flag.
//
// Dayparting: when enabled, both hours are required; when disabled, the
// hour fields are never read by the engine.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};

// ============================================================================
// CAMPAIGN ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Stable identity (UUID) - NEVER changes
    pub id: String,

    /// Campaign name
    pub name: String,

    /// Owning brand (set at creation, never re-parented)
    pub brand_id: String,

    /// Derived activation flag. Written only by the activation engine.
    pub is_active: bool,

    /// Whether this campaign is restricted to a daily time-of-day window
    pub use_dayparting: bool,

    /// Window start (minute precision). Required iff `use_dayparting`.
    pub start_hour: Option<NaiveTime>,

    /// Window end (minute precision). Required iff `use_dayparting`.
    pub end_hour: Option<NaiveTime>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Create a campaign without dayparting. Starts active; the first
    /// evaluation re-derives the flag from the brand's budget state.
    pub fn new(name: &str, brand_id: &str) -> Result<Self> {
        Self::build(name, brand_id, false, None, None)
    }

    /// Create a campaign restricted to a daily time window.
    pub fn with_dayparting(
        name: &str,
        brand_id: &str,
        start_hour: NaiveTime,
        end_hour: NaiveTime,
    ) -> Result<Self> {
        Self::build(name, brand_id, true, Some(start_hour), Some(end_hour))
    }

    fn build(
        name: &str,
        brand_id: &str,
        use_dayparting: bool,
        start_hour: Option<NaiveTime>,
        end_hour: Option<NaiveTime>,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(ControlError::InvalidConfiguration(
                "campaign name must not be empty".to_string(),
            ));
        }
        if brand_id.is_empty() {
            return Err(ControlError::InvalidConfiguration(
                "campaign must reference a brand".to_string(),
            ));
        }

        // Hours travel with the flag: both present when dayparting is on,
        // both absent when it is off.
        match (use_dayparting, start_hour, end_hour) {
            (true, Some(_), Some(_)) => {}
            (true, _, _) => {
                return Err(ControlError::InvalidConfiguration(
                    "dayparting requires both start_hour and end_hour".to_string(),
                ));
            }
            (false, None, None) => {}
            (false, _, _) => {
                return Err(ControlError::InvalidConfiguration(
                    "hours given but dayparting is disabled".to_string(),
                ));
            }
        }

        let now = Utc::now();

        Ok(Campaign {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            brand_id: brand_id.to_string(),
            is_active: true,
            use_dayparting,
            start_hour,
            end_hour,
            created_at: now,
            updated_at: now,
        })
    }

    /// Window accessor for dayparting campaigns.
    ///
    /// Returns None when dayparting is off, so callers cannot accidentally
    /// read hours that are not part of the configuration.
    pub fn daypart_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        if !self.use_dayparting {
            return None;
        }
        match (self.start_hour, self.end_hour) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
