// Error taxonomy for the activation engine
//
// Everything here is recoverable: a failed brand or campaign never takes
// down a sweep over the others. Callers retry by re-running the operation
// from scratch (every engine operation is idempotent).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    /// Unknown brand id - surfaced to the caller, never retried silently
    #[error("brand not found: {0}")]
    BrandNotFound(String),

    /// Unknown campaign id - surfaced to the caller, never retried silently
    #[error("campaign not found: {0}")]
    CampaignNotFound(String),

    /// Negative or non-finite spend amount, rejected before any write
    #[error("invalid spend amount: {amount}")]
    InvalidAmount { amount: f64 },

    /// Bad entity configuration, rejected at creation time so it never
    /// reaches the engine
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Spend reported against a campaign that is not currently active
    #[error("campaign not active: {0}")]
    CampaignNotActive(String),

    /// Underlying store failure
    #[error("store error: {0}")]
    Store(String),
}

impl From<rusqlite::Error> for ControlError {
    fn from(err: rusqlite::Error) -> Self {
        ControlError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for ControlError {
    fn from(err: serde_json::Error) -> Self {
        ControlError::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
