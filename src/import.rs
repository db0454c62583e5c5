// 📂 Spend Report Import - CSV rows into spend events, exactly once
//
// Ad-serving exports arrive as CSV and may be re-delivered in full. Each
// row carries enough identity to hash, so a re-import applies nothing new:
// already-seen hashes are skipped, bad rows are counted and reported, and
// the rest flow through the normal spend-event entry point.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::warn;

use crate::error::Result;
use crate::service::ControlService;

// ============================================================================
// SPEND RECORD
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendRecord {
    #[serde(rename = "Campaign_Id")]
    pub campaign_id: String,

    #[serde(rename = "Amount")]
    pub amount: f64,

    /// Timestamp string from the report, kept verbatim; it only feeds the
    /// idempotency hash
    #[serde(rename = "Occurred_At")]
    pub occurred_at: String,
}

impl SpendRecord {
    /// Hash for duplicate detection across repeated report deliveries.
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}",
            self.campaign_id, self.amount, self.occurred_at
        ));
        format!("{:x}", hasher.finalize())
    }
}

/// Load a spend report from CSV.
pub fn load_spend_records(path: &Path) -> anyhow::Result<Vec<SpendRecord>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open spend report: {:?}", path))?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: SpendRecord = result.context("Failed to deserialize spend row")?;
        records.push(record);
    }

    Ok(records)
}

// ============================================================================
// APPLY
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct ImportSummary {
    /// Rows recorded into the ledger
    pub applied: usize,
    /// Rows skipped because their hash was already applied
    pub duplicates: usize,
    /// Rows refused (unknown campaign, inactive campaign, bad amount)
    pub rejected: usize,
}

/// Feed a spend report through the service, row by row.
///
/// A refused row never aborts the rest of the report; it is counted and
/// logged. Re-running the same report yields applied == 0.
pub fn apply_spend_records(
    service: &ControlService,
    records: &[SpendRecord],
) -> Result<ImportSummary> {
    let store = service.store();
    let mut summary = ImportSummary::default();

    for record in records {
        let hash = record.compute_idempotency_hash();

        if store.spend_marker_seen(&hash)? {
            summary.duplicates += 1;
            continue;
        }

        match service.on_spend_event(&record.campaign_id, record.amount) {
            Ok(_) => {
                store.record_spend_marker(&hash)?;
                summary.applied += 1;
            }
            Err(e) => {
                summary.rejected += 1;
                warn!(
                    campaign = %record.campaign_id,
                    amount = record.amount,
                    error = %e,
                    "spend row refused"
                );
            }
        }
    }

    Ok(summary)
}

// ============================================================================
// TESTS
// ============================================================================
