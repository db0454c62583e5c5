// Campaign Control System - Scheduler Shell
// Drives the four cadences against one shared service:
//   - calendar loop (minutely): daily reset at date boundaries, monthly
//     reset at month boundaries
//   - budget sweep every few minutes (spend can pass a ceiling at any time)
//   - dayparting sweep every ~15 minutes
//
// Sweeps skip a missed tick instead of overlapping a still-running one.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use campaign_control::{BudgetStore, ControlService, SqliteStore};

fn env_secs(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_path = env::var("CAMPAIGN_CONTROL_DB").unwrap_or_else(|_| "campaigns.db".to_string());
    let store: Arc<dyn BudgetStore> =
        Arc::new(SqliteStore::open(&db_path).context("Failed to open database")?);
    let service = Arc::new(ControlService::new(store));

    let budget_secs = env_secs("CAMPAIGN_BUDGET_SWEEP_SECS", 300);
    let daypart_secs = env_secs("CAMPAIGN_DAYPART_SWEEP_SECS", 900);

    info!(
        db = %db_path,
        budget_sweep_secs = budget_secs,
        daypart_sweep_secs = daypart_secs,
        version = campaign_control::VERSION,
        "scheduler starting"
    );

    let calendar = tokio::spawn(calendar_loop(service.clone()));
    let budget = tokio::spawn(sweep_loop(
        service.clone(),
        Duration::from_secs(budget_secs),
        SweepKind::Budget,
    ));
    let daypart = tokio::spawn(sweep_loop(
        service.clone(),
        Duration::from_secs(daypart_secs),
        SweepKind::Daypart,
    ));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    calendar.abort();
    budget.abort();
    daypart.abort();

    Ok(())
}

/// Watch the UTC calendar once a minute. A month boundary fires the monthly
/// reset (which already implies the daily one); any other date change fires
/// the daily reset.
async fn calendar_loop(service: Arc<ControlService>) {
    let mut ticker = interval(Duration::from_secs(60));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_date = Utc::now().date_naive();

    loop {
        ticker.tick().await;

        let today = Utc::now().date_naive();
        if today == last_date {
            continue;
        }

        let month_changed =
            today.month() != last_date.month() || today.year() != last_date.year();
        last_date = today;

        let service = service.clone();
        let result = tokio::task::spawn_blocking(move || {
            if month_changed {
                service.on_monthly_tick()
            } else {
                service.on_daily_tick()
            }
        })
        .await;

        match result {
            Ok(Ok(summary)) => info!(
                monthly = month_changed,
                activated = summary.activated,
                deactivated = summary.deactivated,
                failures = summary.failures,
                "calendar reset complete"
            ),
            Ok(Err(e)) => warn!(error = %e, "calendar reset failed"),
            Err(e) => warn!(error = %e, "calendar reset task panicked"),
        }
    }
}

#[derive(Clone, Copy)]
enum SweepKind {
    Budget,
    Daypart,
}

impl SweepKind {
    fn name(self) -> &'static str {
        match self {
            SweepKind::Budget => "budget",
            SweepKind::Daypart => "daypart",
        }
    }
}

async fn sweep_loop(service: Arc<ControlService>, period: Duration, kind: SweepKind) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let service = service.clone();
        let result = tokio::task::spawn_blocking(move || match kind {
            SweepKind::Budget => service.on_budget_sweep_tick(),
            SweepKind::Daypart => service.on_daypart_sweep_tick(),
        })
        .await;

        match result {
            Ok(Ok(summary)) => {
                if summary.changed() > 0 || summary.failures > 0 {
                    info!(
                        sweep = kind.name(),
                        activated = summary.activated,
                        deactivated = summary.deactivated,
                        failures = summary.failures,
                        "sweep complete"
                    );
                }
            }
            Ok(Err(e)) => warn!(sweep = kind.name(), error = %e, "sweep failed"),
            Err(e) => warn!(sweep = kind.name(), error = %e, "sweep task panicked"),
        }
    }
}
