//! Periodic fan-out over all eligible customers
//!
//! Pro customers are backed up on every run, standard customers on the first
//! day of the month. A missed day is not made up later.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::constants::STANDARD_TIER_BACKUP_DAY;
use crate::error::Result;
use crate::models::Tier;
use crate::orchestrator::{run_customer_backup, BackupOutcome};
use crate::AppState;

/// Whether a customer on `tier` is due for a backup on `date`
pub fn is_due(tier: Tier, date: NaiveDate) -> bool {
    match tier {
        Tier::Pro => true,
        Tier::Standard => date.day() == STANDARD_TIER_BACKUP_DAY,
    }
}

/// Outcome for one customer in a scheduled run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledResult {
    pub customer: String,
    pub customer_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BackupOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSummary {
    pub date: NaiveDate,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<ScheduledResult>,
}

/// Back up every customer due on `now`'s date
///
/// Customers run one at a time unless `SCHEDULER_CONCURRENCY` allows more.
/// Each customer's result is independent; a failure never stops the next one.
pub async fn run_scheduled(state: &AppState, now: DateTime<Utc>) -> Result<ScheduleSummary> {
    let date = now.date_naive();

    let due: Vec<_> = state
        .store
        .active_customers()
        .await?
        .into_iter()
        .filter(|c| is_due(c.tier, date))
        .collect();

    tracing::info!("Scheduled backup for {}: {} customer(s) due", date, due.len());

    let results: Vec<ScheduledResult> = stream::iter(due)
        .map(move |customer| async move {
            match run_customer_backup(state, &customer.id, Utc::now()).await {
                Ok(outcome) => ScheduledResult {
                    customer: customer.name,
                    customer_id: customer.id,
                    success: true,
                    result: Some(outcome),
                    error: None,
                },
                Err(e) => ScheduledResult {
                    customer: customer.name,
                    customer_id: customer.id,
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .buffered(state.config.scheduler_concurrency.max(1))
        .collect()
        .await;

    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;

    tracing::info!(
        "Scheduled backup for {} finished: {} succeeded, {} failed",
        date,
        succeeded,
        failed
    );

    Ok(ScheduleSummary {
        date,
        processed: results.len(),
        succeeded,
        failed,
        results,
    })
}
