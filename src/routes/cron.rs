use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;

use crate::error::Result;
use crate::scheduler::{run_scheduled, ScheduleSummary};
use crate::security::require_bearer;
use crate::AppState;

/// Scheduled fan-out, triggered by the platform cron
///
/// Takes no body; authenticated with `Authorization: Bearer <CRON_SECRET>`.
/// Always answers with the per-customer summary once every due customer has
/// been attempted.
pub async fn scheduled_backups(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ScheduleSummary>> {
    require_bearer(&headers, state.config.cron_secret.as_deref())?;

    let summary = run_scheduled(&state, Utc::now()).await?;

    Ok(Json(summary))
}
