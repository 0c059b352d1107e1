use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HISTORY_LIMIT, ERR_CUSTOMER_ID_REQUIRED, MAX_HISTORY_LIMIT};
use crate::error::{AppError, Result};
use crate::models::BackupLog;
use crate::orchestrator::{run_customer_backup, BackupOutcome};
use crate::security::require_bearer;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TriggerBackupRequest {
    #[serde(rename = "customerId", default)]
    pub customer_id: String,
}

#[derive(Debug, Serialize)]
pub struct TriggerBackupResponse {
    pub success: bool,
    pub backup: BackupOutcome,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub backups: Vec<BackupLog>,
}

/// Run a backup for one customer now
///
/// POST /api/backups with `{"customerId": "..."}` and the admin bearer key.
/// Failures come back as `{"success": false, "error": "..."}`; the run is
/// still recorded as `failed` in the backup log.
pub async fn trigger_backup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<TriggerBackupRequest>,
) -> Result<Json<TriggerBackupResponse>> {
    require_bearer(&headers, state.config.admin_api_key.as_deref())?;

    let customer_id = payload.customer_id.trim();
    if customer_id.is_empty() {
        return Err(AppError::InvalidInput(ERR_CUSTOMER_ID_REQUIRED.to_string()));
    }

    let backup = run_customer_backup(&state, customer_id, Utc::now()).await?;

    Ok(Json(TriggerBackupResponse {
        success: true,
        backup,
    }))
}

/// Recent backup runs for a customer, newest first
///
/// GET /api/backups/:customer_id?limit=N with the admin bearer key.
pub async fn backup_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(customer_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>> {
    require_bearer(&headers, state.config.admin_api_key.as_deref())?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let backups = state.store.recent_logs(&customer_id, limit).await?;

    Ok(Json(HistoryResponse { backups }))
}
