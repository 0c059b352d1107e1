//! Runs one customer's backup end to end
//!
//! Credential lookup, pending log row, engine run, artifact upload, and the
//! final `success`/`failed` update. Nothing here retries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::engine::{BackupSubject, EngineError};
use crate::error::{AppError, Result};
use crate::models::{ArtifactKind, CustomerRecord, ProjectCredentials, SkippedItem};
use crate::remote::RemoteError;
use crate::security::key_fingerprint;
use crate::AppState;

/// What a successful run produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupOutcome {
    pub log_id: i64,
    pub customer_id: String,
    pub file_name: String,
    pub storage_path: String,
    pub size_bytes: usize,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub skipped: Vec<SkippedItem>,
}

/// Failures after the pending log row exists; these end the run as `failed`
#[derive(Error, Debug)]
enum RunError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Upload failed: {0}")]
    Upload(#[source] RemoteError),
}

struct Uploaded {
    storage_path: String,
    file_name: String,
    kind: ArtifactKind,
    size_bytes: usize,
    skipped: Vec<SkippedItem>,
}

/// Object key for an artifact in the admin bucket
pub fn storage_path(customer_id: &str, file_name: &str) -> String {
    format!("{}/{}", customer_id, file_name)
}

/// Back up one customer and record the run in the admin database
pub async fn run_customer_backup(
    state: &AppState,
    customer_id: &str,
    now: DateTime<Utc>,
) -> Result<BackupOutcome> {
    let customer = state
        .store
        .find_customer(customer_id)
        .await?
        .ok_or(AppError::CustomerNotFound)?;

    let credentials = customer.credentials().ok_or_else(|| {
        tracing::warn!("Customer {} has no project credentials", customer.id);
        AppError::MissingCredentials
    })?;

    let log_id = state.store.insert_pending_log(&customer.id).await?;

    tracing::info!(
        "Backup {} started for customer {} (tier {}, key {})",
        log_id,
        customer.id,
        credentials.tier,
        key_fingerprint(&credentials.project_key)
    );

    match produce_and_upload(state, &customer, &credentials, now).await {
        Ok(uploaded) => {
            state
                .store
                .mark_success(
                    log_id,
                    &uploaded.storage_path,
                    uploaded.size_bytes as i64,
                    uploaded.skipped.len() as i32,
                )
                .await?;

            tracing::info!(
                "Backup {} succeeded for customer {}: {} ({} bytes)",
                log_id,
                customer.id,
                uploaded.storage_path,
                uploaded.size_bytes
            );

            Ok(BackupOutcome {
                log_id,
                customer_id: customer.id,
                file_name: uploaded.file_name,
                storage_path: uploaded.storage_path,
                size_bytes: uploaded.size_bytes,
                kind: uploaded.kind,
                skipped: uploaded.skipped,
            })
        }
        Err(e) => {
            let message = e.to_string();
            tracing::error!(
                "Backup {} failed for customer {}: {}",
                log_id,
                customer.id,
                message
            );
            state.store.mark_failed(log_id, &message).await?;
            Err(AppError::BackupFailed(message))
        }
    }
}

async fn produce_and_upload(
    state: &AppState,
    customer: &CustomerRecord,
    credentials: &ProjectCredentials,
    now: DateTime<Utc>,
) -> std::result::Result<Uploaded, RunError> {
    let session = state.connector.connect(credentials);
    let subject = BackupSubject {
        name: customer.name.clone(),
        tier: credentials.tier,
    };

    let artifact = state
        .engine
        .generate_backup(session.as_ref(), &subject, now)
        .await?;

    let path = storage_path(&customer.id, &artifact.file_name);
    let size_bytes = artifact.size();

    state
        .artifacts
        .upload(&path, artifact.buffer, artifact.kind.content_type())
        .await
        .map_err(RunError::Upload)?;

    Ok(Uploaded {
        storage_path: path,
        file_name: artifact.file_name,
        kind: artifact.kind,
        size_bytes,
        skipped: artifact.skipped,
    })
}
