//! Per-customer backup engine
//!
//! Reads every configured table from a customer project, pulls root-level
//! storage objects for pro customers, and packages the result as a single
//! artifact. Unreadable tables, buckets and objects are skipped, never fatal.

pub mod archive;
pub mod storage;
pub mod tables;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::constants::{DEFAULT_BACKUP_TABLES, DEFAULT_DOWNLOAD_CONCURRENCY};
use crate::models::{ArtifactKind, BackupArtifact, Tier};
use crate::remote::{ProjectSession, RemoteError};

/// Engine-level failures; these fail the whole run
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Customer project unreachable: {0}")]
    Unreachable(#[source] RemoteError),

    #[error("Failed to serialize table export: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to write archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tables read from every project, in order
    pub tables: Vec<String>,
    /// Parallel object downloads per bucket
    pub download_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tables: DEFAULT_BACKUP_TABLES.iter().map(|t| t.to_string()).collect(),
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
        }
    }
}

/// Who the backup is for; drives the file name and the tier-dependent steps
#[derive(Debug, Clone)]
pub struct BackupSubject {
    pub name: String,
    pub tier: Tier,
}

#[derive(Debug, Clone, Default)]
pub struct BackupEngine {
    config: EngineConfig,
}

impl BackupEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Produce the backup artifact for one customer project
    pub async fn generate_backup(
        &self,
        session: &dyn ProjectSession,
        subject: &BackupSubject,
        now: DateTime<Utc>,
    ) -> Result<BackupArtifact, EngineError> {
        let (export, mut skipped) = tables::export_tables(session, &self.config.tables).await?;

        let (buffer, kind) = if subject.tier.exports_storage() {
            let (objects, storage_skipped) =
                storage::export_storage(session, self.config.download_concurrency).await;
            skipped.extend(storage_skipped);

            let buffer =
                tokio::task::spawn_blocking(move || archive::build_archive(&export, &objects))
                    .await??;
            (buffer, ArtifactKind::Binary)
        } else {
            (archive::export_json(&export)?, ArtifactKind::Json)
        };

        let file_name = archive::artifact_file_name(&subject.name, now, kind);

        if !skipped.is_empty() {
            tracing::warn!(
                "Backup {} completed with {} skipped item(s)",
                file_name,
                skipped.len()
            );
        }

        Ok(BackupArtifact {
            buffer,
            file_name,
            kind,
            skipped,
        })
    }
}
