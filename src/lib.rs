//! Agency Backup Server Library
//!
//! Backs up customer-owned hosted projects (database tables and, for pro
//! customers, storage objects) into single downloadable artifacts.

pub mod config;
pub mod constants;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod remote;
pub mod routes;
pub mod scheduler;
pub mod security;

pub use config::Config;
pub use db::{AdminStore, PgAdminStore};
pub use engine::{BackupEngine, EngineConfig};
pub use error::{AppError, Result};
pub use remote::{ArtifactStore, ProjectConnector};

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Every collaborator is injected, so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn AdminStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub connector: Arc<dyn ProjectConnector>,
    pub engine: BackupEngine,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn AdminStore>,
        artifacts: Arc<dyn ArtifactStore>,
        connector: Arc<dyn ProjectConnector>,
    ) -> Self {
        let engine = BackupEngine::new(EngineConfig {
            tables: config.backup_tables.clone(),
            download_concurrency: config.download_concurrency,
        });

        Self {
            config,
            store,
            artifacts,
            connector,
            engine,
        }
    }
}
