pub mod backup;
pub mod cron;
pub mod health;

pub use backup::{backup_history, trigger_backup};
pub use cron::scheduled_backups;
pub use health::health_check;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

/// All routes, without transport layers (CORS, tracing)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/backups", post(trigger_backup))
        .route("/api/backups/:customer_id", get(backup_history))
        .route(
            "/api/cron/backups",
            get(scheduled_backups).post(scheduled_backups),
        )
        .with_state(state)
}
