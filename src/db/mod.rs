pub mod pool;

pub use pool::create_pool;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::{BackupLog, BackupLogRow, BackupStatus, CustomerRecord, CustomerRow};

/// Admin-side records the orchestrator and scheduler depend on
///
/// Log rows are written at most twice per run: inserted as `pending`, then
/// moved once to `success` or `failed`.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_customer(&self, id: &str) -> Result<Option<CustomerRecord>>;

    /// Active customers that have project credentials on file
    async fn active_customers(&self) -> Result<Vec<CustomerRecord>>;

    /// Insert a `pending` log row and return its id
    async fn insert_pending_log(&self, customer_id: &str) -> Result<i64>;

    async fn mark_success(
        &self,
        log_id: i64,
        file_path: &str,
        file_size: i64,
        skipped_items: i32,
    ) -> Result<()>;

    async fn mark_failed(&self, log_id: i64, error_message: &str) -> Result<()>;

    /// Most recent runs first
    async fn recent_logs(&self, customer_id: &str, limit: i64) -> Result<Vec<BackupLog>>;

    async fn ping(&self) -> Result<()>;
}

/// [`AdminStore`] backed by the admin Postgres database
#[derive(Clone)]
pub struct PgAdminStore {
    pool: PgPool,
}

impl PgAdminStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn finish_log(
        &self,
        log_id: i64,
        status: BackupStatus,
        file_path: Option<&str>,
        file_size: Option<i64>,
        skipped_items: i32,
        error_message: Option<&str>,
    ) -> Result<()> {
        let from = BackupStatus::Pending;
        let status = from.transition_to(status).map_err(AppError::InvalidRecord)?;

        let result = sqlx::query(
            "UPDATE backup_logs \
             SET status = $2, file_path = $3, file_size = $4, skipped_items = $5, \
                 error_message = $6, completed_at = now() \
             WHERE id = $1 AND status = $7",
        )
        .bind(log_id)
        .bind(status.as_str())
        .bind(file_path)
        .bind(file_size)
        .bind(skipped_items)
        .bind(error_message)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!("Backup log {} was not pending; left unchanged", log_id);
        }

        Ok(())
    }
}

const CUSTOMER_COLUMNS: &str = "id, name, project_url, project_key, tier, active";

fn to_customer(row: CustomerRow) -> Result<CustomerRecord> {
    CustomerRecord::try_from(row).map_err(AppError::InvalidRecord)
}

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn find_customer(&self, id: &str) -> Result<Option<CustomerRecord>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_customer).transpose()
    }

    async fn active_customers(&self) -> Result<Vec<CustomerRecord>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE active AND project_url IS NOT NULL AND project_key IS NOT NULL \
             ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(to_customer).collect()
    }

    async fn insert_pending_log(&self, customer_id: &str) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO backup_logs (customer_id, status) VALUES ($1, 'pending') RETURNING id",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn mark_success(
        &self,
        log_id: i64,
        file_path: &str,
        file_size: i64,
        skipped_items: i32,
    ) -> Result<()> {
        self.finish_log(
            log_id,
            BackupStatus::Success,
            Some(file_path),
            Some(file_size),
            skipped_items,
            None,
        )
        .await
    }

    async fn mark_failed(&self, log_id: i64, error_message: &str) -> Result<()> {
        self.finish_log(log_id, BackupStatus::Failed, None, None, 0, Some(error_message))
            .await
    }

    async fn recent_logs(&self, customer_id: &str, limit: i64) -> Result<Vec<BackupLog>> {
        let rows: Vec<BackupLogRow> = sqlx::query_as(
            "SELECT id, customer_id, status, file_path, file_size, skipped_items, \
                    error_message, started_at, completed_at \
             FROM backup_logs WHERE customer_id = $1 \
             ORDER BY started_at DESC, id DESC LIMIT $2",
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| BackupLog::try_from(row).map_err(AppError::InvalidRecord))
            .collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
