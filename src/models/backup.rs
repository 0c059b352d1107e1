use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of one backup run: `pending -> {success, failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupStatus {
    Pending,
    Success,
    Failed,
}

impl BackupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BackupStatus::Pending => "pending",
            BackupStatus::Success => "success",
            BackupStatus::Failed => "failed",
        }
    }

    /// Only pending runs may move, and only to a terminal state
    pub fn can_transition_to(self, next: BackupStatus) -> bool {
        matches!(
            (self, next),
            (BackupStatus::Pending, BackupStatus::Success)
                | (BackupStatus::Pending, BackupStatus::Failed)
        )
    }

    pub fn transition_to(self, next: BackupStatus) -> Result<BackupStatus, String> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(format!("Backup log cannot move from {self} to {next}"))
        }
    }
}

impl FromStr for BackupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BackupStatus::Pending),
            "success" => Ok(BackupStatus::Success),
            "failed" => Ok(BackupStatus::Failed),
            other => Err(format!("Unknown backup status: {other}")),
        }
    }
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backup log row as stored in the admin database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BackupLogRow {
    pub id: i64,
    pub customer_id: String,
    pub status: String,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub skipped_items: i32,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One backup run as exposed by the history endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupLog {
    pub id: i64,
    pub customer_id: String,
    pub status: BackupStatus,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub skipped_items: i32,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<BackupLogRow> for BackupLog {
    type Error = String;

    fn try_from(row: BackupLogRow) -> Result<Self, Self::Error> {
        Ok(BackupLog {
            status: row.status.parse()?,
            id: row.id,
            customer_id: row.customer_id,
            file_path: row.file_path,
            file_size: row.file_size,
            skipped_items: row.skipped_items,
            error_message: row.error_message,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}
