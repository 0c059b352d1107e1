/// Tables exported from every customer project unless `BACKUP_TABLES` overrides them
pub const DEFAULT_BACKUP_TABLES: &[&str] = &[
    "services",
    "contacts",
    "content_blocks",
    "packages",
    "site_settings",
    "faqs",
    "trust_badges",
    "invoices",
];

/// Archive member holding the serialized table export
pub const DATABASE_EXPORT_ENTRY: &str = "database_export.json";

/// Archive directory that staged storage objects live under
pub const STORAGE_ARCHIVE_PREFIX: &str = "storage";

/// Admin-side bucket receiving finished artifacts
pub const DEFAULT_BACKUP_BUCKET: &str = "client-backups";

/// Parallel object downloads per bucket
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 4;

/// Customers backed up at the same time by the scheduler (1 = sequential)
pub const DEFAULT_SCHEDULER_CONCURRENCY: usize = 1;

/// Remote request timeout in seconds
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 60;

/// Maximum entries requested per bucket listing
pub const DEFAULT_STORAGE_LIST_LIMIT: u32 = 1000;

/// Day of month on which standard-tier customers are backed up
pub const STANDARD_TIER_BACKUP_DAY: u32 = 1;

/// Backup history page size
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;
pub const MAX_HISTORY_LIMIT: i64 = 100;

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_CUSTOMER_ID_REQUIRED: &str = "customerId is required";

pub const ERR_MISSING_CREDENTIALS: &str = "Customer has no project credentials configured";
