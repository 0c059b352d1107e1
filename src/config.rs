use std::env;

use crate::constants::{
    DEFAULT_BACKUP_BUCKET, DEFAULT_BACKUP_TABLES, DEFAULT_DOWNLOAD_CONCURRENCY,
    DEFAULT_REMOTE_TIMEOUT_SECS, DEFAULT_SCHEDULER_CONCURRENCY, DEFAULT_STORAGE_LIST_LIMIT,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    /// Bearer key for the manual backup and history endpoints (disabled when unset)
    pub admin_api_key: Option<String>,
    /// Bearer secret for the cron endpoint (disabled when unset)
    pub cron_secret: Option<String>,
    /// Admin project that stores finished artifacts
    pub admin_storage_url: String,
    pub admin_storage_key: String,
    pub backup_bucket: String,
    pub backup_tables: Vec<String>,
    pub download_concurrency: usize,
    pub scheduler_concurrency: usize,
    pub remote_timeout_secs: u64,
    pub storage_list_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

        let allowed_origins = split_list(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        );

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let admin_api_key = non_empty_var("ADMIN_API_KEY");
        let cron_secret = non_empty_var("CRON_SECRET");

        let admin_storage_url = env::var("ADMIN_STORAGE_URL")
            .map_err(|_| "ADMIN_STORAGE_URL must be set to upload backups")?;
        let admin_storage_key = env::var("ADMIN_STORAGE_KEY")
            .map_err(|_| "ADMIN_STORAGE_KEY must be set to upload backups")?;

        let backup_bucket =
            env::var("BACKUP_BUCKET").unwrap_or_else(|_| DEFAULT_BACKUP_BUCKET.to_string());

        let backup_tables = match non_empty_var("BACKUP_TABLES") {
            Some(list) => split_list(&list),
            None => DEFAULT_BACKUP_TABLES.iter().map(|t| t.to_string()).collect(),
        };

        let download_concurrency: usize = env::var("STORAGE_DOWNLOAD_CONCURRENCY")
            .unwrap_or_else(|_| DEFAULT_DOWNLOAD_CONCURRENCY.to_string())
            .parse()
            .map_err(|_| "Invalid STORAGE_DOWNLOAD_CONCURRENCY")?;

        let scheduler_concurrency: usize = env::var("SCHEDULER_CONCURRENCY")
            .unwrap_or_else(|_| DEFAULT_SCHEDULER_CONCURRENCY.to_string())
            .parse()
            .map_err(|_| "Invalid SCHEDULER_CONCURRENCY")?;

        let remote_timeout_secs = env::var("REMOTE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_REMOTE_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|_| "Invalid REMOTE_TIMEOUT_SECS")?;

        let storage_list_limit = env::var("STORAGE_LIST_LIMIT")
            .unwrap_or_else(|_| DEFAULT_STORAGE_LIST_LIMIT.to_string())
            .parse()
            .map_err(|_| "Invalid STORAGE_LIST_LIMIT")?;

        Ok(Config {
            server_host,
            server_port,
            database_url,
            allowed_origins,
            environment,
            admin_api_key,
            cron_secret,
            admin_storage_url,
            admin_storage_key,
            backup_bucket,
            backup_tables,
            download_concurrency: download_concurrency.max(1),
            scheduler_concurrency: scheduler_concurrency.max(1),
            remote_timeout_secs,
            storage_list_limit,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_blanks() {
        assert_eq!(
            split_list(" services, faqs ,,invoices "),
            vec!["services", "faqs", "invoices"]
        );
        assert!(split_list("").is_empty());
    }
}
