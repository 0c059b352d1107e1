//! Shared fixtures for integration tests: an in-process mock of the hosted
//! project API and in-memory admin-side stores.

#![allow(dead_code)]

use agency_backup_server::models::{BackupLog, BackupStatus, CustomerRecord, Tier};
use agency_backup_server::remote::{BucketArtifactStore, HttpConnector, RemoteProject};
use agency_backup_server::{AdminStore, AppError, AppState, Config};
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const CRON_SECRET: &str = "test-cron-secret";
pub const PROJECT_KEY: &str = "customer-service-key";
pub const ADMIN_STORAGE_KEY: &str = "admin-service-key";

// =============================================================================
// Mock hosted project
// =============================================================================

/// Contents served by a mock project
#[derive(Default)]
pub struct ProjectData {
    pub api_key: String,
    pub tables: HashMap<String, Value>,
    pub buckets: Vec<String>,
    pub failing_buckets: HashSet<String>,
    pub entries: HashMap<String, Vec<Value>>,
    pub objects: HashMap<(String, String), Vec<u8>>,
    pub uploads: HashMap<String, (Vec<u8>, String)>,
    pub reject_uploads: bool,
}

impl ProjectData {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            ..Default::default()
        }
    }

    pub fn table(mut self, name: &str, rows: Value) -> Self {
        self.tables.insert(name.to_string(), rows);
        self
    }

    pub fn object(mut self, bucket: &str, name: &str, bytes: &[u8]) -> Self {
        self.ensure_bucket(bucket);
        self.entries
            .entry(bucket.to_string())
            .or_default()
            .push(json!({ "name": name, "id": format!("id-{name}"), "metadata": {} }));
        self.objects
            .insert((bucket.to_string(), name.to_string()), bytes.to_vec());
        self
    }

    pub fn folder(mut self, bucket: &str, name: &str) -> Self {
        self.ensure_bucket(bucket);
        self.entries
            .entry(bucket.to_string())
            .or_default()
            .push(json!({ "name": name, "id": null, "metadata": null }));
        self
    }

    pub fn failing_bucket(mut self, bucket: &str) -> Self {
        self.ensure_bucket(bucket);
        self.failing_buckets.insert(bucket.to_string());
        self
    }

    fn ensure_bucket(&mut self, bucket: &str) {
        if !self.buckets.iter().any(|b| b == bucket) {
            self.buckets.push(bucket.to_string());
        }
    }
}

type Shared = Arc<Mutex<ProjectData>>;

/// Hosted project API served from a local port
pub struct MockProject {
    pub base_url: String,
    data: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl MockProject {
    pub async fn start(data: ProjectData) -> Self {
        let data = Arc::new(Mutex::new(data));

        let app = Router::new()
            .route("/rest/v1/:table", get(select_table))
            .route("/storage/v1/bucket", get(list_buckets))
            .route("/storage/v1/object/list/:bucket", post(list_objects))
            .route(
                "/storage/v1/object/:bucket/*name",
                get(download_object).post(upload_object),
            )
            .with_state(data.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock project");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            data,
            handle,
        }
    }

    pub fn upload(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.data.lock().unwrap().uploads.get(key).cloned()
    }

    pub fn upload_keys(&self) -> Vec<String> {
        self.data.lock().unwrap().uploads.keys().cloned().collect()
    }

    pub fn reject_uploads(&self) {
        self.data.lock().unwrap().reject_uploads = true;
    }
}

impl Drop for MockProject {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn authorized(headers: &HeaderMap, data: &ProjectData) -> bool {
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    apikey == Some(data.api_key.as_str()) && bearer == Some(data.api_key.as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid API key" })),
    )
        .into_response()
}

async fn select_table(
    State(data): State<Shared>,
    Path(table): Path<String>,
    headers: HeaderMap,
) -> Response {
    let data = data.lock().unwrap();
    if !authorized(&headers, &data) {
        return unauthorized();
    }
    match data.tables.get(&table) {
        Some(rows) => Json(rows.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "code": "42P01",
                "message": format!("relation \"public.{table}\" does not exist"),
            })),
        )
            .into_response(),
    }
}

async fn list_buckets(State(data): State<Shared>, headers: HeaderMap) -> Response {
    let data = data.lock().unwrap();
    if !authorized(&headers, &data) {
        return unauthorized();
    }
    let buckets: Vec<Value> = data
        .buckets
        .iter()
        .map(|b| json!({ "id": b, "name": b, "public": false }))
        .collect();
    Json(buckets).into_response()
}

async fn list_objects(
    State(data): State<Shared>,
    Path(bucket): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let data = data.lock().unwrap();
    if !authorized(&headers, &data) {
        return unauthorized();
    }
    assert_eq!(body["prefix"], "", "only root-level listings are expected");
    if data.failing_buckets.contains(&bucket) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "listing failed" })),
        )
            .into_response();
    }
    let offset = body["offset"].as_u64().unwrap_or(0) as usize;
    let limit = body["limit"].as_u64().unwrap_or(100) as usize;
    let page: Vec<Value> = data
        .entries
        .get(&bucket)
        .map(|entries| entries.iter().skip(offset).take(limit).cloned().collect())
        .unwrap_or_default();
    Json(page).into_response()
}

async fn download_object(
    State(data): State<Shared>,
    Path((bucket, name)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let data = data.lock().unwrap();
    if !authorized(&headers, &data) {
        return unauthorized();
    }
    match data.objects.get(&(bucket, name)) {
        Some(bytes) => bytes.clone().into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Object not found" })),
        )
            .into_response(),
    }
}

async fn upload_object(
    State(data): State<Shared>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut data = data.lock().unwrap();
    if !authorized(&headers, &data) {
        return unauthorized();
    }
    if data.reject_uploads {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "storage unavailable" })),
        )
            .into_response();
    }
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    data.uploads
        .insert(format!("{bucket}/{key}"), (body.to_vec(), content_type));
    Json(json!({ "Key": format!("{bucket}/{key}") })).into_response()
}

// =============================================================================
// In-memory admin store
// =============================================================================

#[derive(Default)]
struct AdminData {
    customers: Vec<CustomerRecord>,
    logs: Vec<BackupLog>,
}

#[derive(Default)]
pub struct MemoryAdminStore {
    inner: Mutex<AdminData>,
}

impl MemoryAdminStore {
    pub fn add_customer(&self, customer: CustomerRecord) {
        self.inner.lock().unwrap().customers.push(customer);
    }

    pub fn logs(&self) -> Vec<BackupLog> {
        self.inner.lock().unwrap().logs.clone()
    }

    fn finish(
        &self,
        log_id: i64,
        status: BackupStatus,
        apply: impl FnOnce(&mut BackupLog),
    ) -> agency_backup_server::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let log = inner
            .logs
            .iter_mut()
            .find(|l| l.id == log_id)
            .ok_or_else(|| AppError::InvalidRecord(format!("no log {log_id}")))?;
        log.status = log
            .status
            .transition_to(status)
            .unwrap_or_else(|e| panic!("log {log_id}: {e}"));
        log.completed_at = Some(Utc::now());
        apply(log);
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryAdminStore {
    async fn find_customer(&self, id: &str) -> agency_backup_server::Result<Option<CustomerRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn active_customers(&self) -> agency_backup_server::Result<Vec<CustomerRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .customers
            .iter()
            .filter(|c| c.active && c.project_url.is_some() && c.project_key.is_some())
            .cloned()
            .collect())
    }

    async fn insert_pending_log(&self, customer_id: &str) -> agency_backup_server::Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.logs.len() as i64 + 1;
        inner.logs.push(BackupLog {
            id,
            customer_id: customer_id.to_string(),
            status: BackupStatus::Pending,
            file_path: None,
            file_size: None,
            skipped_items: 0,
            error_message: None,
            started_at: Utc::now(),
            completed_at: None,
        });
        Ok(id)
    }

    async fn mark_success(
        &self,
        log_id: i64,
        file_path: &str,
        file_size: i64,
        skipped_items: i32,
    ) -> agency_backup_server::Result<()> {
        self.finish(log_id, BackupStatus::Success, |log| {
            log.file_path = Some(file_path.to_string());
            log.file_size = Some(file_size);
            log.skipped_items = skipped_items;
        })
    }

    async fn mark_failed(&self, log_id: i64, error_message: &str) -> agency_backup_server::Result<()> {
        self.finish(log_id, BackupStatus::Failed, |log| {
            log.error_message = Some(error_message.to_string());
        })
    }

    async fn recent_logs(
        &self,
        customer_id: &str,
        limit: i64,
    ) -> agency_backup_server::Result<Vec<BackupLog>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .logs
            .iter()
            .rev()
            .filter(|l| l.customer_id == customer_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> agency_backup_server::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

pub fn customer(id: &str, name: &str, tier: Tier, project: &MockProject) -> CustomerRecord {
    CustomerRecord {
        id: id.to_string(),
        name: name.to_string(),
        project_url: Some(project.base_url.clone()),
        project_key: Some(PROJECT_KEY.to_string()),
        tier,
        active: true,
    }
}

/// Create a test configuration
pub fn test_config(admin_storage_url: &str) -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: String::new(),
        allowed_origins: vec!["http://localhost:3000".to_string()],
        environment: "test".to_string(),
        admin_api_key: Some(ADMIN_KEY.to_string()),
        cron_secret: Some(CRON_SECRET.to_string()),
        admin_storage_url: admin_storage_url.to_string(),
        admin_storage_key: ADMIN_STORAGE_KEY.to_string(),
        backup_bucket: "client-backups".to_string(),
        backup_tables: ["services", "packages", "faqs", "invoices"]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        download_concurrency: 2,
        scheduler_concurrency: 1,
        remote_timeout_secs: 5,
        storage_list_limit: 100,
    }
}

/// Wire real HTTP collaborators against the mocks, with an in-memory admin store
pub fn test_state(admin_project: &MockProject, store: Arc<MemoryAdminStore>) -> AppState {
    test_state_with_config(test_config(&admin_project.base_url), store)
}

pub fn test_state_with_config(config: Config, store: Arc<MemoryAdminStore>) -> AppState {
    let connector = HttpConnector::new(
        Duration::from_secs(config.remote_timeout_secs),
        config.storage_list_limit,
    )
    .expect("Failed to build HTTP client");
    let artifacts = BucketArtifactStore::new(
        RemoteProject::new(
            connector.client(),
            config.admin_storage_url.clone(),
            config.admin_storage_key.clone(),
        ),
        config.backup_bucket.clone(),
    );

    AppState::new(config, store, Arc::new(artifacts), Arc::new(connector))
}

pub async fn admin_project() -> MockProject {
    MockProject::start(ProjectData::new(ADMIN_STORAGE_KEY)).await
}
