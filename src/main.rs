use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agency_backup_server::db::create_pool;
use agency_backup_server::remote::{BucketArtifactStore, HttpConnector, RemoteProject};
use agency_backup_server::{routes, AppState, Config, PgAdminStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agency_backup_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Agency Backup Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}, tables: {}",
        config.environment,
        config.server_address(),
        config.backup_tables.join(",")
    );

    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET not set; scheduled backups are disabled");
    }
    if config.admin_api_key.is_none() {
        tracing::warn!("ADMIN_API_KEY not set; manual backups are disabled");
    }

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations complete");

    // Remote project access
    let connector = HttpConnector::new(
        Duration::from_secs(config.remote_timeout_secs),
        config.storage_list_limit,
    )?;
    let admin_project = RemoteProject::new(
        connector.client(),
        config.admin_storage_url.clone(),
        config.admin_storage_key.clone(),
    );
    let artifacts = BucketArtifactStore::new(admin_project, config.backup_bucket.clone());

    // Configure CORS
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    // Create app state
    let state = AppState::new(
        config.clone(),
        Arc::new(PgAdminStore::new(pool)),
        Arc::new(artifacts),
        Arc::new(connector),
    );

    // Build router
    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
