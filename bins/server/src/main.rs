//! Fieldline API server.
//!
//! Loads configuration, connects to Postgres, provisions the asset bucket
//! when storage is configured, and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fieldline_api::{AppState, create_router};
use fieldline_core::storage::{StorageConfig, StorageService};
use fieldline_db::connect_with;
use fieldline_shared::{AppConfig, JwtConfig, JwtService, StorageSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .context("jwt.access_token_expiry_secs is too large")?,
    });

    let storage = match &config.storage {
        Some(settings) => Some(Arc::new(init_storage(settings).await?)),
        None => {
            warn!("No storage configured; asset endpoints will answer 503");
            None
        }
    };

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the storage service and makes sure its bucket exists.
async fn init_storage(settings: &StorageSettings) -> anyhow::Result<StorageService> {
    let storage_config =
        StorageConfig::from_settings(settings).context("invalid storage configuration")?;
    let provider = storage_config.provider.name();
    let storage =
        StorageService::from_config(storage_config).context("failed to initialize storage")?;

    storage
        .ensure_bucket_exists(storage.bucket())
        .await
        .with_context(|| format!("failed to provision bucket {}", storage.bucket()))?;

    info!(provider, bucket = storage.bucket(), "Object storage ready");
    Ok(storage)
}
