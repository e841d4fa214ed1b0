//! ClientDesk API Server
//!
//! Main entry point for the ClientDesk backend service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clientdesk_api::{AppState, create_router};
use clientdesk_core::storage::FacadeOptions;
use clientdesk_db::connect_with_pool;
use clientdesk_shared::{AppConfig, FallbackPolicy, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clientdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .context("Failed to connect to database")?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .unwrap_or(i64::MAX),
    });

    let storage = FacadeOptions::from_settings(&config.storage);
    match storage.fallback {
        FallbackPolicy::Strict => info!("Storage: firms must connect their own provider"),
        FallbackPolicy::AutoDetect => warn!(
            local_root = %storage.local_root.display(),
            s3 = storage.fallback_s3.is_some(),
            dropbox = storage.fallback_dropbox_token.is_some(),
            "Storage: auto-detecting a deployment provider for unconfigured firms"
        ),
    }

    let state = AppState::new(db, jwt_service, storage, config.storage.max_upload_bytes);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
