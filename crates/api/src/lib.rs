//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for clients, company info, chat, files and storage settings
//! - Authentication middleware
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

#[cfg(test)]
mod test_support;

use axum::{Router, extract::DefaultBodyLimit};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use clientdesk_core::storage::StorageFacade;
use clientdesk_db::StorageConfigRepository;
use clientdesk_shared::JwtService;

/// Storage facade backed by the database configuration resolver.
pub type Storage = StorageFacade<StorageConfigRepository>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Per-tenant storage resolution.
    pub storage: Arc<Storage>,
    /// Largest accepted request body for uploads.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Builds the state, wiring the storage facade to the same database.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        options: clientdesk_core::storage::FacadeOptions,
        max_upload_bytes: usize,
    ) -> Self {
        let resolver = Arc::new(StorageConfigRepository::new(db.clone()));
        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            storage: Arc::new(StorageFacade::new(resolver, options)),
            max_upload_bytes,
        }
    }
}

/// Creates the main application router.
///
/// Files written by the local-disk driver are served under `/uploads` to
/// authenticated members of the owning tenant.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .merge(routes::local_upload_routes_with_state(state.clone()))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
