//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod auth;
pub mod clients;
pub mod company;
pub mod files;
pub mod health;
pub mod messages;
pub mod storage;

/// Creates the API router; everything except health and login requires a token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(clients::routes())
        .merge(company::routes())
        .merge(messages::routes())
        .merge(files::routes())
        .merge(storage::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

/// Creates the authenticated router for local-disk upload URLs.
#[allow(clippy::needless_pass_by_value)]
pub fn local_upload_routes_with_state(state: AppState) -> Router<AppState> {
    files::local_routes().layer(middleware::from_fn_with_state(state, auth_middleware))
}
