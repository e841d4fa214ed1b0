//! Per-client chat routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use tracing::info;
use validator::Validate;

use crate::{AppState, error::ApiResult, middleware::AuthUser, routes::clients::load_client};
use clientdesk_db::{MessageRepository, entities::messages};
use clientdesk_shared::clients::{LimitQuery, PostMessageRequest};

/// Messages returned when no limit is given.
const DEFAULT_LIMIT: u64 = 20;

/// Creates the chat routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/clients/{id}/messages",
        get(list_messages).post(post_message),
    )
}

/// GET /clients/{id}/messages?limit - latest messages, oldest first.
async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<messages::Model>>> {
    let client = load_client(&state, &auth, id).await?;
    let rows = MessageRepository::new((*state.db).clone())
        .latest(client.id, query.resolve(DEFAULT_LIMIT))
        .await?;
    Ok(Json(rows))
}

/// POST /clients/{id}/messages - post as the caller.
async fn post_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<PostMessageRequest>,
) -> ApiResult<(StatusCode, Json<messages::Model>)> {
    payload.validate()?;
    let client = load_client(&state, &auth, id).await?;

    let message = MessageRepository::new((*state.db).clone())
        .create(client.id, auth.name(), payload.message.trim())
        .await?;

    info!(client_id = id, message_id = message.id, "Message posted");
    Ok((StatusCode::CREATED, Json(message)))
}
