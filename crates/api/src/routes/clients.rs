//! Client record routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    routes::files::remove_stored_objects,
};
use clientdesk_db::{
    ClientRepository, CompanyRepository, FileRepository,
    entities::{clients, company_infos},
};
use clientdesk_shared::clients::{CreateClientRequest, UpdateClientRequest};

/// Creates the client routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{id}",
            get(get_client).patch(update_client).delete(delete_client),
        )
}

/// A client with its company information.
#[derive(Debug, Serialize)]
pub struct ClientDetail {
    /// Client record.
    #[serde(flatten)]
    pub client: clients::Model,
    /// Company information, if recorded.
    pub company: Option<company_infos::Model>,
}

/// Loads a client of the caller's tenant or fails with 404.
pub(crate) async fn load_client(
    state: &AppState,
    auth: &AuthUser,
    id: i64,
) -> ApiResult<clients::Model> {
    ClientRepository::new((*state.db).clone())
        .find(auth.tenant_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("client {id}")))
}

/// GET /clients
async fn list_clients(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<clients::Model>>> {
    let rows = ClientRepository::new((*state.db).clone())
        .list(auth.tenant_id())
        .await?;
    Ok(Json(rows))
}

/// POST /clients
async fn create_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<clients::Model>)> {
    payload.validate()?;

    let client = ClientRepository::new((*state.db).clone())
        .create(auth.tenant_id(), &payload)
        .await?;

    info!(
        client_id = client.id,
        tenant_id = client.tenant_id,
        user_id = auth.user_id(),
        "Client created"
    );
    Ok((StatusCode::CREATED, Json(client)))
}

/// GET /clients/{id}
async fn get_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ClientDetail>> {
    let client = load_client(&state, &auth, id).await?;
    let company = CompanyRepository::new((*state.db).clone())
        .find(client.id)
        .await?;
    Ok(Json(ClientDetail { client, company }))
}

/// PATCH /clients/{id}
async fn update_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateClientRequest>,
) -> ApiResult<Json<clients::Model>> {
    payload.validate()?;

    let client = ClientRepository::new((*state.db).clone())
        .update(auth.tenant_id(), id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("client {id}")))?;

    info!(client_id = id, user_id = auth.user_id(), "Client updated");
    Ok(Json(client))
}

/// DELETE /clients/{id}
///
/// The rows go first, with the client. Stored objects are removed afterwards,
/// best effort, so a failed delete never leaves records without objects.
async fn delete_client(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    auth.require_client_admin()?;
    let client = load_client(&state, &auth, id).await?;

    let files = FileRepository::new((*state.db).clone())
        .all_for_client(client.id)
        .await?;

    ClientRepository::new((*state.db).clone())
        .delete(auth.tenant_id(), client.id)
        .await?;
    remove_stored_objects(&state, auth.tenant_id(), &files).await;

    info!(
        client_id = id,
        user_id = auth.user_id(),
        files = files.len(),
        "Client deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
