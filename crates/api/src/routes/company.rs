//! Company information routes for corporate clients.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::info;
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    routes::clients::load_client,
};
use clientdesk_db::{CompanyRepository, entities::company_infos};
use clientdesk_shared::clients::CompanyInfoRequest;

/// Creates the company info routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/clients/{id}/company",
        get(get_company).put(put_company).delete(delete_company),
    )
}

/// GET /clients/{id}/company
async fn get_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<company_infos::Model>> {
    let client = load_client(&state, &auth, id).await?;
    CompanyRepository::new((*state.db).clone())
        .find(client.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("company info for client {id}")))
}

/// PUT /clients/{id}/company
async fn put_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<CompanyInfoRequest>,
) -> ApiResult<Json<company_infos::Model>> {
    payload.validate()?;
    let client = load_client(&state, &auth, id).await?;

    let info = CompanyRepository::new((*state.db).clone())
        .upsert(client.id, &payload)
        .await?;

    info!(client_id = id, user_id = auth.user_id(), "Company info saved");
    Ok(Json(info))
}

/// DELETE /clients/{id}/company
async fn delete_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let client = load_client(&state, &auth, id).await?;

    if CompanyRepository::new((*state.db).clone())
        .delete(client.id)
        .await?
    {
        info!(client_id = id, user_id = auth.user_id(), "Company info removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("company info for client {id}")))
    }
}
