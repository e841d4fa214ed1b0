//! Storage settings routes.
//!
//! Every firm connects its own provider. Credentials are never echoed back:
//! tokens are shortened and secrets replaced with a marker.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use tracing::info;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};
use clientdesk_core::storage::NewStorageConfig;
use clientdesk_db::{StorageConfigRepository, entities::storage_configs};
use clientdesk_shared::storage::{
    StorageSettingsRequest, StorageSettingsView, StorageStatusResponse, mask_secret, mask_token,
};

/// Creates the storage settings routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/storage/settings",
            get(get_settings).put(put_settings).delete(disconnect),
        )
        .route("/storage/settings/history", get(history))
}

fn view(row: &storage_configs::Model) -> StorageSettingsView {
    StorageSettingsView {
        id: row.id,
        provider: row.provider.clone(),
        status: row.status.clone(),
        access_token: row
            .access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(mask_token),
        bucket_name: row.bucket_name.clone(),
        service_account_json: mask_secret(row.service_account_json.as_deref()),
        region: row.region.clone(),
        endpoint: row.endpoint.clone(),
        secret_access_key: mask_secret(row.secret_access_key.as_deref()),
        updated_at: row.updated_at.to_rfc3339(),
    }
}

fn status_of(row: Option<&storage_configs::Model>) -> StorageStatusResponse {
    StorageStatusResponse {
        is_connected: row.is_some(),
        settings: row.map(view),
    }
}

/// GET /storage/settings
async fn get_settings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<StorageStatusResponse>> {
    let active = StorageConfigRepository::new((*state.db).clone())
        .active(auth.tenant_id())
        .await?;
    Ok(Json(status_of(active.as_ref())))
}

/// PUT /storage/settings - replaces the active configuration.
async fn put_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<StorageSettingsRequest>,
) -> ApiResult<Json<StorageStatusResponse>> {
    auth.require_storage_admin()?;

    let config = NewStorageConfig::from_request(auth.tenant_id(), &payload)
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let row = StorageConfigRepository::new((*state.db).clone())
        .activate(&config)
        .await?;

    info!(
        tenant_id = auth.tenant_id(),
        user_id = auth.user_id(),
        provider = %config.provider,
        "Storage settings updated"
    );
    Ok(Json(status_of(Some(&row))))
}

/// DELETE /storage/settings - deactivates every configuration of the firm.
async fn disconnect(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    auth.require_storage_admin()?;

    StorageConfigRepository::new((*state.db).clone())
        .deactivate_all(auth.tenant_id())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /storage/settings/history - all rows, newest first.
async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<StorageSettingsView>>> {
    auth.require_storage_admin()?;

    let rows = StorageConfigRepository::new((*state.db).clone())
        .history(auth.tenant_id())
        .await?;
    Ok(Json(rows.iter().map(view).collect()))
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    const SETTINGS: &str = "/api/v1/storage/settings";

    #[tokio::test]
    async fn test_connect_dropbox_masks_token() {
        let app = TestApp::new().await;

        let (status, body) = app
            .call(
                "PUT",
                SETTINGS,
                Some(&app.admin_token),
                Some(json!({ "provider": " Dropbox ", "access_token": "sl.ABCDEFGHIJKLMNOP1234" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["is_connected"], true);
        assert_eq!(body["settings"]["provider"], "dropbox");
        assert_eq!(body["settings"]["access_token"], "sl.ABC...1234");

        let (status, body) = app.call("GET", SETTINGS, Some(&app.staff_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["settings"]["access_token"], "sl.ABC...1234");
        assert!(!body.to_string().contains("DEFGHIJKLMNOP"));
    }

    #[tokio::test]
    async fn test_replace_keeps_history() {
        let app = TestApp::new().await;

        app.call(
            "PUT",
            SETTINGS,
            Some(&app.admin_token),
            Some(json!({ "provider": "dropbox", "access_token": "tok" })),
        )
        .await;
        let (status, _) = app
            .call(
                "PUT",
                SETTINGS,
                Some(&app.admin_token),
                Some(json!({
                    "provider": "r2",
                    "bucket_name": "firm-files",
                    "endpoint": "https://acct.r2.cloudflarestorage.com",
                    "access_key_id": "AKIA",
                    "secret_access_key": "very-secret"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .call("GET", &format!("{SETTINGS}/history"), Some(&app.admin_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["provider"], "s3");
        assert_eq!(rows[0]["status"], "active");
        assert_eq!(rows[0]["secret_access_key"], "(configured)");
        assert_eq!(rows[1]["provider"], "dropbox");
        assert_eq!(rows[1]["status"], "inactive");
        assert_eq!(rows[1]["access_token"], "(configured)");
    }

    #[tokio::test]
    async fn test_disconnect() {
        let app = TestApp::new().await;
        app.connect_local_storage().await;

        let (status, _) = app.call("DELETE", SETTINGS, Some(&app.admin_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = app.call("GET", SETTINGS, Some(&app.admin_token), None).await;
        assert_eq!(body["is_connected"], false);
        assert!(body.get("settings").is_none());
    }

    #[tokio::test]
    async fn test_staff_cannot_change_settings() {
        let app = TestApp::new().await;

        let (status, _) = app
            .call(
                "PUT",
                SETTINGS,
                Some(&app.staff_token),
                Some(json!({ "provider": "local" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call("GET", &format!("{SETTINGS}/history"), Some(&app.staff_token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalid_submissions_rejected() {
        let app = TestApp::new().await;

        for payload in [
            json!({ "provider": "ftp" }),
            json!({ "provider": "dropbox" }),
            json!({ "provider": "gcs", "bucket_name": "b", "service_account_json": "not json" }),
        ] {
            let (status, body) = app
                .call("PUT", SETTINGS, Some(&app.admin_token), Some(payload))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        }

        let (_, body) = app.call("GET", SETTINGS, Some(&app.admin_token), None).await;
        assert_eq!(body["is_connected"], false);
    }
}
