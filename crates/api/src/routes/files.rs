//! Client file routes: multipart upload through the tenant's storage provider.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use bytes::Bytes;
use tracing::{error, info, warn};

use crate::{
    AppState, Storage,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    routes::clients::load_client,
};
use clientdesk_core::storage::{
    FALLBACK_FILENAME, LOCAL_URL_PREFIX, ProviderKind, ResolvedDriver, StorageError,
};
use clientdesk_db::{ClientRepository, FileRepository, entities::files, repositories::NewFileRecord};
use clientdesk_shared::clients::LimitQuery;

/// Files returned when no limit is given.
const DEFAULT_LIMIT: u64 = 20;

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

/// Served when a record carries no MIME type.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Creates the file routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients/{id}/files", get(list_files).post(upload_file))
        .route("/clients/{id}/files/{file_id}", delete(delete_file))
}

/// Creates the route serving local-disk uploads at their returned URLs.
pub fn local_routes() -> Router<AppState> {
    Router::new().route(&format!("{LOCAL_URL_PREFIX}/{{*key}}"), get(serve_local_file))
}

struct IncomingFile {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

async fn read_file_field(mut multipart: Multipart) -> ApiResult<IncomingFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(FALLBACK_FILENAME)
            .to_string();
        let content_type = field.content_type().map(String::from);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;

        return Ok(IncomingFile {
            filename,
            content_type,
            data,
        });
    }

    Err(ApiError::validation(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}

/// Deletes a record's object through the tenant's current driver.
///
/// Nothing is deleted when the tenant has no usable provider, or when the
/// object was stored under a configuration other than the active one.
async fn delete_stored_object(
    storage: &Storage,
    tenant_id: i64,
    record: &files::Model,
) -> Result<(), StorageError> {
    let ResolvedDriver { driver, config_id } = match storage.resolve(tenant_id).await {
        Ok(resolved) => resolved,
        Err(
            e @ (StorageError::ConfigurationMissing(_) | StorageError::ConfigurationInvalid(_)),
        ) => {
            warn!(file_id = record.id, error = %e, "No usable storage; keeping stored object");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if driver.provider().as_str() != record.provider || config_id != record.storage_config_id {
        warn!(
            file_id = record.id,
            stored_with = %record.provider,
            stored_config = ?record.storage_config_id,
            connected = %driver.provider(),
            connected_config = ?config_id,
            "File was stored under another storage configuration; removing record only"
        );
        return Ok(());
    }

    match driver.delete(&record.storage_key).await {
        Ok(()) | Err(StorageError::NotFound(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Best-effort removal of stored objects whose records are already gone.
pub(crate) async fn remove_stored_objects(
    state: &AppState,
    tenant_id: i64,
    records: &[files::Model],
) {
    for record in records {
        if let Err(e) = delete_stored_object(&state.storage, tenant_id, record).await {
            warn!(
                file_id = record.id,
                key = %record.storage_key,
                error = %e,
                "Failed to delete stored object"
            );
        }
    }
}

/// GET /clients/{id}/files?limit
async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<files::Model>>> {
    let client = load_client(&state, &auth, id).await?;
    let rows = FileRepository::new((*state.db).clone())
        .latest(client.id, query.resolve(DEFAULT_LIMIT))
        .await?;
    Ok(Json(rows))
}

/// POST /clients/{id}/files
///
/// A record is written only after the provider accepted the bytes.
async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<files::Model>)> {
    let client = load_client(&state, &auth, id).await?;
    let file = read_file_field(multipart).await?;
    if file.data.is_empty() {
        return Err(ApiError::validation("uploaded file is empty"));
    }

    let size_bytes = i64::try_from(file.data.len()).unwrap_or(i64::MAX);
    let stored = state
        .storage
        .upload(
            auth.tenant_id(),
            file.data,
            &file.filename,
            Some(client.id),
            file.content_type.as_deref(),
        )
        .await
        .inspect_err(|e| {
            error!(client_id = id, filename = %file.filename, error = %e, "Upload failed");
        })?;

    let record = NewFileRecord {
        client_id: client.id,
        filename: file.filename,
        file_url: stored.url.clone(),
        storage_key: stored.key.clone(),
        provider: stored.provider.as_str().to_string(),
        storage_config_id: stored.config_id,
        content_type: file.content_type,
        size_bytes,
        uploader: auth.name().to_string(),
    };

    let saved = match FileRepository::new((*state.db).clone()).create(record).await {
        Ok(saved) => saved,
        Err(e) => {
            // Do not leave an object nobody can find.
            if let Err(cleanup) = state.storage.delete_file(auth.tenant_id(), &stored.key).await {
                warn!(key = %stored.key, error = %cleanup, "Failed to remove orphaned object");
            }
            return Err(e.into());
        }
    };

    info!(
        client_id = id,
        file_id = saved.id,
        provider = %saved.provider,
        size_bytes,
        "File uploaded"
    );
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /uploads/{*key}
///
/// Serves a local-disk object to members of the tenant whose client owns it.
async fn serve_local_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    let record = FileRepository::new((*state.db).clone())
        .find_by_storage_key(ProviderKind::Local.as_str(), &key)
        .await?
        .ok_or_else(|| ApiError::not_found("file"))?;
    ClientRepository::new((*state.db).clone())
        .find(auth.tenant_id(), record.client_id)
        .await?
        .ok_or_else(|| ApiError::not_found("file"))?;

    let data = state.storage.read_local(auth.tenant_id(), &key).await?;
    let content_type = record
        .content_type
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        data,
    )
        .into_response())
}

/// DELETE /clients/{id}/files/{file_id}
async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, file_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let client = load_client(&state, &auth, id).await?;
    let repo = FileRepository::new((*state.db).clone());
    let record = repo
        .find(client.id, file_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("file {file_id}")))?;

    delete_stored_object(&state.storage, auth.tenant_id(), &record).await?;
    repo.delete(record.id).await?;

    info!(client_id = id, file_id, user_id = auth.user_id(), "File deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_upload_to_local_storage() {
        let app = TestApp::new().await;
        app.connect_local_storage().await;
        let id = app.create_client("Uploader").await;
        let uri = format!("/api/v1/clients/{id}/files");

        let (status, body) = app
            .upload(&uri, &app.staff_token, "report.pdf", b"hello")
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["provider"], "local");
        assert_eq!(body["filename"], "report.pdf");
        assert_eq!(body["size_bytes"], 5);
        assert_eq!(body["uploader"], "Staff Ono");

        let key = body["storage_key"].as_str().unwrap();
        assert!(key.starts_with(&format!("tenant-{}/client-{id}/", app.tenant_id)));
        assert!(key.ends_with("_report.pdf"));
        assert_eq!(body["file_url"], format!("/uploads/{key}"));
        let on_disk = app.upload_root.path().join(key);
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"hello");

        let (status, list) = app.call("GET", &uri, Some(&app.staff_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let file_id = body["id"].as_i64().unwrap();
        let (status, _) = app
            .call("DELETE", &format!("{uri}/{file_id}"), Some(&app.staff_token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!on_disk.exists());

        let (_, list) = app.call("GET", &uri, Some(&app.staff_token), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_url_is_served_to_tenant_members() {
        let app = TestApp::new().await;
        app.connect_local_storage().await;
        let id = app.create_client("Served").await;

        let (_, body) = app
            .upload(
                &format!("/api/v1/clients/{id}/files"),
                &app.staff_token,
                "notes.txt",
                b"served bytes",
            )
            .await;
        let url = body["file_url"].as_str().unwrap();

        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .uri(url)
                    .header(AUTHORIZATION, format!("Bearer {}", app.staff_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"served bytes");
    }

    #[tokio::test]
    async fn test_local_url_requires_token() {
        let app = TestApp::new().await;
        app.connect_local_storage().await;
        let id = app.create_client("Private").await;
        let (_, body) = app
            .upload(
                &format!("/api/v1/clients/{id}/files"),
                &app.staff_token,
                "tax.pdf",
                b"confidential",
            )
            .await;

        let (status, body) = app
            .call("GET", body["file_url"].as_str().unwrap(), None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_token");
    }

    #[tokio::test]
    async fn test_local_url_hidden_from_other_tenant() {
        let app = TestApp::new().await;
        app.connect_local_storage().await;
        let id = app.create_client("Private").await;
        let (_, body) = app
            .upload(
                &format!("/api/v1/clients/{id}/files"),
                &app.staff_token,
                "tax.pdf",
                b"confidential",
            )
            .await;

        let outsider = app
            .state
            .jwt_service
            .generate_access_token(99, app.tenant_id + 1, "Outsider", "tenant_admin")
            .unwrap();
        let (status, body) = app
            .call("GET", body["file_url"].as_str().unwrap(), Some(&outsider), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = app
            .call("GET", "/uploads/tenant-1/client-1/2026-10/missing.pdf", Some(&app.staff_token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_after_switching_config_keeps_object() {
        let app = TestApp::new().await;
        app.connect_local_storage().await;
        let id = app.create_client("Switcher").await;
        let uri = format!("/api/v1/clients/{id}/files");

        let (_, body) = app
            .upload(&uri, &app.staff_token, "old.pdf", b"old store")
            .await;
        assert!(body["storage_config_id"].is_i64());
        let on_disk = app
            .upload_root
            .path()
            .join(body["storage_key"].as_str().unwrap());

        // Same provider kind, different configuration row.
        app.connect_local_storage().await;

        let file_id = body["id"].as_i64().unwrap();
        let (status, _) = app
            .call("DELETE", &format!("{uri}/{file_id}"), Some(&app.staff_token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(on_disk.exists());

        let (_, list) = app.call("GET", &uri, Some(&app.staff_token), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_storage_creates_no_record() {
        let app = TestApp::new().await;
        let id = app.create_client("Unconfigured").await;
        let uri = format!("/api/v1/clients/{id}/files");

        let (status, body) = app
            .upload(&uri, &app.staff_token, "report.pdf", b"hello")
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "storage_not_configured");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("connect Dropbox or Google Cloud Storage")
        );

        let (_, list) = app.call("GET", &uri, Some(&app.staff_token), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_name_twice_gets_distinct_keys() {
        let app = TestApp::new().await;
        app.connect_local_storage().await;
        let id = app.create_client("Twice").await;
        let uri = format!("/api/v1/clients/{id}/files");

        let (_, first) = app.upload(&uri, &app.staff_token, "scan.png", b"a").await;
        let (_, second) = app.upload(&uri, &app.staff_token, "scan.png", b"b").await;

        assert_ne!(first["storage_key"], second["storage_key"]);
        assert_ne!(first["file_url"], second["file_url"]);
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let app = TestApp::new().await;
        app.connect_local_storage().await;
        let id = app.create_client("Empty").await;

        let (status, _) = app
            .upload(
                &format!("/api/v1/clients/{id}/files"),
                &app.staff_token,
                "empty.txt",
                b"",
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_client_removes_stored_objects() {
        let app = TestApp::new().await;
        app.connect_local_storage().await;
        let id = app.create_client("Leaving").await;

        let (_, body) = app
            .upload(
                &format!("/api/v1/clients/{id}/files"),
                &app.staff_token,
                "contract.pdf",
                b"signed",
            )
            .await;
        let on_disk = app
            .upload_root
            .path()
            .join(body["storage_key"].as_str().unwrap());
        assert!(on_disk.exists());

        let (status, _) = app
            .call("DELETE", &format!("/api/v1/clients/{id}"), Some(&app.admin_token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!on_disk.exists());
    }
}
