//! In-process harness for route tests: migrated in-memory SQLite, a temporary
//! upload root and tokens for one firm admin and one staff member.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE},
};
use clientdesk_core::auth::{UserRole, hash_password};
use clientdesk_core::storage::{FacadeOptions, NewStorageConfig, ProviderKind};
use clientdesk_db::migration::{Migrator, MigratorTrait};
use clientdesk_db::{StorageConfigRepository, TenantRepository, UserRepository};
use clientdesk_shared::{JwtConfig, JwtService};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use tower::ServiceExt;

use crate::{AppState, create_router};

pub const PASSWORD: &str = "correct horse battery staple";
pub const ADMIN_EMAIL: &str = "admin@firm.example";
const BOUNDARY: &str = "clientdesk-test-boundary";

pub struct TestApp {
    pub state: AppState,
    pub tenant_id: i64,
    pub admin_token: String,
    pub staff_token: String,
    pub upload_root: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options)
            .await
            .expect("Failed to open in-memory database");
        Migrator::up(&db, None).await.expect("Failed to run migrations");

        let upload_root = tempfile::tempdir().expect("temp dir");
        let options = FacadeOptions {
            local_root: upload_root.path().to_path_buf(),
            ..FacadeOptions::default()
        };
        let jwt = JwtService::new(JwtConfig {
            secret: "route-test-secret".to_string(),
            access_token_expires_minutes: 15,
        });
        let state = AppState::new(db, jwt, options, 1024 * 1024);

        let tenant_id = TenantRepository::new((*state.db).clone())
            .create("Sakura Tax Office")
            .await
            .expect("tenant")
            .id;

        let users = UserRepository::new((*state.db).clone());
        let hash = hash_password(PASSWORD).expect("hash");
        let admin = users
            .create(tenant_id, ADMIN_EMAIL, &hash, "Admin Ito", UserRole::TenantAdmin)
            .await
            .expect("admin");
        let staff = users
            .create(tenant_id, "staff@firm.example", &hash, "Staff Ono", UserRole::Staff)
            .await
            .expect("staff");

        let admin_token = state
            .jwt_service
            .generate_access_token(admin.id, tenant_id, &admin.display_name, &admin.role)
            .expect("token");
        let staff_token = state
            .jwt_service
            .generate_access_token(staff.id, tenant_id, &staff.display_name, &staff.role)
            .expect("token");

        Self {
            state,
            tenant_id,
            admin_token,
            staff_token,
            upload_root,
        }
    }

    /// Connects the tenant to local-disk storage.
    pub async fn connect_local_storage(&self) {
        StorageConfigRepository::new((*self.state.db).clone())
            .activate(&NewStorageConfig {
                owner_id: self.tenant_id,
                provider: ProviderKind::Local,
                access_token: None,
                bucket_name: None,
                service_account_json: None,
                region: None,
                endpoint: None,
                access_key_id: None,
                secret_access_key: None,
            })
            .await
            .expect("activate local storage");
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        filename: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    /// Creates a client through the API and returns its ID.
    pub async fn create_client(&self, name: &str) -> i64 {
        let (status, body) = self
            .call(
                "POST",
                "/api/v1/clients",
                Some(&self.staff_token),
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("client id")
    }
}
