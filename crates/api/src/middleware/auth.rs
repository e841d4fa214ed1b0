//! Authentication middleware for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use clientdesk_core::auth::UserRole;
use clientdesk_shared::{Claims, JwtError};
use serde_json::json;

use crate::{AppState, error::ApiError};

fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Validates the bearer token and stores its claims in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "missing_token",
                "message": "Authorization header with Bearer token is required"
            })),
        )
            .into_response();
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            let (error, message) = match e {
                JwtError::Expired => ("token_expired", "Token has expired"),
                _ => ("invalid_token", "Invalid or malformed token"),
            };

            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": error, "message": message })),
            )
                .into_response()
        }
    }
}

/// Extractor for authenticated user claims.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let tenant = auth.tenant_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.0.user_id()
    }

    /// Returns the tenant every query of this request is scoped to.
    #[must_use]
    pub const fn tenant_id(&self) -> i64 {
        self.0.tenant_id()
    }

    /// Display name of the caller.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Parsed role; unknown role names grant nothing.
    #[must_use]
    pub fn role(&self) -> Option<UserRole> {
        UserRole::parse(&self.0.role)
    }

    /// Fails unless the caller may change storage settings.
    pub fn require_storage_admin(&self) -> Result<(), ApiError> {
        if self.role().is_some_and(|r| r.can_manage_storage()) {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "Only firm administrators can manage storage settings",
            ))
        }
    }

    /// Fails unless the caller may delete clients.
    pub fn require_client_admin(&self) -> Result<(), ApiError> {
        if self.role().is_some_and(|r| r.can_delete_clients()) {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "Only firm administrators can delete clients",
            ))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "unauthorized",
                        "message": "Authentication required"
                    })),
                )
            })
    }
}
