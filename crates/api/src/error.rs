//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clientdesk_core::storage::StorageError;
use clientdesk_shared::AppError;
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An [`AppError`] rendered as `{ "error": code, "message": text }`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 404 with a message naming the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self(AppError::NotFound(what.into()))
    }

    /// 403 with an explanation.
    pub fn forbidden(why: impl Into<String>) -> Self {
        Self(AppError::Forbidden(why.into()))
    }

    /// 400 with an explanation.
    pub fn validation(why: impl Into<String>) -> Self {
        Self(AppError::Validation(why.into()))
    }

    /// Status code of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(err.into())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                errs.iter()
                    .find_map(|e| e.message.as_ref().map(ToString::to_string))
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
            .collect();
        fields.sort();
        Self(AppError::Validation(fields.join("; ")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.public_message(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientdesk_shared::clients::CreateClientRequest;
    use http_body_util::BodyExt;
    use validator::Validate;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_storage_missing_is_conflict() {
        let err: ApiError = StorageError::missing("connect Dropbox").into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "storage_not_configured");
        assert!(body["message"].as_str().unwrap().contains("connect Dropbox"));
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let err: ApiError = DbErr::Custom("no such table: clients".into()).into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "database_error");
        assert_eq!(body["message"], "An error occurred");
    }

    #[tokio::test]
    async fn test_validation_errors_are_listed() {
        let req = CreateClientRequest {
            client_type: "corporation".into(),
            name: String::new(),
            email: None,
            phone: None,
            notes: None,
        };
        let err: ApiError = req.validate().unwrap_err().into();
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "name must be 1-255 characters");
    }
}
