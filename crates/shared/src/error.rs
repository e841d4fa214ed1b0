//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The tenant has no usable storage provider.
    #[error("Storage not configured: {0}")]
    StorageNotConfigured(String),

    /// The tenant's storage provider is configured but unusable.
    #[error("Storage misconfigured: {0}")]
    StorageMisconfigured(String),

    /// An upstream provider rejected or failed the request.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) | Self::StorageNotConfigured(_) | Self::StorageMisconfigured(_) => {
                409
            }
            Self::ExternalService(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::StorageNotConfigured(_) => "storage_not_configured",
            Self::StorageMisconfigured(_) => "storage_misconfigured",
            Self::ExternalService(_) => "storage_upload_failed",
            Self::Database(_) => "database_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to API clients.
    ///
    /// Database and internal details stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "An error occurred".to_string(),
            Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Conflict(msg)
            | Self::StorageNotConfigured(msg)
            | Self::StorageMisconfigured(msg)
            | Self::ExternalService(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Unauthorized(String::new()), 401, "unauthorized")]
    #[case(AppError::Forbidden(String::new()), 403, "forbidden")]
    #[case(AppError::NotFound(String::new()), 404, "not_found")]
    #[case(AppError::Validation(String::new()), 400, "validation_error")]
    #[case(AppError::Conflict(String::new()), 409, "conflict")]
    #[case(AppError::StorageNotConfigured(String::new()), 409, "storage_not_configured")]
    #[case(AppError::StorageMisconfigured(String::new()), 409, "storage_misconfigured")]
    #[case(AppError::ExternalService(String::new()), 502, "storage_upload_failed")]
    #[case(AppError::Database(String::new()), 500, "database_error")]
    #[case(AppError::Internal(String::new()), 500, "internal_error")]
    fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound("client 7".into()).to_string(),
            "Not found: client 7"
        );
        assert_eq!(
            AppError::StorageNotConfigured("connect Dropbox".into()).to_string(),
            "Storage not configured: connect Dropbox"
        );
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::Database("relation \"clients\" does not exist".into());
        assert_eq!(err.public_message(), "An error occurred");

        let err = AppError::Validation("name is required".into());
        assert_eq!(err.public_message(), "name is required");
    }
}
