//! Storage error types.

use clientdesk_shared::AppError;
use thiserror::Error;

/// Storage resolution and provider errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No active configuration and no fallback available.
    #[error("storage is not configured: {0}")]
    ConfigurationMissing(String),

    /// Unrecognized provider or malformed credentials.
    #[error("invalid storage configuration: {0}")]
    ConfigurationInvalid(String),

    /// Provider client could not be constructed.
    #[error("{provider} client could not be initialized: {reason}")]
    ProviderInitFailed {
        /// Provider name.
        provider: &'static str,
        /// Why initialization failed.
        reason: String,
    },

    /// Transfer to the provider failed.
    #[error("upload to {provider} failed: {cause}")]
    UploadFailed {
        /// Provider name.
        provider: &'static str,
        /// Underlying cause.
        cause: String,
    },

    /// No share link could be created or reused.
    #[error("could not obtain a share link: {0}")]
    ShareLinkFailed(String),

    /// Removing an object failed.
    #[error("delete from {provider} failed: {cause}")]
    DeleteFailed {
        /// Provider name.
        provider: &'static str,
        /// Underlying cause.
        cause: String,
    },

    /// Reading an object back failed.
    #[error("read from {provider} failed: {cause}")]
    ReadFailed {
        /// Provider name.
        provider: &'static str,
        /// Underlying cause.
        cause: String,
    },

    /// Object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The configuration store itself failed (missing table, lost connection).
    #[error("storage configuration store unavailable: {0}")]
    ConfigStore(String),
}

impl StorageError {
    /// Create a configuration missing error.
    #[must_use]
    pub fn missing(msg: impl Into<String>) -> Self {
        Self::ConfigurationMissing(msg.into())
    }

    /// Create a configuration invalid error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(msg.into())
    }

    /// Create an upload failed error.
    #[must_use]
    pub fn upload_failed(provider: &'static str, cause: impl ToString) -> Self {
        Self::UploadFailed {
            provider,
            cause: cause.to_string(),
        }
    }

    /// Create a delete failed error.
    #[must_use]
    pub fn delete_failed(provider: &'static str, cause: impl ToString) -> Self {
        Self::DeleteFailed {
            provider,
            cause: cause.to_string(),
        }
    }

    /// Create a read failed error.
    #[must_use]
    pub fn read_failed(provider: &'static str, cause: impl ToString) -> Self {
        Self::ReadFailed {
            provider,
            cause: cause.to_string(),
        }
    }

    /// Create a config store error.
    #[must_use]
    pub fn config_store(cause: impl ToString) -> Self {
        Self::ConfigStore(cause.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigurationMissing(_) => Self::StorageNotConfigured(err.to_string()),
            StorageError::ConfigurationInvalid(_) | StorageError::ProviderInitFailed { .. } => {
                Self::StorageMisconfigured(err.to_string())
            }
            StorageError::UploadFailed { .. }
            | StorageError::ShareLinkFailed(_)
            | StorageError::DeleteFailed { .. } => Self::ExternalService(err.to_string()),
            StorageError::NotFound(key) => Self::NotFound(format!("stored object {key}")),
            StorageError::ReadFailed { .. } => Self::Internal(err.to_string()),
            StorageError::ConfigStore(_) => Self::Database(err.to_string()),
        }
    }
}
