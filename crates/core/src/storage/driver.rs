//! The closed set of storage drivers and their shared contract.

use bytes::Bytes;
use serde::Serialize;

use super::config::ProviderKind;
use super::dropbox::DropboxDriver;
use super::error::StorageError;
use super::local::LocalDriver;
use super::naming::UploadScope;
use super::object::ObjectStorageDriver;

/// One file to store.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// File contents.
    pub data: Bytes,
    /// Filename as submitted by the user.
    pub filename: String,
    /// MIME type, if known.
    pub content_type: Option<String>,
    /// Tenant and client the file belongs to.
    pub scope: UploadScope,
}

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    /// Retrievable URL (relative for local disk).
    pub url: String,
    /// Provider-side key or path, needed to delete the object later.
    pub key: String,
    /// Provider that holds the object.
    #[serde(serialize_with = "serialize_provider")]
    pub provider: ProviderKind,
    /// Configuration row the driver was built from. Drivers leave it empty;
    /// the facade fills it in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<i64>,
}

fn serialize_provider<S: serde::Serializer>(p: &ProviderKind, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(p.as_str())
}

/// Flat outcome of one upload, for callers that report rather than propagate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// Whether the file was stored.
    pub success: bool,
    /// URL on success.
    pub url: Option<String>,
    /// Key on success.
    pub key: Option<String>,
    /// Human-readable cause on failure.
    pub error: Option<String>,
}

impl From<Result<StoredObject, StorageError>> for UploadResult {
    fn from(result: Result<StoredObject, StorageError>) -> Self {
        match result {
            Ok(stored) => Self {
                success: true,
                url: Some(stored.url),
                key: Some(stored.key),
                error: None,
            },
            Err(e) => Self {
                success: false,
                url: None,
                key: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Client handle of a driver, or the reason it could not be built.
///
/// Constructors never fail; they produce `Disabled` instead.
#[derive(Debug, Clone)]
pub(crate) enum DriverState<T> {
    Ready(T),
    Disabled(String),
}

impl<T> DriverState<T> {
    pub(crate) fn disabled(reason: impl Into<String>) -> Self {
        Self::Disabled(reason.into())
    }

    pub(crate) const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub(crate) fn reason(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Disabled(reason) => Some(reason),
        }
    }

    /// The client, or `ProviderInitFailed` if the driver is disabled.
    pub(crate) fn client(&self, provider: ProviderKind) -> Result<&T, StorageError> {
        match self {
            Self::Ready(client) => Ok(client),
            Self::Disabled(reason) => Err(StorageError::ProviderInitFailed {
                provider: provider.as_str(),
                reason: reason.clone(),
            }),
        }
    }
}

/// A storage backend selected for one tenant.
#[derive(Debug, Clone)]
pub enum StorageDriver {
    /// Dropbox.
    Dropbox(DropboxDriver),
    /// S3-compatible or Google Cloud Storage.
    ObjectStorage(ObjectStorageDriver),
    /// Local disk. Not durable, not externally reachable.
    Local(LocalDriver),
}

impl StorageDriver {
    /// Provider behind this driver.
    #[must_use]
    pub const fn provider(&self) -> ProviderKind {
        match self {
            Self::Dropbox(_) => ProviderKind::Dropbox,
            Self::ObjectStorage(d) => d.provider(),
            Self::Local(_) => ProviderKind::Local,
        }
    }

    /// Whether credentials were present and the client initialized.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        match self {
            Self::Dropbox(d) => d.is_enabled(),
            Self::ObjectStorage(d) => d.is_enabled(),
            Self::Local(d) => d.is_enabled(),
        }
    }

    /// Why the driver is disabled, if it is.
    #[must_use]
    pub fn disabled_reason(&self) -> Option<&str> {
        match self {
            Self::Dropbox(d) => d.disabled_reason(),
            Self::ObjectStorage(d) => d.disabled_reason(),
            Self::Local(d) => d.disabled_reason(),
        }
    }

    /// Whether returned URLs are durable and externally reachable.
    #[must_use]
    pub const fn is_durable(&self) -> bool {
        !matches!(self, Self::Local(_))
    }

    /// Stores one file and returns its URL and key.
    ///
    /// # Errors
    ///
    /// Returns `ProviderInitFailed` if the driver is disabled, otherwise
    /// `UploadFailed` or `ShareLinkFailed` with the provider's cause.
    pub async fn upload(&self, req: &UploadRequest) -> Result<StoredObject, StorageError> {
        match self {
            Self::Dropbox(d) => d.upload(req).await,
            Self::ObjectStorage(d) => d.upload(req).await,
            Self::Local(d) => d.upload(req).await,
        }
    }

    /// Removes a previously stored object.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key does not exist, `DeleteFailed` otherwise.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::Dropbox(d) => d.delete(key).await,
            Self::ObjectStorage(d) => d.delete(key).await,
            Self::Local(d) => d.delete(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_result_from_success() {
        let result: UploadResult = Ok(StoredObject {
            url: "/uploads/tenant-1/shared/2026-10/a.txt".into(),
            key: "tenant-1/shared/2026-10/a.txt".into(),
            provider: ProviderKind::Local,
            config_id: Some(3),
        })
        .into();

        assert!(result.success);
        assert_eq!(result.key.as_deref(), Some("tenant-1/shared/2026-10/a.txt"));
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_upload_result_from_failure() {
        let result: UploadResult =
            Err(StorageError::upload_failed("gcs", "403 Forbidden")).into();

        assert!(!result.success);
        assert_eq!(result.url, None);
        assert_eq!(
            result.error.as_deref(),
            Some("upload to gcs failed: 403 Forbidden")
        );
    }

    #[test]
    fn test_disabled_state_reports_init_failure() {
        let state: DriverState<()> = DriverState::disabled("no access token");

        assert!(!state.is_ready());
        assert_eq!(state.reason(), Some("no access token"));
        assert!(matches!(
            state.client(ProviderKind::Dropbox),
            Err(StorageError::ProviderInitFailed { provider: "dropbox", .. })
        ));
    }
}
