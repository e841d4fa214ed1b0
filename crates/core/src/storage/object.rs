//! S3-compatible and Google Cloud Storage driver on Apache OpenDAL.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use opendal::layers::TimeoutLayer;
use opendal::{Builder, ErrorKind, Operator, services};
use tracing::{error, info, warn};

use super::config::{GcsCredentials, ProviderKind, S3Credentials, validate_service_account_json};
use super::driver::{DriverState, StoredObject, UploadRequest};
use super::error::StorageError;
use super::naming::sanitize_filename;

/// Public base URL of Google Cloud Storage.
pub const GCS_PUBLIC_BASE: &str = "https://storage.googleapis.com";

#[derive(Debug, Clone)]
struct ObjectClient {
    operator: Operator,
    url_base: String,
}

/// Driver for bucket-style object stores.
///
/// Object URLs are derived from the bucket, region or endpoint, and key,
/// so no request is made to learn them.
#[derive(Debug, Clone)]
pub struct ObjectStorageDriver {
    provider: ProviderKind,
    state: DriverState<ObjectClient>,
}

impl ObjectStorageDriver {
    /// Builds an S3-compatible driver. Missing bucket or a builder error
    /// yields a disabled driver.
    #[must_use]
    pub fn s3(creds: &S3Credentials, timeout: Duration) -> Self {
        let Some(bucket) = creds.bucket.as_deref() else {
            return Self::disabled(ProviderKind::S3, "no S3 bucket configured");
        };

        let mut builder = services::S3::default()
            .bucket(bucket)
            .region(&creds.region);
        if let Some(endpoint) = creds.endpoint.as_deref() {
            builder = builder.endpoint(endpoint);
        }
        if let (Some(key_id), Some(secret)) =
            (creds.access_key_id.as_deref(), creds.secret_access_key.as_deref())
        {
            builder = builder.access_key_id(key_id).secret_access_key(secret);
        }

        let url_base = s3_url_base(bucket, &creds.region, creds.endpoint.as_deref());
        Self::build(ProviderKind::S3, builder, url_base, timeout)
    }

    /// Builds a Google Cloud Storage driver from a bucket and service
    /// account key. Missing or malformed credentials yield a disabled driver.
    #[must_use]
    pub fn gcs(creds: &GcsCredentials, timeout: Duration) -> Self {
        let (Some(bucket), Some(key)) = (
            creds.bucket.as_deref(),
            creds.service_account_json.as_deref(),
        ) else {
            return Self::disabled(
                ProviderKind::Gcs,
                "GCS needs both a bucket name and a service account key",
            );
        };
        if let Err(e) = validate_service_account_json(key) {
            return Self::disabled(ProviderKind::Gcs, e.to_string());
        }

        let builder = services::Gcs::default()
            .bucket(bucket)
            .credential(&STANDARD.encode(key));

        Self::build(
            ProviderKind::Gcs,
            builder,
            format!("{GCS_PUBLIC_BASE}/{bucket}"),
            timeout,
        )
    }

    /// Wraps an already configured operator.
    ///
    /// `url_base` is prefixed to every key to form object URLs.
    #[must_use]
    pub fn from_operator(
        provider: ProviderKind,
        operator: Operator,
        url_base: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            state: DriverState::Ready(ObjectClient {
                operator,
                url_base: url_base.into().trim_end_matches('/').to_string(),
            }),
        }
    }

    fn build(
        provider: ProviderKind,
        builder: impl Builder,
        url_base: String,
        timeout: Duration,
    ) -> Self {
        match Operator::new(builder) {
            Ok(op) => {
                let operator = op
                    .layer(TimeoutLayer::new().with_timeout(timeout))
                    .finish();
                Self::from_operator(provider, operator, url_base)
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "object storage client initialization failed");
                Self::disabled(provider, e.to_string())
            }
        }
    }

    fn disabled(provider: ProviderKind, reason: impl Into<String>) -> Self {
        Self {
            provider,
            state: DriverState::disabled(reason),
        }
    }

    /// `S3` or `Gcs`.
    #[must_use]
    pub const fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Whether the client initialized.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.state.is_ready()
    }

    /// Why the driver is disabled.
    #[must_use]
    pub fn disabled_reason(&self) -> Option<&str> {
        self.state.reason()
    }

    /// Writes the object with its content type and returns its public URL.
    ///
    /// # Errors
    ///
    /// Returns `UploadFailed` if the write fails or times out.
    pub async fn upload(&self, req: &UploadRequest) -> Result<StoredObject, StorageError> {
        let client = self.state.client(self.provider)?;
        let key = req.scope.object_key(&req.filename, Utc::now());

        let capability = client.operator.info().full_capability();
        let mut write = client.operator.write_with(&key, req.data.clone());
        if let Some(content_type) = req.content_type.as_deref()
            && capability.write_with_content_type
        {
            write = write.content_type(content_type);
        }
        if capability.write_with_content_disposition {
            write = write.content_disposition(&format!(
                "inline; filename=\"{}\"",
                sanitize_filename(&req.filename)
            ));
        }

        write.await.map_err(|e| {
            error!(provider = %self.provider, key = %key, error = %e, "object upload failed");
            StorageError::upload_failed(self.provider.as_str(), e)
        })?;
        info!(provider = %self.provider, key = %key, bytes = req.data.len(), "Stored object");

        Ok(StoredObject {
            url: format!("{}/{key}", client.url_base),
            key,
            provider: self.provider,
            config_id: None,
        })
    }

    /// Deletes an object.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the object is absent, `DeleteFailed` otherwise.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let client = self.state.client(self.provider)?;

        match client.operator.stat(key).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => return Err(StorageError::delete_failed(self.provider.as_str(), e)),
        }

        client
            .operator
            .delete(key)
            .await
            .map_err(|e| StorageError::delete_failed(self.provider.as_str(), e))
    }
}

/// Base URL for objects in an S3 bucket.
///
/// A custom endpoint gives path-style `{endpoint}/{bucket}`, otherwise the
/// AWS virtual-hosted form is used.
#[must_use]
pub fn s3_url_base(bucket: &str, region: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{bucket}", endpoint.trim_end_matches('/')),
        None => format!("https://{bucket}.s3.{region}.amazonaws.com"),
    }
}
