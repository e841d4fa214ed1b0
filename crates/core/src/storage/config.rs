//! Storage configuration records and provider credentials.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clientdesk_shared::storage::StorageSettingsRequest;

use super::error::StorageError;

/// Region used for S3 configurations that do not name one.
pub const DEFAULT_S3_REGION: &str = "ap-northeast-1";

/// Provider named by a configuration row.
///
/// Parsing is case-insensitive and accepts common synonyms, so the
/// rest of the layer only ever sees these four values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Dropbox HTTP API.
    Dropbox,
    /// Google Cloud Storage.
    Gcs,
    /// AWS S3 or an S3-compatible service.
    S3,
    /// Local disk. Development only.
    Local,
}

impl ProviderKind {
    /// Parses a provider name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigurationInvalid` for an unrecognized name.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dropbox" => Ok(Self::Dropbox),
            "gcs" | "google" | "google_cloud_storage" | "google-cloud-storage" => Ok(Self::Gcs),
            "s3" | "aws" | "aws_s3" | "s3_compatible" | "s3-compatible" | "r2" | "wasabi"
            | "backblaze" => Ok(Self::S3),
            "local" | "local_disk" | "fs" => Ok(Self::Local),
            _ => Err(StorageError::invalid(format!(
                "unknown storage provider '{}'",
                raw.trim()
            ))),
        }
    }

    /// Canonical name, used in stored rows, logs and error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dropbox => "dropbox",
            Self::Gcs => "gcs",
            Self::S3 => "s3",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Lifecycle of a configuration row. Rows are deactivated, never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatus {
    /// The row in use for its owner.
    Active,
    /// A superseded or disconnected row kept for history.
    Inactive,
}

impl ConfigStatus {
    /// Stored status name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Parses a stored status. Anything but `active` is inactive.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("active") {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

/// A persisted storage configuration row.
#[derive(Clone)]
pub struct StorageConfig {
    /// Row ID.
    pub id: i64,
    /// Tenant that owns the row.
    pub owner_id: i64,
    /// Provider name as stored, possibly a synonym.
    pub provider: String,
    /// Dropbox access token.
    pub access_token: Option<String>,
    /// Bucket (GCS, S3).
    pub bucket_name: Option<String>,
    /// Service account key JSON (GCS).
    pub service_account_json: Option<String>,
    /// Region (S3).
    pub region: Option<String>,
    /// Endpoint for S3-compatible services.
    pub endpoint: Option<String>,
    /// Access key ID (S3).
    pub access_key_id: Option<String>,
    /// Secret access key (S3).
    pub secret_access_key: Option<String>,
    /// Row status.
    pub status: ConfigStatus,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("id", &self.id)
            .field("owner_id", &self.owner_id)
            .field("provider", &self.provider)
            .field("access_token", &hidden(self.access_token.as_deref()))
            .field("bucket_name", &self.bucket_name)
            .field("service_account_json", &hidden(self.service_account_json.as_deref()))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &hidden(self.secret_access_key.as_deref()))
            .field("status", &self.status)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl StorageConfig {
    /// Provider of this row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigurationInvalid` for an unrecognized provider.
    pub fn provider_kind(&self) -> Result<ProviderKind, StorageError> {
        ProviderKind::parse(&self.provider)
    }

    /// Dropbox token, if set.
    #[must_use]
    pub fn dropbox_token(&self) -> Option<&str> {
        non_blank(self.access_token.as_deref())
    }

    /// GCS credentials from this row.
    #[must_use]
    pub fn gcs_credentials(&self) -> GcsCredentials {
        GcsCredentials {
            bucket: non_blank(self.bucket_name.as_deref()).map(String::from),
            service_account_json: non_blank(self.service_account_json.as_deref())
                .map(String::from),
        }
    }

    /// S3 credentials from this row.
    #[must_use]
    pub fn s3_credentials(&self) -> S3Credentials {
        S3Credentials {
            bucket: non_blank(self.bucket_name.as_deref()).map(String::from),
            region: non_blank(self.region.as_deref())
                .unwrap_or(DEFAULT_S3_REGION)
                .to_string(),
            endpoint: non_blank(self.endpoint.as_deref()).map(String::from),
            access_key_id: non_blank(self.access_key_id.as_deref()).map(String::from),
            secret_access_key: non_blank(self.secret_access_key.as_deref()).map(String::from),
        }
    }
}

/// Google Cloud Storage credentials. Either field may be absent.
#[derive(Clone, Default)]
pub struct GcsCredentials {
    /// Bucket name.
    pub bucket: Option<String>,
    /// Service account key JSON.
    pub service_account_json: Option<String>,
}

impl fmt::Debug for GcsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsCredentials")
            .field("bucket", &self.bucket)
            .field("service_account_json", &hidden(self.service_account_json.as_deref()))
            .finish()
    }
}

/// S3-compatible credentials.
///
/// Keys may be absent, in which case the ambient AWS credential chain is used.
#[derive(Clone)]
pub struct S3Credentials {
    /// Bucket name.
    pub bucket: Option<String>,
    /// Region.
    pub region: String,
    /// Custom endpoint.
    pub endpoint: Option<String>,
    /// Access key ID.
    pub access_key_id: Option<String>,
    /// Secret access key.
    pub secret_access_key: Option<String>,
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &hidden(self.secret_access_key.as_deref()))
            .finish()
    }
}

impl From<&clientdesk_shared::config::S3Settings> for S3Credentials {
    fn from(s: &clientdesk_shared::config::S3Settings) -> Self {
        Self {
            bucket: non_blank(Some(&s.bucket)).map(String::from),
            region: non_blank(Some(&s.region))
                .unwrap_or(DEFAULT_S3_REGION)
                .to_string(),
            endpoint: non_blank(s.endpoint.as_deref()).map(String::from),
            access_key_id: non_blank(s.access_key_id.as_deref()).map(String::from),
            secret_access_key: non_blank(s.secret_access_key.as_deref()).map(String::from),
        }
    }
}

/// A validated configuration about to be activated for a tenant.
#[derive(Clone, PartialEq, Eq)]
pub struct NewStorageConfig {
    /// Tenant that will own the row.
    pub owner_id: i64,
    /// Provider.
    pub provider: ProviderKind,
    /// Dropbox access token.
    pub access_token: Option<String>,
    /// Bucket (GCS, S3).
    pub bucket_name: Option<String>,
    /// Service account key JSON (GCS).
    pub service_account_json: Option<String>,
    /// Region (S3).
    pub region: Option<String>,
    /// Endpoint (S3).
    pub endpoint: Option<String>,
    /// Access key ID (S3).
    pub access_key_id: Option<String>,
    /// Secret access key (S3).
    pub secret_access_key: Option<String>,
}

impl fmt::Debug for NewStorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewStorageConfig")
            .field("owner_id", &self.owner_id)
            .field("provider", &self.provider)
            .field("access_token", &hidden(self.access_token.as_deref()))
            .field("bucket_name", &self.bucket_name)
            .field("service_account_json", &hidden(self.service_account_json.as_deref()))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &hidden(self.secret_access_key.as_deref()))
            .finish()
    }
}

impl NewStorageConfig {
    /// Validates a settings submission and keeps only the fields its provider uses.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigurationInvalid` if the provider is unknown
    /// or a required credential is missing or malformed.
    pub fn from_request(owner_id: i64, req: &StorageSettingsRequest) -> Result<Self, StorageError> {
        let provider = ProviderKind::parse(&req.provider)?;
        let owned = |v: &Option<String>| non_blank(v.as_deref()).map(String::from);

        let mut config = Self {
            owner_id,
            provider,
            access_token: None,
            bucket_name: None,
            service_account_json: None,
            region: None,
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
        };

        match provider {
            ProviderKind::Dropbox => {
                config.access_token = Some(
                    owned(&req.access_token)
                        .ok_or_else(|| StorageError::invalid("Dropbox requires an access token"))?,
                );
            }
            ProviderKind::Gcs => {
                config.bucket_name = Some(
                    owned(&req.bucket_name)
                        .ok_or_else(|| StorageError::invalid("GCS requires a bucket name"))?,
                );
                let key = owned(&req.service_account_json).ok_or_else(|| {
                    StorageError::invalid("GCS requires a service account key (JSON)")
                })?;
                validate_service_account_json(&key)?;
                config.service_account_json = Some(key);
            }
            ProviderKind::S3 => {
                config.bucket_name = Some(
                    owned(&req.bucket_name)
                        .ok_or_else(|| StorageError::invalid("S3 requires a bucket name"))?,
                );
                config.region = owned(&req.region);
                config.endpoint = owned(&req.endpoint);
                config.access_key_id = owned(&req.access_key_id);
                config.secret_access_key = owned(&req.secret_access_key);
                if config.access_key_id.is_some() != config.secret_access_key.is_some() {
                    return Err(StorageError::invalid(
                        "S3 access key ID and secret access key must be given together",
                    ));
                }
            }
            ProviderKind::Local => {}
        }

        Ok(config)
    }
}

/// Checks that a service account key is a JSON object.
///
/// # Errors
///
/// Returns `StorageError::ConfigurationInvalid` otherwise.
pub fn validate_service_account_json(raw: &str) -> Result<(), StorageError> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        Ok(_) => Err(StorageError::invalid(
            "service account key must be a JSON object",
        )),
        Err(e) => Err(StorageError::invalid(format!(
            "service account key is not valid JSON: {e}"
        ))),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Stand-in printed by `Debug` for a secret that is set.
pub(crate) fn hidden(secret: Option<&str>) -> Option<&'static str> {
    secret.map(|_| "[hidden]")
}
