//! Storage settings payloads and credential masking.

use serde::{Deserialize, Serialize};

/// Placeholder shown instead of a secret that is set.
pub const CONFIGURED: &str = "(configured)";

/// Storage settings submitted by a tenant admin.
///
/// Which credential fields are required depends on `provider`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettingsRequest {
    /// Provider name (`dropbox`, `gcs`, `s3`, `local`, or a synonym).
    pub provider: String,
    /// Dropbox access token.
    pub access_token: Option<String>,
    /// Bucket name (GCS and S3).
    pub bucket_name: Option<String>,
    /// Service account key JSON (GCS).
    pub service_account_json: Option<String>,
    /// Region (S3).
    pub region: Option<String>,
    /// Custom endpoint (S3-compatible services).
    pub endpoint: Option<String>,
    /// Access key ID (S3).
    pub access_key_id: Option<String>,
    /// Secret access key (S3).
    pub secret_access_key: Option<String>,
}

/// Masked view of one storage configuration row.
#[derive(Debug, Clone, Serialize)]
pub struct StorageSettingsView {
    /// Row ID.
    pub id: i64,
    /// Provider name as stored.
    pub provider: String,
    /// `active` or `inactive`.
    pub status: String,
    /// Masked Dropbox token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Bucket name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    /// Marker for a stored service account key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_json: Option<String>,
    /// Region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Marker for stored S3 keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    /// Last update (RFC 3339).
    pub updated_at: String,
}

/// Response for the current storage settings.
#[derive(Debug, Clone, Serialize)]
pub struct StorageStatusResponse {
    /// Whether the tenant has an active configuration.
    pub is_connected: bool,
    /// The active configuration, masked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<StorageSettingsView>,
}

/// Masks a bearer token for display: `abcdef...wxyz`.
///
/// Tokens of ten characters or fewer reveal nothing.
#[must_use]
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        CONFIGURED.to_string()
    }
}

/// Replaces a present, non-empty secret with the configured marker.
#[must_use]
pub fn mask_secret(secret: Option<&str>) -> Option<String> {
    secret
        .filter(|s| !s.trim().is_empty())
        .map(|_| CONFIGURED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_long_token() {
        assert_eq!(mask_token("sl.ABCDEFGHIJKLMNOP1234"), "sl.ABC...1234");
    }

    #[test]
    fn test_mask_short_token() {
        assert_eq!(mask_token("tok"), CONFIGURED);
        assert_eq!(mask_token("0123456789"), CONFIGURED);
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(Some("{}")), Some(CONFIGURED.to_string()));
        assert_eq!(mask_secret(Some("  ")), None);
        assert_eq!(mask_secret(None), None);
    }
}
