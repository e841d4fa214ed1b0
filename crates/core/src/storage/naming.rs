//! Stored object names and scope-keyed paths.
//!
//! Every driver lays objects out the same way:
//!
//! ```text
//! tenant-{owner}/client-{client}/{YYYY-MM}/{YYYYmmdd_HHMMSS}_{token}_{safe name}
//! tenant-{owner}/shared/{YYYY-MM}/...                      (no client)
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Name used when nothing of the original filename survives sanitizing.
pub const FALLBACK_FILENAME: &str = "uploaded";

/// Who an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadScope {
    /// Tenant.
    pub owner_id: i64,
    /// Client the file is attached to, if any.
    pub client_id: Option<i64>,
}

impl UploadScope {
    /// Scope for a client's file.
    #[must_use]
    pub const fn client(owner_id: i64, client_id: i64) -> Self {
        Self {
            owner_id,
            client_id: Some(client_id),
        }
    }

    /// Scope for a tenant-wide file.
    #[must_use]
    pub const fn tenant(owner_id: i64) -> Self {
        Self {
            owner_id,
            client_id: None,
        }
    }

    /// Top-level directory holding every object of a tenant.
    #[must_use]
    pub fn tenant_prefix(owner_id: i64) -> String {
        format!("tenant-{owner_id}")
    }

    /// Directory prefix for this scope and month, without a trailing slash.
    #[must_use]
    pub fn prefix(&self, now: DateTime<Utc>) -> String {
        let tenant = Self::tenant_prefix(self.owner_id);
        let month = now.format("%Y-%m");
        match self.client_id {
            Some(client) => format!("{tenant}/client-{client}/{month}"),
            None => format!("{tenant}/shared/{month}"),
        }
    }

    /// Full object key for a new upload of `original_filename`.
    #[must_use]
    pub fn object_key(&self, original_filename: &str, now: DateTime<Utc>) -> String {
        format!("{}/{}", self.prefix(now), stored_name(original_filename, now))
    }
}

/// Collision-resistant stored name: `{timestamp}_{random token}_{safe name}`.
#[must_use]
pub fn stored_name(original_filename: &str, now: DateTime<Utc>) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        now.format("%Y%m%d_%H%M%S"),
        &token[..8],
        sanitize_filename(original_filename)
    )
}

/// Reduces a client-supplied filename to `[A-Za-z0-9._-]`.
///
/// Directory components are dropped, whitespace becomes `_`, other ASCII
/// punctuation becomes `_`, non-ASCII characters are removed, and leading
/// or trailing dots and underscores are trimmed so the result can never be
/// a hidden file or a relative path.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let cleaned: String = base
        .chars()
        .filter(char::is_ascii)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}
