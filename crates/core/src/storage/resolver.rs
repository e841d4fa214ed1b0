//! Lookup of a tenant's active storage configuration.

use std::future::Future;

use super::config::StorageConfig;
use super::error::StorageError;

/// Source of storage configuration rows.
///
/// Implemented by the database layer; the facade depends only on this trait.
pub trait StorageConfigResolver: Send + Sync {
    /// Returns the owner's active configuration, newest first if several
    /// rows are active.
    ///
    /// `Ok(None)` is the normal "nothing configured" outcome. An error means
    /// the store itself is unusable (missing table, lost connection) and is
    /// reported as `StorageError::ConfigStore`.
    fn active_config(
        &self,
        owner_id: i64,
    ) -> impl Future<Output = Result<Option<StorageConfig>, StorageError>> + Send;
}
