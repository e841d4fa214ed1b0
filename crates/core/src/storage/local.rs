//! Local-disk driver for development and single-machine installs.
//!
//! Returned URLs are paths relative to the web root (`/uploads/...`). They are
//! neither durable nor reachable from outside the host serving them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use opendal::layers::TimeoutLayer;
use opendal::{ErrorKind, Operator, services};
use tracing::{error, info, warn};

use super::config::ProviderKind;
use super::driver::{DriverState, StoredObject, UploadRequest};
use super::error::StorageError;

/// URL prefix under which the local upload root is served.
pub const LOCAL_URL_PREFIX: &str = "/uploads";

/// Writes files below a root directory, mirroring the scope-keyed layout.
#[derive(Debug, Clone)]
pub struct LocalDriver {
    root: PathBuf,
    state: DriverState<Operator>,
}

impl LocalDriver {
    /// Opens (creating if needed) the root directory. Failure yields a
    /// disabled driver.
    #[must_use]
    pub fn new(root: impl AsRef<Path>, timeout: Duration) -> Self {
        let root = root.as_ref().to_path_buf();
        let Some(root_str) = root.to_str() else {
            return Self {
                state: DriverState::disabled(format!(
                    "upload root {} is not valid UTF-8",
                    root.display()
                )),
                root,
            };
        };

        let state = match Operator::new(services::Fs::default().root(root_str)) {
            Ok(op) => DriverState::Ready(
                op.layer(TimeoutLayer::new().with_timeout(timeout))
                    .finish(),
            ),
            Err(e) => {
                warn!(root = %root.display(), error = %e, "local storage unavailable");
                DriverState::disabled(e.to_string())
            }
        };

        Self { root, state }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the root could be opened.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.state.is_ready()
    }

    /// Why the driver is disabled.
    #[must_use]
    pub fn disabled_reason(&self) -> Option<&str> {
        self.state.reason()
    }

    /// Writes the file. A failed write is aborted so no partial file remains.
    ///
    /// # Errors
    ///
    /// Returns `UploadFailed` if the file cannot be written.
    pub async fn upload(&self, req: &UploadRequest) -> Result<StoredObject, StorageError> {
        let operator = self.state.client(ProviderKind::Local)?;
        let key = req.scope.object_key(&req.filename, Utc::now());
        let fail = |e: opendal::Error| {
            error!(key = %key, error = %e, "local write failed");
            StorageError::upload_failed(ProviderKind::Local.as_str(), e)
        };

        let mut writer = operator.writer(&key).await.map_err(fail)?;
        if let Err(e) = writer.write(req.data.clone()).await {
            if let Err(abort_err) = writer.abort().await {
                warn!(key = %key, error = %abort_err, "aborting partial write failed");
            }
            return Err(fail(e));
        }
        writer.close().await.map_err(fail)?;

        info!(key = %key, bytes = req.data.len(), "Stored file on local disk");
        Ok(StoredObject {
            url: format!("{LOCAL_URL_PREFIX}/{key}"),
            key,
            provider: ProviderKind::Local,
            config_id: None,
        })
    }

    /// Reads a whole file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file is absent, `ReadFailed` otherwise.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        let operator = self.state.client(ProviderKind::Local)?;
        match operator.read(key).await {
            Ok(buffer) => Ok(buffer.to_bytes()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => {
                error!(key, error = %e, "local read failed");
                Err(StorageError::read_failed(ProviderKind::Local.as_str(), e))
            }
        }
    }

    /// Deletes a file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file is absent, `DeleteFailed` otherwise.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let operator = self.state.client(ProviderKind::Local)?;
        let delete_failed =
            |e: opendal::Error| StorageError::delete_failed(ProviderKind::Local.as_str(), e);

        match operator.stat(key).await {
            Ok(_) => operator.delete(key).await.map_err(delete_failed),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(delete_failed(e)),
        }
    }
}
