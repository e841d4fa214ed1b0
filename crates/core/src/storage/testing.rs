//! In-memory Dropbox and configuration stand-ins shared by the storage tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use super::config::{ConfigStatus, StorageConfig};
use super::dropbox::{DropboxApi, DropboxApiError, DropboxConnector};
use super::error::StorageError;
use super::resolver::StorageConfigResolver;

#[derive(Debug, Default)]
pub(crate) struct FakeDropbox {
    files: Mutex<HashMap<String, Bytes>>,
    links_created: AtomicUsize,
    existing_links: bool,
    link_failure: bool,
    upload_failure: bool,
    rejected_token: bool,
}

impl FakeDropbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every path already has a link, so creation is refused.
    pub(crate) fn with_existing_links(mut self) -> Self {
        self.existing_links = true;
        self
    }

    /// Creation is refused and no link can be listed.
    pub(crate) fn with_link_failure(mut self) -> Self {
        self.link_failure = true;
        self
    }

    pub(crate) fn with_upload_failure(mut self) -> Self {
        self.upload_failure = true;
        self
    }

    pub(crate) fn with_rejected_token(mut self) -> Self {
        self.rejected_token = true;
        self
    }

    pub(crate) fn file(&self, path: &str) -> Option<Bytes> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub(crate) fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    fn file_name(path: &str) -> &str {
        path.rsplit('/').next().unwrap_or(path)
    }
}

#[async_trait]
impl DropboxApi for FakeDropbox {
    async fn upload(&self, path: &str, data: Bytes) -> Result<(), DropboxApiError> {
        if self.upload_failure {
            return Err(DropboxApiError::Api {
                status: 507,
                summary: "insufficient_space/".into(),
            });
        }
        self.files.lock().unwrap().insert(path.to_string(), data);
        Ok(())
    }

    async fn create_shared_link(&self, path: &str) -> Result<String, DropboxApiError> {
        if self.existing_links || self.link_failure {
            return Err(DropboxApiError::SharedLinkExists);
        }
        let n = self.links_created.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "https://www.dropbox.com/scl/fi/new{n}/{}?rlkey=fake&dl=0",
            Self::file_name(path)
        ))
    }

    async fn list_shared_links(&self, path: &str) -> Result<Vec<String>, DropboxApiError> {
        if self.link_failure {
            return Ok(Vec::new());
        }
        Ok(vec![format!(
            "https://www.dropbox.com/scl/fi/existing/{}?rlkey=fake&dl=0",
            Self::file_name(path)
        )])
    }

    async fn delete(&self, path: &str) -> Result<(), DropboxApiError> {
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| DropboxApiError::NotFound("path_lookup/not_found/".into()))
    }

    async fn current_account(&self) -> Result<(), DropboxApiError> {
        if self.rejected_token {
            Err(DropboxApiError::Unauthorized("invalid_access_token/".into()))
        } else {
            Ok(())
        }
    }
}

/// Hands out one shared fake and records the tokens it was asked for.
pub(crate) struct FakeDropboxConnector {
    api: Arc<FakeDropbox>,
    tokens: Mutex<Vec<String>>,
}

impl FakeDropboxConnector {
    /// Token for which `connect` fails.
    pub(crate) const BROKEN_TOKEN: &'static str = "broken";

    pub(crate) fn new(api: FakeDropbox) -> Self {
        Self {
            api: Arc::new(api),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn api(&self) -> Arc<FakeDropbox> {
        Arc::clone(&self.api)
    }

    pub(crate) fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

impl DropboxConnector for FakeDropboxConnector {
    fn connect(&self, access_token: &str) -> Result<Arc<dyn DropboxApi>, DropboxApiError> {
        self.tokens.lock().unwrap().push(access_token.to_string());
        if access_token == Self::BROKEN_TOKEN {
            return Err(DropboxApiError::Transport("tls backend unavailable".into()));
        }
        Ok(self.api.clone())
    }
}

/// Resolver backed by a fixed map of rows.
#[derive(Debug, Default)]
pub(crate) struct StaticResolver {
    configs: HashMap<i64, StorageConfig>,
    broken: bool,
}

impl StaticResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, config: StorageConfig) -> Self {
        self.configs.insert(config.owner_id, config);
        self
    }

    /// Every lookup fails as if the table were missing.
    pub(crate) fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }
}

impl StorageConfigResolver for StaticResolver {
    async fn active_config(
        &self,
        owner_id: i64,
    ) -> Result<Option<StorageConfig>, StorageError> {
        if self.broken {
            return Err(StorageError::config_store(
                "no such table: storage_configs",
            ));
        }
        Ok(self.configs.get(&owner_id).cloned())
    }
}

/// An active row for `owner_id` with no credentials filled in.
pub(crate) fn config_row(owner_id: i64, provider: &str) -> StorageConfig {
    StorageConfig {
        id: owner_id * 10,
        owner_id,
        provider: provider.to_string(),
        access_token: None,
        bucket_name: None,
        service_account_json: None,
        region: None,
        endpoint: None,
        access_key_id: None,
        secret_access_key: None,
        status: ConfigStatus::Active,
        updated_at: Utc::now(),
    }
}
