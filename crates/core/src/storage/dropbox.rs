//! Dropbox driver over the Dropbox HTTP API v2.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::config::ProviderKind;
use super::driver::{DriverState, StoredObject, UploadRequest};
use super::error::StorageError;

const API_BASE: &str = "https://api.dropboxapi.com/2";
const CONTENT_BASE: &str = "https://content.dropboxapi.com/2";

/// Errors returned by a Dropbox API client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DropboxApiError {
    /// A share link already exists for the path.
    #[error("shared link already exists")]
    SharedLinkExists,

    /// The path does not exist.
    #[error("path not found: {0}")]
    NotFound(String),

    /// The token was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other API error.
    #[error("dropbox returned {status}: {summary}")]
    Api {
        /// HTTP status.
        status: u16,
        /// `error_summary` from the response, or the raw body.
        summary: String,
    },

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(String),
}

impl DropboxApiError {
    /// Classifies an error response by status and `error_summary`.
    #[must_use]
    pub fn from_response(status: u16, summary: String) -> Self {
        match status {
            401 => Self::Unauthorized(summary),
            409 if summary.starts_with("shared_link_already_exists") => Self::SharedLinkExists,
            409 if summary.contains("not_found") => Self::NotFound(summary),
            _ => Self::Api { status, summary },
        }
    }
}

/// The subset of the Dropbox API the driver needs.
#[async_trait]
pub trait DropboxApi: Send + Sync {
    /// Uploads bytes to an absolute path. Never overwrites.
    async fn upload(&self, path: &str, data: Bytes) -> Result<(), DropboxApiError>;

    /// Creates a public share link for a path.
    async fn create_shared_link(&self, path: &str) -> Result<String, DropboxApiError>;

    /// Lists share links that point directly at a path.
    async fn list_shared_links(&self, path: &str) -> Result<Vec<String>, DropboxApiError>;

    /// Deletes a path.
    async fn delete(&self, path: &str) -> Result<(), DropboxApiError>;

    /// Fetches the token owner's account, proving the token works.
    async fn current_account(&self) -> Result<(), DropboxApiError>;
}

/// Builds API clients from access tokens.
pub trait DropboxConnector: Send + Sync {
    /// Creates a client for one token.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    fn connect(&self, access_token: &str) -> Result<Arc<dyn DropboxApi>, DropboxApiError>;
}

/// Connector producing [`DropboxHttpClient`]s with a per-request timeout.
#[derive(Debug, Clone, Copy)]
pub struct HttpDropboxConnector {
    timeout: Duration,
}

impl HttpDropboxConnector {
    /// Creates a connector.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl DropboxConnector for HttpDropboxConnector {
    fn connect(&self, access_token: &str) -> Result<Arc<dyn DropboxApi>, DropboxApiError> {
        Ok(Arc::new(DropboxHttpClient::new(access_token, self.timeout)?))
    }
}

/// Dropbox API client over `reqwest`.
#[derive(Clone)]
pub struct DropboxHttpClient {
    http: Client,
    token: String,
}

impl fmt::Debug for DropboxHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxHttpClient")
            .field("token", &"[hidden]")
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error_summary: String,
}

#[derive(Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Deserialize)]
struct SharedLinkList {
    links: Vec<SharedLink>,
}

#[derive(Deserialize)]
struct Account {
    account_id: String,
}

#[derive(Deserialize)]
struct Ignored {}

impl DropboxHttpClient {
    /// Creates a client whose every request times out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `DropboxApiError::Transport` if the HTTP client cannot be built.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Result<Self, DropboxApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DropboxApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            token: access_token.into(),
        })
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        arg: &serde_json::Value,
    ) -> Result<T, DropboxApiError> {
        debug!(endpoint, "calling Dropbox API");

        let response = self
            .http
            .post(format!("{API_BASE}/{endpoint}"))
            .bearer_auth(&self.token)
            .json(arg)
            .send()
            .await
            .map_err(|e| DropboxApiError::Transport(e.to_string()))?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, DropboxApiError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| DropboxApiError::Transport(format!("unexpected response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        let summary = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error_summary)
            .unwrap_or(body);
        Err(DropboxApiError::from_response(status.as_u16(), summary))
    }
}

#[async_trait]
impl DropboxApi for DropboxHttpClient {
    async fn upload(&self, path: &str, data: Bytes) -> Result<(), DropboxApiError> {
        let arg = json!({ "path": path, "mode": "add", "autorename": false, "mute": true });

        let response = self
            .http
            .post(format!("{CONTENT_BASE}/files/upload"))
            .bearer_auth(&self.token)
            .header("Dropbox-API-Arg", arg.to_string())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| DropboxApiError::Transport(e.to_string()))?;

        Self::parse::<Ignored>(response).await.map(|_| ())
    }

    async fn create_shared_link(&self, path: &str) -> Result<String, DropboxApiError> {
        let link: SharedLink = self
            .rpc(
                "sharing/create_shared_link_with_settings",
                &json!({ "path": path }),
            )
            .await?;
        Ok(link.url)
    }

    async fn list_shared_links(&self, path: &str) -> Result<Vec<String>, DropboxApiError> {
        let list: SharedLinkList = self
            .rpc(
                "sharing/list_shared_links",
                &json!({ "path": path, "direct_only": true }),
            )
            .await?;
        Ok(list.links.into_iter().map(|l| l.url).collect())
    }

    async fn delete(&self, path: &str) -> Result<(), DropboxApiError> {
        self.rpc::<Ignored>("files/delete_v2", &json!({ "path": path }))
            .await
            .map(|_| ())
    }

    async fn current_account(&self) -> Result<(), DropboxApiError> {
        let account: Account = self
            .rpc("users/get_current_account", &serde_json::Value::Null)
            .await?;
        debug!(account_id = %account.account_id, "Dropbox token verified");
        Ok(())
    }
}

/// Stores files in a tenant's Dropbox and returns direct-download links.
#[derive(Clone)]
pub struct DropboxDriver {
    state: DriverState<Arc<dyn DropboxApi>>,
}

impl fmt::Debug for DropboxDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxDriver")
            .field("enabled", &self.is_enabled())
            .field("disabled_reason", &self.disabled_reason())
            .finish()
    }
}

impl DropboxDriver {
    /// Builds a driver for a token. A missing token or a client that cannot
    /// be built yields a disabled driver.
    #[must_use]
    pub fn connect(connector: &dyn DropboxConnector, access_token: Option<&str>) -> Self {
        let Some(token) = access_token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Self {
                state: DriverState::disabled("no Dropbox access token configured"),
            };
        };

        match connector.connect(token) {
            Ok(api) => Self::from_api(api),
            Err(e) => {
                warn!(error = %e, "Dropbox client initialization failed");
                Self {
                    state: DriverState::disabled(e.to_string()),
                }
            }
        }
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn from_api(api: Arc<dyn DropboxApi>) -> Self {
        Self {
            state: DriverState::Ready(api),
        }
    }

    /// Whether a client is available.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.state.is_ready()
    }

    /// Why the driver is disabled.
    #[must_use]
    pub fn disabled_reason(&self) -> Option<&str> {
        self.state.reason()
    }

    /// Checks the token against the account endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ProviderInitFailed` if the driver is disabled or the token is rejected.
    pub async fn verify(&self) -> Result<(), StorageError> {
        let api = self.state.client(ProviderKind::Dropbox)?;
        api.current_account()
            .await
            .map_err(|e| StorageError::ProviderInitFailed {
                provider: ProviderKind::Dropbox.as_str(),
                reason: e.to_string(),
            })
    }

    /// Uploads a file and returns a direct-download link to it.
    ///
    /// # Errors
    ///
    /// Returns `UploadFailed` if the transfer fails and `ShareLinkFailed` if
    /// no link could be created or reused. In the latter case the uploaded
    /// file is removed again.
    pub async fn upload(&self, req: &UploadRequest) -> Result<StoredObject, StorageError> {
        let api = self.state.client(ProviderKind::Dropbox)?;
        let path = format!("/{}", req.scope.object_key(&req.filename, Utc::now()));

        api.upload(&path, req.data.clone()).await.map_err(|e| {
            error!(path = %path, error = %e, "Dropbox upload failed");
            StorageError::upload_failed(ProviderKind::Dropbox.as_str(), e)
        })?;

        let link = match share_link(api.as_ref(), &path).await {
            Ok(link) => link,
            Err(e) => {
                // No record will point at the object, so it must not stay behind.
                if let Err(cleanup) = api.delete(&path).await {
                    warn!(path = %path, error = %cleanup, "Failed to remove unlinked Dropbox upload");
                }
                return Err(e);
            }
        };
        info!(path = %path, bytes = req.data.len(), "Stored file in Dropbox");

        Ok(StoredObject {
            url: direct_download_url(&link),
            key: path,
            provider: ProviderKind::Dropbox,
            config_id: None,
        })
    }

    /// Deletes a file by its Dropbox path.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the path does not exist, `DeleteFailed` otherwise.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let api = self.state.client(ProviderKind::Dropbox)?;
        api.delete(key).await.map_err(|e| match e {
            DropboxApiError::NotFound(_) => StorageError::NotFound(key.to_string()),
            other => StorageError::delete_failed(ProviderKind::Dropbox.as_str(), other),
        })
    }
}

/// Creates a share link, reusing an existing one if creation is refused.
async fn share_link(api: &dyn DropboxApi, path: &str) -> Result<String, StorageError> {
    let create_err = match api.create_shared_link(path).await {
        Ok(url) => return Ok(url),
        Err(e) => e,
    };
    debug!(path, error = %create_err, "creating share link failed, looking for an existing one");

    match api.list_shared_links(path).await {
        Ok(links) => links.into_iter().next().ok_or_else(|| {
            StorageError::ShareLinkFailed(format!("{create_err}; no existing link for {path}"))
        }),
        Err(list_err) => Err(StorageError::ShareLinkFailed(format!(
            "{create_err}; listing existing links failed: {list_err}"
        ))),
    }
}

/// Rewrites a share link so it serves the file bytes instead of a preview page.
///
/// Any `dl` or `raw` parameter is dropped and `raw=1` appended, keeping
/// other parameters such as `rlkey`. Strings that are not URLs are returned as is.
#[must_use]
pub fn direct_download_url(link: &str) -> String {
    let Ok(mut url) = Url::parse(link) else {
        return link.to_string();
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "dl" && k != "raw")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("raw", "1");
    url.to_string()
}
