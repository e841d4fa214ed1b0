//! Per-tenant storage facade: resolve configuration, pick a driver, upload.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use clientdesk_shared::{FallbackPolicy, StorageSettings};
use tracing::{debug, info, warn};

use super::config::{ProviderKind, S3Credentials, StorageConfig, hidden};
use super::driver::{StorageDriver, StoredObject, UploadRequest, UploadResult};
use super::dropbox::{DropboxConnector, DropboxDriver, HttpDropboxConnector};
use super::error::StorageError;
use super::local::LocalDriver;
use super::naming::UploadScope;
use super::object::ObjectStorageDriver;
use super::resolver::StorageConfigResolver;

/// Message returned when a tenant has nothing configured under the strict policy.
pub const NOT_CONFIGURED_MESSAGE: &str = "no storage provider is connected for this firm; \
     a tenant admin must connect Dropbox or Google Cloud Storage in the storage settings";

/// Deployment-level knobs for the facade.
#[derive(Clone)]
pub struct FacadeOptions {
    /// What to do when a tenant has no active configuration.
    pub fallback: FallbackPolicy,
    /// Timeout for every provider call.
    pub timeout: Duration,
    /// Root directory for the local-disk driver.
    pub local_root: PathBuf,
    /// Deployment S3 bucket tried first by `auto_detect`.
    pub fallback_s3: Option<S3Credentials>,
    /// Deployment Dropbox token tried second by `auto_detect`.
    pub fallback_dropbox_token: Option<String>,
}

impl fmt::Debug for FacadeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacadeOptions")
            .field("fallback", &self.fallback)
            .field("timeout", &self.timeout)
            .field("local_root", &self.local_root)
            .field("fallback_s3", &self.fallback_s3)
            .field(
                "fallback_dropbox_token",
                &hidden(self.fallback_dropbox_token.as_deref()),
            )
            .finish()
    }
}

impl Default for FacadeOptions {
    fn default() -> Self {
        Self::from_settings(&StorageSettings::default())
    }
}

impl FacadeOptions {
    /// Options from the `storage` section of the application config.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self {
            fallback: settings.fallback_policy,
            timeout: Duration::from_secs(settings.request_timeout_secs),
            local_root: PathBuf::from(&settings.local_root),
            fallback_s3: settings.s3.as_ref().map(S3Credentials::from),
            fallback_dropbox_token: settings
                .dropbox_access_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
        }
    }
}

/// A driver together with the configuration row it was built from.
#[derive(Debug, Clone)]
pub struct ResolvedDriver {
    /// Selected driver.
    pub driver: StorageDriver,
    /// Active row that named the provider; `None` for a deployment fallback.
    pub config_id: Option<i64>,
}

/// Resolves each tenant's storage provider and brokers uploads to it.
///
/// One instance is built at startup and shared; it keeps no per-request state.
pub struct StorageFacade<R: StorageConfigResolver> {
    resolver: Arc<R>,
    options: FacadeOptions,
    dropbox: Arc<dyn DropboxConnector>,
}

impl<R: StorageConfigResolver> StorageFacade<R> {
    /// Creates a facade that talks to the real Dropbox API.
    #[must_use]
    pub fn new(resolver: Arc<R>, options: FacadeOptions) -> Self {
        let dropbox = Arc::new(HttpDropboxConnector::new(options.timeout));
        Self {
            resolver,
            options,
            dropbox,
        }
    }

    /// Replaces the Dropbox client factory.
    #[must_use]
    pub fn with_dropbox_connector(mut self, connector: Arc<dyn DropboxConnector>) -> Self {
        self.dropbox = connector;
        self
    }

    /// Deployment options.
    #[must_use]
    pub const fn options(&self) -> &FacadeOptions {
        &self.options
    }

    /// Selects the driver for a tenant.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve`].
    pub async fn adapter_for(&self, owner_id: i64) -> Result<StorageDriver, StorageError> {
        Ok(self.resolve(owner_id).await?.driver)
    }

    /// Selects the driver for a tenant and reports which row chose it.
    ///
    /// # Errors
    ///
    /// - `ConfigurationMissing` if nothing is configured and the strict policy
    ///   applies, or auto-detection found nothing usable
    /// - `ConfigurationInvalid` if the active row names an unknown provider or
    ///   its credentials cannot produce a working client
    /// - `ConfigStore` if the configuration lookup itself failed
    pub async fn resolve(&self, owner_id: i64) -> Result<ResolvedDriver, StorageError> {
        match self.resolver.active_config(owner_id).await? {
            Some(config) => Ok(ResolvedDriver {
                driver: self.driver_for(&config)?,
                config_id: Some(config.id),
            }),
            None => match self.options.fallback {
                FallbackPolicy::Strict => {
                    debug!(owner_id, "no active storage configuration");
                    Err(StorageError::missing(NOT_CONFIGURED_MESSAGE))
                }
                FallbackPolicy::AutoDetect => Ok(ResolvedDriver {
                    driver: self.auto_detect(owner_id).await?,
                    config_id: None,
                }),
            },
        }
    }

    /// Builds the driver named by a configuration row.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` for an unknown provider or a driver
    /// that could not initialize.
    pub fn driver_for(&self, config: &StorageConfig) -> Result<StorageDriver, StorageError> {
        let provider = config.provider_kind()?;
        let timeout = self.options.timeout;

        let driver = match provider {
            ProviderKind::Dropbox => StorageDriver::Dropbox(DropboxDriver::connect(
                self.dropbox.as_ref(),
                config.dropbox_token(),
            )),
            ProviderKind::Gcs => StorageDriver::ObjectStorage(ObjectStorageDriver::gcs(
                &config.gcs_credentials(),
                timeout,
            )),
            ProviderKind::S3 => StorageDriver::ObjectStorage(ObjectStorageDriver::s3(
                &config.s3_credentials(),
                timeout,
            )),
            ProviderKind::Local => {
                StorageDriver::Local(LocalDriver::new(&self.options.local_root, timeout))
            }
        };

        if let Some(reason) = driver.disabled_reason() {
            warn!(
                owner_id = config.owner_id,
                config_id = config.id,
                provider = %provider,
                reason,
                "configured storage provider is unusable"
            );
            return Err(StorageError::invalid(format!(
                "{provider} storage is configured but cannot be used: {reason}"
            )));
        }

        debug!(owner_id = config.owner_id, provider = %provider, "storage driver selected");
        Ok(driver)
    }

    /// Deployment S3, then deployment Dropbox, then local disk.
    async fn auto_detect(&self, owner_id: i64) -> Result<StorageDriver, StorageError> {
        let timeout = self.options.timeout;

        if let Some(creds) = &self.options.fallback_s3 {
            let driver = ObjectStorageDriver::s3(creds, timeout);
            if driver.is_enabled() {
                info!(owner_id, "using deployment S3 bucket");
                return Ok(StorageDriver::ObjectStorage(driver));
            }
            warn!(owner_id, reason = driver.disabled_reason(), "deployment S3 bucket unusable");
        }

        if let Some(token) = self.options.fallback_dropbox_token.as_deref() {
            let driver = DropboxDriver::connect(self.dropbox.as_ref(), Some(token));
            match driver.verify().await {
                Ok(()) => {
                    info!(owner_id, "using deployment Dropbox account");
                    return Ok(StorageDriver::Dropbox(driver));
                }
                Err(e) => warn!(owner_id, error = %e, "deployment Dropbox token unusable"),
            }
        }

        let local = LocalDriver::new(&self.options.local_root, timeout);
        if local.is_enabled() {
            warn!(
                owner_id,
                root = %local.root().display(),
                "no external storage available, using local disk; files are not durable and this is not suitable for production"
            );
            return Ok(StorageDriver::Local(local));
        }

        Err(StorageError::missing(format!(
            "no external storage is configured and local disk is unavailable: {}",
            local.disabled_reason().unwrap_or("unknown error")
        )))
    }

    /// Uploads one file for a tenant, optionally attached to a client.
    ///
    /// The driver is selected once; a failure is returned as is and never
    /// retried against another provider.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::adapter_for`] or the selected driver.
    pub async fn upload(
        &self,
        owner_id: i64,
        data: Bytes,
        filename: &str,
        client_id: Option<i64>,
        content_type: Option<&str>,
    ) -> Result<StoredObject, StorageError> {
        let resolved = self.resolve(owner_id).await?;
        let request = UploadRequest {
            data,
            filename: filename.to_string(),
            content_type: content_type.map(String::from),
            scope: UploadScope {
                owner_id,
                client_id,
            },
        };
        let mut stored = resolved.driver.upload(&request).await?;
        stored.config_id = resolved.config_id;
        Ok(stored)
    }

    /// Same as [`Self::upload`], flattened into an [`UploadResult`].
    pub async fn upload_result(
        &self,
        owner_id: i64,
        data: Bytes,
        filename: &str,
        client_id: Option<i64>,
        content_type: Option<&str>,
    ) -> UploadResult {
        self.upload(owner_id, data, filename, client_id, content_type)
            .await
            .into()
    }

    /// Deletes an object through the tenant's current driver.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::adapter_for`] or the driver's delete.
    pub async fn delete_file(&self, owner_id: i64, key: &str) -> Result<(), StorageError> {
        self.adapter_for(owner_id).await?.delete(key).await
    }

    /// Reads a file the local-disk driver wrote for this tenant.
    ///
    /// Keys outside the tenant's `tenant-{owner_id}/` prefix, or with `..`
    /// segments, are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a foreign or absent key and `ProviderInitFailed`
    /// if the upload root is unusable.
    pub async fn read_local(&self, owner_id: i64, key: &str) -> Result<Bytes, StorageError> {
        let prefix = UploadScope::tenant_prefix(owner_id);
        let owned = key
            .strip_prefix(&prefix)
            .is_some_and(|rest| rest.starts_with('/'));
        if !owned || key.split('/').any(|segment| segment == "..") {
            debug!(owner_id, key, "local read outside the tenant prefix");
            return Err(StorageError::NotFound(key.to_string()));
        }

        LocalDriver::new(&self.options.local_root, self.options.timeout)
            .read(key)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::{FakeDropbox, FakeDropboxConnector, StaticResolver, config_row};
    use rstest::rstest;

    struct Harness {
        facade: StorageFacade<StaticResolver>,
        connector: Arc<FakeDropboxConnector>,
        _dir: tempfile::TempDir,
    }

    fn harness(resolver: StaticResolver, options: impl FnOnce(&mut FacadeOptions)) -> Harness {
        harness_with(resolver, FakeDropbox::new(), options)
    }

    fn harness_with(
        resolver: StaticResolver,
        dropbox: FakeDropbox,
        options: impl FnOnce(&mut FacadeOptions),
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = FacadeOptions {
            local_root: dir.path().to_path_buf(),
            timeout: Duration::from_secs(5),
            ..FacadeOptions::default()
        };
        options(&mut opts);

        let connector = Arc::new(FakeDropboxConnector::new(dropbox));
        let facade = StorageFacade::new(Arc::new(resolver), opts)
            .with_dropbox_connector(connector.clone());
        Harness {
            facade,
            connector,
            _dir: dir,
        }
    }

    fn dropbox_row(owner_id: i64, token: &str) -> StorageConfig {
        StorageConfig {
            access_token: Some(token.to_string()),
            ..config_row(owner_id, "dropbox")
        }
    }

    #[tokio::test]
    async fn test_dropbox_end_to_end() {
        let h = harness(StaticResolver::new().with(dropbox_row(42, "tok")), |_| {});

        let stored = h
            .facade
            .upload(42, Bytes::from_static(b"hello"), "report.pdf", Some(7), Some("application/pdf"))
            .await
            .unwrap();

        assert!(stored.url.ends_with("raw=1"));
        assert!(stored.key.contains("tenant-42"));
        assert!(stored.key.contains("client-7"));
        assert_eq!(stored.provider, ProviderKind::Dropbox);
        assert_eq!(h.connector.tokens(), vec!["tok".to_string()]);
        assert_eq!(
            h.connector.api().file(&stored.key).as_deref(),
            Some(&b"hello"[..])
        );
    }

    #[tokio::test]
    async fn test_strict_policy_without_config() {
        let h = harness(StaticResolver::new(), |_| {});

        let err = h.facade.adapter_for(9).await.unwrap_err();

        assert!(matches!(err, StorageError::ConfigurationMissing(_)));
        assert!(err.to_string().contains("connect Dropbox or Google Cloud Storage"));
    }

    #[tokio::test]
    async fn test_strict_upload_without_config_never_touches_a_driver() {
        let h = harness(StaticResolver::new(), |o| {
            o.fallback_dropbox_token = Some("deployment".into());
        });

        let result = h
            .facade
            .upload_result(9, Bytes::from_static(b"x"), "a.txt", None, None)
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("not configured"));
        assert!(h.connector.tokens().is_empty());
    }

    #[rstest]
    #[case("gcs")]
    #[case("google")]
    #[case("google_cloud_storage")]
    #[case("GCS")]
    #[tokio::test]
    async fn test_gcs_synonyms_select_object_storage(#[case] provider: &str) {
        let row = StorageConfig {
            bucket_name: Some("firm-files".into()),
            service_account_json: Some(r#"{"type":"service_account","project_id":"demo"}"#.into()),
            ..config_row(5, provider)
        };
        let h = harness(StaticResolver::new().with(row), |_| {});

        let driver = h.facade.adapter_for(5).await.unwrap();

        assert!(matches!(driver, StorageDriver::ObjectStorage(_)));
        assert_eq!(driver.provider(), ProviderKind::Gcs);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_invalid() {
        let h = harness(StaticResolver::new().with(config_row(5, "ftp")), |o| {
            o.fallback = FallbackPolicy::AutoDetect;
        });

        let err = h.facade.adapter_for(5).await.unwrap_err();
        assert!(matches!(err, StorageError::ConfigurationInvalid(_)));
    }

    #[tokio::test]
    async fn test_configured_but_disabled_driver_is_invalid() {
        let h = harness(StaticResolver::new().with(config_row(5, "dropbox")), |o| {
            o.fallback = FallbackPolicy::AutoDetect;
        });

        let err = h.facade.adapter_for(5).await.unwrap_err();

        assert!(matches!(err, StorageError::ConfigurationInvalid(_)));
        assert!(err.to_string().contains("dropbox storage is configured but cannot be used"));
    }

    #[tokio::test]
    async fn test_config_store_failure_propagates() {
        let h = harness(StaticResolver::broken(), |_| {});
        assert!(matches!(
            h.facade.adapter_for(1).await,
            Err(StorageError::ConfigStore(_))
        ));
    }

    #[tokio::test]
    async fn test_auto_detect_falls_back_to_local() {
        let h = harness(StaticResolver::new(), |o| {
            o.fallback = FallbackPolicy::AutoDetect;
        });

        let driver = h.facade.adapter_for(9).await.unwrap();

        assert!(matches!(driver, StorageDriver::Local(_)));
        assert!(!driver.is_durable());
    }

    #[tokio::test]
    async fn test_auto_detect_prefers_s3() {
        let h = harness(StaticResolver::new(), |o| {
            o.fallback = FallbackPolicy::AutoDetect;
            o.fallback_dropbox_token = Some("deployment".into());
            o.fallback_s3 = Some(S3Credentials {
                bucket: Some("deployment-bucket".into()),
                region: "ap-northeast-1".into(),
                endpoint: None,
                access_key_id: None,
                secret_access_key: None,
            });
        });

        let driver = h.facade.adapter_for(9).await.unwrap();
        assert_eq!(driver.provider(), ProviderKind::S3);
    }

    #[tokio::test]
    async fn test_auto_detect_uses_verified_dropbox() {
        let h = harness(StaticResolver::new(), |o| {
            o.fallback = FallbackPolicy::AutoDetect;
            o.fallback_dropbox_token = Some("deployment".into());
        });

        let driver = h.facade.adapter_for(9).await.unwrap();
        assert_eq!(driver.provider(), ProviderKind::Dropbox);
    }

    #[tokio::test]
    async fn test_auto_detect_skips_rejected_dropbox_token() {
        let h = harness_with(
            StaticResolver::new(),
            FakeDropbox::new().with_rejected_token(),
            |o| {
                o.fallback = FallbackPolicy::AutoDetect;
                o.fallback_dropbox_token = Some("revoked".into());
            },
        );

        let driver = h.facade.adapter_for(9).await.unwrap();
        assert_eq!(driver.provider(), ProviderKind::Local);
    }

    #[tokio::test]
    async fn test_configured_tenant_ignores_fallback() {
        let h = harness(StaticResolver::new().with(dropbox_row(42, "tok")), |o| {
            o.fallback = FallbackPolicy::AutoDetect;
        });

        let driver = h.facade.adapter_for(42).await.unwrap();
        assert_eq!(driver.provider(), ProviderKind::Dropbox);
    }

    #[tokio::test]
    async fn test_same_filename_twice_gets_distinct_keys() {
        let h = harness(StaticResolver::new().with(config_row(3, "local")), |_| {});

        let first = h
            .facade
            .upload(3, Bytes::from_static(b"a"), "scan.png", Some(1), Some("image/png"))
            .await
            .unwrap();
        let second = h
            .facade
            .upload(3, Bytes::from_static(b"b"), "scan.png", Some(1), Some("image/png"))
            .await
            .unwrap();

        assert_ne!(first.key, second.key);
        assert_ne!(first.url, second.url);
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported_not_substituted() {
        let h = harness_with(
            StaticResolver::new().with(dropbox_row(42, "tok")),
            FakeDropbox::new().with_upload_failure(),
            |o| o.fallback = FallbackPolicy::AutoDetect,
        );

        let result = h
            .facade
            .upload_result(42, Bytes::from_static(b"hello"), "report.pdf", Some(7), None)
            .await;

        assert!(!result.success);
        assert_eq!(result.url, None);
        assert!(result.error.unwrap().contains("insufficient_space"));
    }

    #[tokio::test]
    async fn test_delete_file() {
        let h = harness(StaticResolver::new().with(config_row(3, "local")), |_| {});
        let stored = h
            .facade
            .upload(3, Bytes::from_static(b"a"), "memo.txt", None, None)
            .await
            .unwrap();

        h.facade.delete_file(3, &stored.key).await.unwrap();
        assert!(matches!(
            h.facade.delete_file(3, &stored.key).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_records_config_row() {
        let h = harness(StaticResolver::new().with(config_row(3, "local")), |_| {});
        let stored = h
            .facade
            .upload(3, Bytes::from_static(b"a"), "memo.txt", Some(1), None)
            .await
            .unwrap();
        assert_eq!(stored.config_id, Some(30));

        let h = harness(StaticResolver::new(), |o| {
            o.fallback = FallbackPolicy::AutoDetect;
        });
        let stored = h
            .facade
            .upload(3, Bytes::from_static(b"a"), "memo.txt", Some(1), None)
            .await
            .unwrap();
        assert_eq!(stored.config_id, None);
    }

    #[tokio::test]
    async fn test_read_local_stays_inside_tenant() {
        let h = harness(StaticResolver::new().with(config_row(3, "local")), |_| {});
        let stored = h
            .facade
            .upload(3, Bytes::from_static(b"ledger"), "ledger.csv", Some(1), None)
            .await
            .unwrap();

        assert_eq!(&h.facade.read_local(3, &stored.key).await.unwrap()[..], b"ledger");

        let escaped = format!("tenant-4/../{}", stored.key);
        for (owner, key) in [(4, stored.key.as_str()), (4, escaped.as_str()), (30, stored.key.as_str())] {
            assert!(
                matches!(
                    h.facade.read_local(owner, key).await,
                    Err(StorageError::NotFound(_))
                ),
                "{owner} read {key}"
            );
        }
    }

    #[test]
    fn test_options_debug_hides_credentials() {
        let options = FacadeOptions {
            fallback_dropbox_token: Some("sl.deployment-token".into()),
            fallback_s3: Some(S3Credentials {
                bucket: Some("deployment-bucket".into()),
                region: "ap-northeast-1".into(),
                endpoint: None,
                access_key_id: Some("AKIAEXAMPLE".into()),
                secret_access_key: Some("s3-secret-key".into()),
            }),
            ..FacadeOptions::default()
        };

        let printed = format!("{options:?}");
        assert!(printed.contains("deployment-bucket"));
        assert!(!printed.contains("sl.deployment-token"));
        assert!(!printed.contains("s3-secret-key"));
    }

    #[test]
    fn test_options_from_settings() {
        let settings = StorageSettings {
            fallback_policy: FallbackPolicy::AutoDetect,
            request_timeout_secs: 15,
            dropbox_access_token: Some("  ".into()),
            ..StorageSettings::default()
        };
        let options = FacadeOptions::from_settings(&settings);

        assert_eq!(options.fallback, FallbackPolicy::AutoDetect);
        assert_eq!(options.timeout, Duration::from_secs(15));
        assert_eq!(options.local_root, PathBuf::from("./uploads"));
        assert!(options.fallback_dropbox_token.is_none());
    }
}
