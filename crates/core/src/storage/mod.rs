//! Storage resolution layer.
//!
//! Each tenant (advisory firm) connects its own storage provider. Uploads go
//! through [`StorageFacade`], which looks up the tenant's active
//! configuration, selects a driver and hands back a URL:
//!
//! ```text
//!  upload(owner, bytes, name, client)
//!        │
//!        ▼
//!  StorageConfigResolver ──► StorageConfig (provider + credentials)
//!        │                         │ none: FallbackPolicy
//!        ▼                         ▼
//!  StorageDriver::{Dropbox, ObjectStorage (S3/GCS), Local}
//!        │
//!        ▼
//!  StoredObject { url, key, config_id }
//! ```
//!
//! Drivers never fail to construct. Missing or broken credentials produce a
//! disabled driver, which the facade reports as a configuration error.

mod config;
mod driver;
mod dropbox;
mod error;
mod facade;
mod local;
mod naming;
mod object;
mod resolver;

#[cfg(test)]
mod testing;

pub use config::{
    ConfigStatus, DEFAULT_S3_REGION, GcsCredentials, NewStorageConfig, ProviderKind,
    S3Credentials, StorageConfig, validate_service_account_json,
};
pub use driver::{StorageDriver, StoredObject, UploadRequest, UploadResult};
pub use dropbox::{
    DropboxApi, DropboxApiError, DropboxConnector, DropboxDriver, DropboxHttpClient,
    HttpDropboxConnector, direct_download_url,
};
pub use error::StorageError;
pub use facade::{FacadeOptions, NOT_CONFIGURED_MESSAGE, ResolvedDriver, StorageFacade};
pub use local::{LOCAL_URL_PREFIX, LocalDriver};
pub use naming::{FALLBACK_FILENAME, UploadScope, sanitize_filename, stored_name};
pub use object::{GCS_PUBLIC_BASE, ObjectStorageDriver, s3_url_base};
pub use resolver::StorageConfigResolver;
