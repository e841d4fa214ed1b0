//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://...` or `sqlite://...`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as read from config files.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// What the storage layer does when a tenant has no active configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Refuse to upload until a tenant admin connects a provider.
    #[default]
    Strict,
    /// Try environment-configured S3, then Dropbox, then local disk.
    AutoDetect,
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Policy applied when a tenant has no active storage configuration.
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,
    /// Timeout applied to every provider call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Root directory for the local-disk driver.
    #[serde(default = "default_local_root")]
    pub local_root: String,
    /// Largest accepted upload body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Deployment-wide S3-compatible bucket, used only by `auto_detect`.
    #[serde(default)]
    pub s3: Option<S3Settings>,
    /// Deployment-wide Dropbox token, used only by `auto_detect`.
    #[serde(default)]
    pub dropbox_access_token: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            fallback_policy: FallbackPolicy::default(),
            request_timeout_secs: default_request_timeout(),
            local_root: default_local_root(),
            max_upload_bytes: default_max_upload_bytes(),
            s3: None,
            dropbox_access_token: None,
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

fn default_local_root() -> String {
    "./uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

/// Deployment-wide S3-compatible storage.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Settings {
    /// Bucket name.
    pub bucket: String,
    /// Region (e.g. `ap-northeast-1`, or `auto` for R2).
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Access key ID.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

fn default_s3_region() -> String {
    "ap-northeast-1".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CLIENTDESK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
