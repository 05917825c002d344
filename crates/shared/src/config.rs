//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Upload handling configuration.
    #[serde(default)]
    pub upload: UploadConfig,
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

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Which storage backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Google Cloud Storage.
    Gcs,
    /// S3-compatible storage.
    S3,
    /// Local filesystem (development only).
    #[default]
    Local,
    /// In-process memory (tests only).
    Memory,
}

/// What to do with an upload whose extension has no known content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownExtensionPolicy {
    /// Refuse the upload.
    #[default]
    Reject,
    /// Store it as `application/octet-stream`.
    Allow,
}

/// Raw storage settings as read from config files and the environment.
///
/// Which fields are required depends on `provider`; the core crate turns
/// these into a typed provider and reports missing values.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend kind.
    #[serde(default)]
    pub provider: StorageKind,
    /// Bucket name (GCS and S3).
    #[serde(default)]
    pub bucket: Option<String>,
    /// GCP project ID.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Path to a GCP service account key file.
    #[serde(default)]
    pub credential_path: Option<PathBuf>,
    /// S3 endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// S3 region.
    #[serde(default)]
    pub region: Option<String>,
    /// S3 access key ID.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// S3 secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Root directory for the local provider.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Maximum size of a single document in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Signed read URL lifetime in seconds.
    #[serde(default = "default_download_ttl")]
    pub download_ttl_secs: u64,
    /// Policy for unrecognised file extensions.
    #[serde(default)]
    pub unknown_extension: UnknownExtensionPolicy,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: StorageKind::default(),
            bucket: None,
            project_id: None,
            credential_path: None,
            endpoint: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            root: default_root(),
            max_file_size: default_max_file_size(),
            download_ttl_secs: default_download_ttl(),
            unknown_extension: UnknownExtensionPolicy::default(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("./storage")
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_download_ttl() -> u64 {
    3600 // 1 hour
}

/// Upload handling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum request body size for multipart uploads.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_body_limit() -> usize {
    50 * 1024 * 1024 // 50MB
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
            .add_source(
                config::Environment::with_prefix("DOCSTORE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_uses_defaults_without_sources() {
        temp_env::with_vars_unset(
            [
                "RUN_MODE",
                "DOCSTORE__SERVER__PORT",
                "DOCSTORE__STORAGE__PROVIDER",
                "DOCSTORE__STORAGE__BUCKET",
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.storage.provider, StorageKind::Local);
                assert_eq!(config.storage.download_ttl_secs, 3600);
                assert_eq!(
                    config.storage.unknown_extension,
                    UnknownExtensionPolicy::Reject
                );
                assert_eq!(config.upload.body_limit_bytes, 50 * 1024 * 1024);
            },
        );
    }

    #[test]
    fn test_load_reads_environment_overrides() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test")),
                ("DOCSTORE__SERVER__PORT", Some("9090")),
                ("DOCSTORE__STORAGE__PROVIDER", Some("gcs")),
                ("DOCSTORE__STORAGE__BUCKET", Some("documents")),
                ("DOCSTORE__STORAGE__PROJECT_ID", Some("my-project")),
                ("DOCSTORE__STORAGE__UNKNOWN_EXTENSION", Some("allow")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.storage.provider, StorageKind::Gcs);
                assert_eq!(config.storage.bucket.as_deref(), Some("documents"));
                assert_eq!(config.storage.project_id.as_deref(), Some("my-project"));
                assert_eq!(
                    config.storage.unknown_extension,
                    UnknownExtensionPolicy::Allow
                );
            },
        );
    }
}
