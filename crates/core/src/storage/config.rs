//! Storage configuration types.

use std::path::PathBuf;

use docstore_shared::{StorageKind, StorageSettings};
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Google Cloud Storage.
    Gcs {
        /// GCP project ID. The project is inferred from credentials by the
        /// client; this is kept for logging and URL building only.
        project_id: Option<String>,
        /// Service account key file. Falls back to ambient credentials.
        credential_path: Option<PathBuf>,
        /// Bucket name.
        bucket: String,
    },
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory (tests only)
    Memory,
}

impl StorageProvider {
    /// Create Google Cloud Storage provider.
    #[must_use]
    pub fn gcs(
        project_id: Option<String>,
        credential_path: Option<PathBuf>,
        bucket: impl Into<String>,
    ) -> Self {
        Self::Gcs {
            project_id,
            credential_path,
            bucket: bucket.into(),
        }
    }

    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gcs { .. } => "gcs",
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::Gcs { bucket, .. } | Self::S3 { bucket, .. } => bucket,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
            Self::Memory => "memory",
        }
    }

    /// Public (unsigned) URL of an object.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        match self {
            Self::Gcs { bucket, .. } => format!("https://storage.googleapis.com/{bucket}/{key}"),
            Self::S3 {
                endpoint, bucket, ..
            } => format!("{}/{bucket}/{key}", endpoint.trim_end_matches('/')),
            Self::LocalFs { root } => {
                format!("file://{}/{key}", root.display().to_string().trim_end_matches('/'))
            }
            Self::Memory => format!("memory:///{key}"),
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Signed read URL TTL in seconds (default: 3600 = 1 hour).
    pub presign_download_ttl_secs: u64,
}

impl StorageConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 3600;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
        }
    }

    /// Build a typed config from loaded application settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a field the provider needs is unset.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = match settings.provider {
            StorageKind::Gcs => StorageProvider::gcs(
                settings.project_id.clone(),
                settings.credential_path.clone(),
                required(settings.bucket.as_ref(), "bucket")?,
            ),
            StorageKind::S3 => StorageProvider::s3(
                required(settings.endpoint.as_ref(), "endpoint")?,
                required(settings.bucket.as_ref(), "bucket")?,
                required(settings.access_key_id.as_ref(), "access_key_id")?,
                required(settings.secret_access_key.as_ref(), "secret_access_key")?,
                settings.region.clone().unwrap_or_else(|| "auto".to_string()),
            ),
            StorageKind::Local => StorageProvider::local_fs(settings.root.clone()),
            StorageKind::Memory => StorageProvider::Memory,
        };

        Ok(Self::new(provider)
            .with_max_file_size(settings.max_file_size)
            .with_download_ttl(settings.download_ttl_secs))
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set signed read URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }
}

fn required(value: Option<&String>, field: &str) -> Result<String, StorageError> {
    value
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| StorageError::configuration(format!("storage.{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_provider_gcs() {
        let provider = StorageProvider::gcs(Some("proj".into()), None, "documents");
        assert_eq!(provider.name(), "gcs");
        assert_eq!(provider.bucket(), "documents");
        assert_eq!(
            provider.public_url("uploads/documents/a@b.com/idPhoto.png"),
            "https://storage.googleapis.com/documents/uploads/documents/a@b.com/idPhoto.png"
        );
    }

    #[test]
    fn test_storage_provider_s3() {
        let provider = StorageProvider::s3(
            "https://account.r2.cloudflarestorage.com/",
            "documents",
            "access_key",
            "secret_key",
            "auto",
        );
        assert_eq!(provider.name(), "s3");
        assert_eq!(provider.bucket(), "documents");
        assert_eq!(
            provider.public_url("a.pdf"),
            "https://account.r2.cloudflarestorage.com/documents/a.pdf"
        );
    }

    #[test]
    fn test_storage_provider_local() {
        let provider = StorageProvider::local_fs("./storage");
        assert_eq!(provider.name(), "local");
        assert_eq!(provider.public_url("a.pdf"), "file://./storage/a.pdf");
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::new(StorageProvider::Memory);
        assert_eq!(config.max_file_size, StorageConfig::DEFAULT_MAX_FILE_SIZE);
        assert_eq!(
            config.presign_download_ttl_secs,
            StorageConfig::DEFAULT_DOWNLOAD_TTL
        );
    }

    #[test]
    fn test_from_settings_gcs_requires_bucket() {
        let settings = StorageSettings {
            provider: StorageKind::Gcs,
            ..StorageSettings::default()
        };
        let err = StorageConfig::from_settings(&settings).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(ref msg) if msg.contains("bucket")));
    }

    #[test]
    fn test_from_settings_gcs() {
        let settings = StorageSettings {
            provider: StorageKind::Gcs,
            bucket: Some("documents".into()),
            project_id: Some("proj".into()),
            credential_path: Some(PathBuf::from("/secrets/key.json")),
            download_ttl_secs: 600,
            ..StorageSettings::default()
        };
        let config = StorageConfig::from_settings(&settings).expect("valid settings");
        assert_eq!(config.provider.name(), "gcs");
        assert_eq!(config.provider.bucket(), "documents");
        assert_eq!(config.presign_download_ttl_secs, 600);
    }

    #[test]
    fn test_from_settings_s3_defaults_region() {
        let settings = StorageSettings {
            provider: StorageKind::S3,
            endpoint: Some("https://s3.example.com".into()),
            bucket: Some("documents".into()),
            access_key_id: Some("id".into()),
            secret_access_key: Some("secret".into()),
            ..StorageSettings::default()
        };
        let config = StorageConfig::from_settings(&settings).expect("valid settings");
        assert!(matches!(config.provider, StorageProvider::S3 { ref region, .. } if region == "auto"));
    }
}
