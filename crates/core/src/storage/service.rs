//! Storage service implementation using Apache OpenDAL.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use opendal::{ErrorKind, Operator, services};
use tracing::{debug, info};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Presigned URL for download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use (GET for download).
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

/// Metadata about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    /// Storage key.
    pub storage_key: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Content type.
    pub content_type: Option<String>,
}

/// Storage service for uploaded documents.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        info!(
            provider = config.provider.name(),
            bucket = config.provider.bucket(),
            "Storage service initialized"
        );
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::Gcs {
                project_id,
                credential_path,
                bucket,
            } => {
                let mut builder = services::Gcs::default().bucket(bucket);
                if let Some(path) = credential_path {
                    builder = builder.credential_path(
                        path.to_str()
                            .ok_or_else(|| StorageError::configuration("invalid credential path"))?,
                    );
                }
                debug!(project_id = ?project_id, bucket = %bucket, "Building GCS operator");

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Check if an object exists in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails for any reason other than the
    /// object being absent.
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        match self.operator.stat(key).await {
            Ok(_) => {
                debug!(key = %key, "Object exists");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = %key, "Object does not exist");
                Ok(false)
            }
            Err(e) => Err(StorageError::from_opendal(&e, key)),
        }
    }

    /// Get size and content type of a stored object.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the object does not exist.
    pub async fn stat(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        validate_key(key)?;
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?;

        Ok(ObjectMetadata {
            storage_key: key.to_string(),
            file_size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
        })
    }

    /// Write an object and return its public URL.
    ///
    /// The content type is attached only when the backend can store it.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is larger than the configured maximum
    /// or the write fails.
    pub async fn write_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_key(key)?;

        let size = data.len() as u64;
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if self
            .operator
            .info()
            .full_capability()
            .write_with_content_type
        {
            self.operator
                .write_with(key, data)
                .content_type(content_type)
                .await
                .map_err(|e| StorageError::from_opendal(&e, key))?;
        } else {
            self.operator
                .write(key, data)
                .await
                .map_err(|e| StorageError::from_opendal(&e, key))?;
        }

        info!(key = %key, size, content_type = %content_type, "Object written");
        Ok(self.public_url(key))
    }

    /// Generate a signed read URL using the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the object does not exist, or
    /// `PresignNotSupported` if the backend cannot sign URLs.
    pub async fn presign_read(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        self.presign_read_with_ttl(key, self.config.presign_download_ttl_secs)
            .await
    }

    /// Generate a signed read URL valid for `ttl_secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the object does not exist, or
    /// `PresignNotSupported` if the backend cannot sign URLs.
    pub async fn presign_read_with_ttl(
        &self,
        key: &str,
        ttl_secs: u64,
    ) -> Result<PresignedUrl, StorageError> {
        if !self.exists(key).await? {
            info!(key = %key, "File not found or expired");
            return Err(StorageError::not_found(key));
        }

        let presigned = self
            .operator
            .presign_read(key, Duration::from_secs(ttl_secs))
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        })
    }

    /// Delete a single object.
    ///
    /// Returns `false` without touching storage when the object is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the existence check or deletion fails.
    pub async fn delete_object(&self, key: &str) -> Result<bool, StorageError> {
        if !self.exists(key).await? {
            info!(key = %key, "File does not exist");
            return Ok(false);
        }

        self.operator
            .delete(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?;
        info!(key = %key, "File deleted");
        Ok(true)
    }

    /// Delete every object whose key starts with `prefix`.
    ///
    /// Deletions run concurrently; the call succeeds only if all of them do.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for an empty prefix, or the first listing or
    /// deletion error.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<bool, StorageError> {
        if prefix.is_empty() {
            return Err(StorageError::invalid_key("prefix must not be empty"));
        }

        let keys = self.list_prefix(prefix).await?;
        let deletions = keys.iter().map(|key| async move {
            self.operator
                .delete(key)
                .await
                .map_err(|e| StorageError::from_opendal(&e, key))?;
            info!(key = %key, "File deleted");
            Ok::<_, StorageError>(())
        });
        try_join_all(deletions).await?;

        info!(prefix = %prefix, count = keys.len(), "Folder deleted");
        Ok(true)
    }

    /// List keys of all files whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let parent = prefix.rfind('/').map_or("/", |idx| &prefix[..=idx]);

        let entries = match self.operator.list_with(parent).recursive(true).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from(e)),
        };

        Ok(entries
            .into_iter()
            .filter(|entry| entry.metadata().is_file() && entry.path().starts_with(prefix))
            .map(|entry| entry.path().to_string())
            .collect())
    }

    /// Read an object's bytes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the object does not exist.
    pub async fn read_object(&self, key: &str) -> Result<Bytes, StorageError> {
        validate_key(key)?;
        let bytes = self
            .operator
            .read(key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?
            .to_bytes();

        info!(key = %key, size = bytes.len(), "Object bytes read");
        Ok(bytes)
    }

    /// Public (unsigned) URL of an object.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        self.config.provider.public_url(key)
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Reject keys that cannot address a single object.
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::invalid_key("key must not be empty"));
    }
    if key.ends_with('/') {
        return Err(StorageError::invalid_key(format!(
            "key must not end with '/': {key}"
        )));
    }
    Ok(())
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_service() -> StorageService {
        StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
            .expect("should create service")
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("uploads/documents/a@b.com/idPhoto.png").is_ok());
        assert!(matches!(
            validate_key(""),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key("uploads/documents/"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_write_then_exists_and_read() {
        let service = memory_service();
        let key = "uploads/documents/a@b.com/idPhoto.png";

        assert!(!service.exists(key).await.expect("exists"));

        let url = service
            .write_object(key, Bytes::from_static(b"png-bytes"), "image/png")
            .await
            .expect("write");
        assert_eq!(url, format!("memory:///{key}"));

        assert!(service.exists(key).await.expect("exists"));
        let bytes = service.read_object(key).await.expect("read");
        assert_eq!(bytes.as_ref(), b"png-bytes");

        let meta = service.stat(key).await.expect("stat");
        assert_eq!(meta.file_size, 9);
    }

    #[tokio::test]
    async fn test_write_rejects_oversized_object() {
        let config = StorageConfig::new(StorageProvider::Memory).with_max_file_size(4);
        let service = StorageService::from_config(config).expect("should create service");

        let err = service
            .write_object("a.pdf", Bytes::from_static(b"12345"), "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { size: 5, max: 4 }));
        assert!(!service.exists("a.pdf").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_read_missing_object_is_not_found() {
        let service = memory_service();
        let err = service.read_object("missing.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { ref key } if key == "missing.pdf"));
    }

    #[tokio::test]
    async fn test_delete_object() {
        let service = memory_service();
        let key = "uploads/documents/a@b.com/ttCopy1.pdf";

        assert!(!service.delete_object(key).await.expect("delete absent"));

        service
            .write_object(key, Bytes::from_static(b"%PDF"), "application/pdf")
            .await
            .expect("write");
        assert!(service.delete_object(key).await.expect("delete"));
        assert!(!service.exists(key).await.expect("exists"));
    }

    #[tokio::test]
    async fn test_delete_prefix_only_touches_matching_keys() {
        let service = memory_service();
        let keys = [
            "uploads/documents/a@b.com/idPhoto.png",
            "uploads/documents/a@b.com/ttCopy1.pdf",
            "uploads/documents/a@b.com.au/idPhoto.png",
            "uploads/documents/c@d.com/idPhoto.png",
        ];
        for key in keys {
            service
                .write_object(key, Bytes::from_static(b"x"), "image/png")
                .await
                .expect("write");
        }

        assert!(
            service
                .delete_prefix("uploads/documents/a@b.com/")
                .await
                .expect("delete prefix")
        );

        assert!(!service.exists(keys[0]).await.expect("exists"));
        assert!(!service.exists(keys[1]).await.expect("exists"));
        assert!(service.exists(keys[2]).await.expect("exists"));
        assert!(service.exists(keys[3]).await.expect("exists"));
    }

    #[tokio::test]
    async fn test_delete_prefix_matches_mid_segment() {
        let service = memory_service();
        let keys = [
            "uploads/documents/a@b.com/idPhoto.png",
            "uploads/documents/a@bc.com/idPhoto.png",
            "uploads/documents/x@b.com/idPhoto.png",
        ];
        for key in keys {
            service
                .write_object(key, Bytes::from_static(b"x"), "image/png")
                .await
                .expect("write");
        }

        let mut matched = service
            .list_prefix("uploads/documents/a@b")
            .await
            .expect("list");
        matched.sort();
        assert_eq!(matched, [keys[0], keys[1]]);

        assert!(
            service
                .delete_prefix("uploads/documents/a@b")
                .await
                .expect("delete prefix")
        );

        assert!(!service.exists(keys[0]).await.expect("exists"));
        assert!(!service.exists(keys[1]).await.expect("exists"));
        assert!(service.exists(keys[2]).await.expect("exists"));
    }

    #[tokio::test]
    async fn test_delete_prefix_on_empty_folder_succeeds() {
        let service = memory_service();
        assert!(
            service
                .delete_prefix("uploads/documents/nobody@example.com/")
                .await
                .expect("delete prefix")
        );
    }

    #[tokio::test]
    async fn test_delete_prefix_rejects_empty_prefix() {
        let service = memory_service();
        let err = service.delete_prefix("").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_presign_missing_object_is_not_found() {
        let service = memory_service();
        let err = service.presign_read("missing.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_presign_unsupported_backend() {
        let service = memory_service();
        service
            .write_object("a.pdf", Bytes::from_static(b"%PDF"), "application/pdf")
            .await
            .expect("write");

        let err = service.presign_read("a.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::PresignNotSupported));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // Signed read URL TTL is carried through config unchanged.
    proptest! {
        #[test]
        fn prop_download_ttl_preserved(download_ttl in 60u64..7200) {
            let config = StorageConfig::new(StorageProvider::Memory)
                .with_download_ttl(download_ttl);
            let service = StorageService::from_config(config)
                .expect("should create service");

            prop_assert_eq!(service.config().presign_download_ttl_secs, download_ttl);
        }
    }

    // Any non-empty key without a trailing slash is accepted.
    proptest! {
        #[test]
        fn prop_validate_key_accepts_object_keys(key in "[a-zA-Z0-9@._-]{1,20}(/[a-zA-Z0-9@._-]{1,20}){0,3}") {
            prop_assert!(validate_key(&key).is_ok());
        }
    }
}
