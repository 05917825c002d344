//! Document service implementation.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use docstore_shared::UnknownExtensionPolicy;
use futures::future::try_join_all;
use tracing::{info, warn};

use super::error::DocumentError;
use super::resolver::{
    FALLBACK_CONTENT_TYPE, extract_extension, resolve_content_type, resolve_target, user_prefix,
};
use super::types::{ResolvedTarget, StoredDocument, UploadDescriptor, UploadPart};
use crate::storage::{PresignedUrl, StorageError, StorageService};

/// Document service tying key resolution to object storage.
pub struct DocumentService {
    storage: Arc<StorageService>,
    unknown_extension: UnknownExtensionPolicy,
}

impl DocumentService {
    /// Create a new document service.
    #[must_use]
    pub fn new(storage: Arc<StorageService>, unknown_extension: UnknownExtensionPolicy) -> Self {
        Self {
            storage,
            unknown_extension,
        }
    }

    /// Underlying storage service.
    #[must_use]
    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    /// Resolve the target for a descriptor and apply the unknown-extension
    /// policy, yielding the content type to write with.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedExtension` when the policy is `Reject` and the
    /// extension is not recognised.
    pub fn plan(
        &self,
        descriptor: &UploadDescriptor,
    ) -> Result<(ResolvedTarget, &'static str), DocumentError> {
        let target = resolve_target(descriptor);
        let content_type = match (target.content_type, self.unknown_extension) {
            (Some(content_type), _) => content_type,
            (None, UnknownExtensionPolicy::Allow) => {
                warn!(
                    filename = %descriptor.original_filename,
                    key = %target.storage_key,
                    "Unrecognised extension, storing as octet-stream"
                );
                FALLBACK_CONTENT_TYPE
            }
            (None, UnknownExtensionPolicy::Reject) => {
                return Err(DocumentError::unsupported_extension(
                    &descriptor.original_filename,
                    extract_extension(&descriptor.original_filename),
                ));
            }
        };
        Ok((target, content_type))
    }

    /// Store one uploaded file.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is rejected or the write fails.
    pub async fn store(
        &self,
        descriptor: &UploadDescriptor,
        data: Bytes,
    ) -> Result<StoredDocument, DocumentError> {
        let (target, content_type) = self.plan(descriptor)?;
        self.write(descriptor, target, content_type, data).await
    }

    async fn write(
        &self,
        descriptor: &UploadDescriptor,
        target: ResolvedTarget,
        content_type: &'static str,
        data: Bytes,
    ) -> Result<StoredDocument, DocumentError> {
        let size = data.len() as u64;
        let url = self
            .storage
            .write_object(&target.storage_key, data, content_type)
            .await?;

        Ok(StoredDocument {
            field_name: descriptor.field_name.clone(),
            original_filename: descriptor.original_filename.clone(),
            storage_key: target.storage_key,
            content_type: content_type.to_string(),
            size,
            url,
        })
    }

    /// Store every file part of one upload request.
    ///
    /// All parts are resolved and size-checked before anything is written,
    /// so a rejected extension, an oversized part or a key collision leaves
    /// storage untouched.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` or `InvalidEmail` for a bad email, `NoFiles`
    /// without parts, `FileTooLarge` for an oversized part, `DuplicateKey`
    /// on a collision, or the first write error.
    pub async fn store_batch(
        &self,
        user_email: &str,
        index: Option<&str>,
        parts: Vec<UploadPart>,
    ) -> Result<Vec<StoredDocument>, DocumentError> {
        validate_email(user_email)?;
        if parts.is_empty() {
            return Err(DocumentError::NoFiles);
        }

        let max_file_size = self.storage.config().max_file_size;
        let mut seen = HashSet::new();
        let mut planned = Vec::with_capacity(parts.len());
        for part in parts {
            let size = part.data.len() as u64;
            if size > max_file_size {
                return Err(StorageError::file_too_large(size, max_file_size).into());
            }

            let mut descriptor =
                UploadDescriptor::new(part.field_name, part.original_filename, user_email);
            descriptor.index = index.map(str::to_string);

            let (target, content_type) = self.plan(&descriptor)?;
            if !seen.insert(target.storage_key.clone()) {
                return Err(DocumentError::DuplicateKey(target.storage_key));
            }
            planned.push((descriptor, target, content_type, part.data));
        }

        let stored = try_join_all(
            planned
                .into_iter()
                .map(|(descriptor, target, content_type, data)| async move {
                    self.write(&descriptor, target, content_type, data).await
                }),
        )
        .await?;

        info!(
            user_email = %user_email,
            count = stored.len(),
            "Documents uploaded"
        );
        Ok(stored)
    }

    /// Check whether a document exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn exists(&self, key: &str) -> Result<bool, DocumentError> {
        Ok(self.storage.exists(key).await?)
    }

    /// Signed read URL for a document.
    ///
    /// # Errors
    ///
    /// Returns a storage `NotFound` error if the document does not exist.
    pub async fn signed_url(&self, key: &str) -> Result<PresignedUrl, DocumentError> {
        Ok(self.storage.presign_read(key).await?)
    }

    /// Read a document together with the content type implied by its key.
    ///
    /// # Errors
    ///
    /// Returns a storage `NotFound` error if the document does not exist.
    pub async fn read(&self, key: &str) -> Result<(Bytes, &'static str), DocumentError> {
        let bytes = self.storage.read_object(key).await?;
        let content_type =
            resolve_content_type(&extract_extension(key)).unwrap_or(FALLBACK_CONTENT_TYPE);
        Ok((bytes, content_type))
    }

    /// Delete one document. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn delete(&self, key: &str) -> Result<bool, DocumentError> {
        Ok(self.storage.delete_object(key).await?)
    }

    /// Delete all documents under a key prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if any deletion fails.
    pub async fn delete_folder(&self, prefix: &str) -> Result<bool, DocumentError> {
        Ok(self.storage.delete_prefix(prefix).await?)
    }

    /// Delete every document of one user.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` or `InvalidEmail` for a bad email, or any
    /// deletion error.
    pub async fn delete_user_documents(&self, user_email: &str) -> Result<bool, DocumentError> {
        validate_email(user_email)?;
        self.delete_folder(&user_prefix(user_email)).await
    }
}

/// The email becomes one path segment of the key, so it must not be able to
/// leave the user's folder.
fn validate_email(user_email: &str) -> Result<(), DocumentError> {
    if user_email.trim().is_empty() {
        return Err(DocumentError::MissingField("email"));
    }
    if user_email.contains('/') || user_email.contains("..") {
        return Err(DocumentError::InvalidEmail(user_email.to_string()));
    }
    Ok(())
}
