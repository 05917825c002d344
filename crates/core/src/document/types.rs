//! Document types and data structures.

use bytes::Bytes;

/// Maps one file extension to the content type it is stored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionRule {
    /// Lowercase extension including the leading dot.
    pub extension: &'static str,
    /// MIME type.
    pub content_type: &'static str,
}

/// One file part of a multipart upload, with the form fields it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDescriptor {
    /// Multipart field name (e.g. `idPhoto`, `ttCopy`).
    pub field_name: String,
    /// Filename as sent by the client.
    pub original_filename: String,
    /// Owner of the document; becomes the key prefix.
    pub user_email: String,
    /// Disambiguates repeated `ttCopy` uploads.
    pub index: Option<String>,
}

impl UploadDescriptor {
    /// Create a descriptor without an index.
    #[must_use]
    pub fn new(
        field_name: impl Into<String>,
        original_filename: impl Into<String>,
        user_email: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            original_filename: original_filename.into(),
            user_email: user_email.into(),
            index: None,
        }
    }

    /// Set the index.
    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }
}

/// Where and how a document is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Storage key.
    pub storage_key: String,
    /// Content type, or `None` for an unrecognised extension.
    pub content_type: Option<&'static str>,
}

/// A file part received from the client, before resolution.
#[derive(Debug, Clone)]
pub struct UploadPart {
    /// Multipart field name.
    pub field_name: String,
    /// Filename as sent by the client.
    pub original_filename: String,
    /// File contents.
    pub data: Bytes,
}

/// A document written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Multipart field name.
    pub field_name: String,
    /// Filename as sent by the client.
    pub original_filename: String,
    /// Storage key.
    pub storage_key: String,
    /// Content type the object was written with.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Public (unsigned) URL.
    pub url: String,
}
