//! Document uploads for user onboarding.
//!
//! This module provides:
//! - Storage key and content type resolution for uploaded files
//! - Upload of single files and whole multipart batches
//! - Signed URL generation, reads and deletion by key or user

mod error;
pub mod resolver;
mod service;
mod types;

pub use error::DocumentError;
pub use resolver::{
    extract_extension, resolve_content_type, resolve_storage_key, resolve_target, user_prefix,
};
pub use service::DocumentService;
pub use types::{ExtensionRule, ResolvedTarget, StoredDocument, UploadDescriptor, UploadPart};
