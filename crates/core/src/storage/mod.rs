//! Object storage for uploaded documents using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - Google Cloud Storage
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Local filesystem (development only)
//! - In-memory (tests only)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write_with("key", data) │ op.presign_read("key", duration)   │
//! │ op.read("key")             │ op.list_with("dir/").recursive()   │
//! │ op.delete("key")           │ op.stat("key")                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{ObjectMetadata, PresignedUrl, StorageService};
