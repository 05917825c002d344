//! Core document logic for Docstore.
//!
//! This crate contains the document key resolution rules and the object
//! storage boundary, with ZERO web dependencies.
//!
//! # Modules
//!
//! - `document` - Key and content type resolution, upload batches
//! - `storage` - OpenDAL-backed object storage

pub mod document;
pub mod storage;
