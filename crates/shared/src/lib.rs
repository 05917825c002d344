//! Shared errors and configuration for Docstore.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;

pub use config::{
    AppConfig, ServerConfig, StorageKind, StorageSettings, UnknownExtensionPolicy, UploadConfig,
};
pub use error::{AppError, AppResult};
