//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Multipart document upload
//! - Document lookup, signed URL, read and delete routes
//! - JSON error responses

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use docstore_core::document::DocumentService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document service for uploads and storage access.
    pub documents: Arc<DocumentService>,
    /// Maximum request body size in bytes.
    pub body_limit_bytes: usize,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.body_limit_bytes;
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
