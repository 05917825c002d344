//! Docstore API Server
//!
//! Main entry point for the document upload service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docstore_api::{AppState, create_router};
use docstore_core::document::DocumentService;
use docstore_core::storage::{StorageConfig, StorageService};
use docstore_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docstore=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Create storage service
    let storage_config = StorageConfig::from_settings(&config.storage)?;
    let storage = StorageService::from_config(storage_config)?;
    info!(
        provider = storage.provider_name(),
        bucket = storage.bucket(),
        unknown_extension = ?config.storage.unknown_extension,
        "Storage configured"
    );

    // Create application state
    let state = AppState {
        documents: Arc::new(DocumentService::new(
            Arc::new(storage),
            config.storage.unknown_extension,
        )),
        body_limit_bytes: config.upload.body_limit_bytes,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
