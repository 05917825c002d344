//! Document upload and storage routes.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use bytes::Bytes;
use docstore_core::{
    document::{DocumentError, StoredDocument, UploadPart},
    storage::StorageError,
};
use docstore_shared::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::{AppState, error::ApiError};

/// Form field carrying the owner's email.
const EMAIL_FIELD: &str = "email";
/// Form field carrying the `ttCopy` index.
const INDEX_FIELD: &str = "index";

/// Creates the document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents", post(upload_documents).delete(delete_document))
        .route("/documents/exists", get(document_exists))
        .route("/documents/url", get(document_url))
        .route("/documents/content", get(document_content))
        .route("/documents/folder", delete(delete_folder))
        .route("/users/{email}/documents", delete(delete_user_documents))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query selecting one document.
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    /// Storage key.
    pub key: String,
}

/// Query selecting a key prefix.
#[derive(Debug, Deserialize)]
pub struct PrefixQuery {
    /// Key prefix.
    pub prefix: String,
}

/// One stored document.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// Multipart field name.
    pub field_name: String,
    /// Filename as sent by the client.
    pub original_filename: String,
    /// Storage key.
    pub key: String,
    /// Content type the object was written with.
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Public (unsigned) URL.
    pub url: String,
}

impl From<StoredDocument> for DocumentResponse {
    fn from(doc: StoredDocument) -> Self {
        Self {
            field_name: doc.field_name,
            original_filename: doc.original_filename,
            key: doc.storage_key,
            content_type: doc.content_type,
            size: doc.size,
            url: doc.url,
        }
    }
}

/// Response for an upload request.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Stored documents, in request order.
    pub documents: Vec<DocumentResponse>,
}

/// Response for an existence check.
#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    /// Storage key.
    pub key: String,
    /// Whether the object exists.
    pub exists: bool,
}

/// Response for a signed URL request.
#[derive(Debug, Serialize)]
pub struct SignedUrlResponse {
    /// Always true; failures use a different body.
    pub success: bool,
    /// Signed read URL.
    pub url: String,
    /// When the URL expires (ISO 8601).
    pub expires_at: String,
}

/// Response for a delete request.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Whether anything was deleted.
    pub deleted: bool,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/documents`
/// Upload the files of a multipart form under the sender's email.
///
/// Text fields `email` and `index` may appear anywhere in the form; keys are
/// resolved only after the whole body has been read.
async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut email = None;
    let mut index = None;
    let mut parts = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(filename) = field.file_name().map(str::to_string) {
            let data: Bytes = field.bytes().await?;
            debug!(field = %name, filename = %filename, size = data.len(), "Received file part");
            parts.push(UploadPart {
                field_name: name,
                original_filename: filename,
                data,
            });
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            EMAIL_FIELD => email = Some(value),
            INDEX_FIELD => index = Some(value).filter(|v| !v.is_empty()),
            _ => debug!(field = %name, "Ignoring form field"),
        }
    }

    let email = email.ok_or(DocumentError::MissingField(EMAIL_FIELD))?;
    let stored = state
        .documents
        .store_batch(&email, index.as_deref(), parts)
        .await?;

    info!(email = %email, count = stored.len(), "Upload completed");

    let response = UploadResponse {
        documents: stored.into_iter().map(DocumentResponse::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET `/documents/exists?key=`
async fn document_exists(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = state.documents.exists(&query.key).await?;
    Ok(Json(ExistsResponse {
        key: query.key,
        exists,
    }))
}

/// GET `/documents/url?key=`
/// Signed read URL, or 404 when the document is gone.
async fn document_url(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Response, ApiError> {
    match state.documents.signed_url(&query.key).await {
        Ok(presigned) => Ok(Json(SignedUrlResponse {
            success: true,
            url: presigned.url,
            expires_at: presigned.expires_at.to_rfc3339(),
        })
        .into_response()),
        Err(DocumentError::Storage(StorageError::NotFound { .. })) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "msg": "File not found or expired !"
            })),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// GET `/documents/content?key=`
/// Raw document bytes.
async fn document_content(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (bytes, content_type) = state.documents.read(&query.key).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// DELETE `/documents?key=`
async fn delete_document(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state.documents.delete(&query.key).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// DELETE `/documents/folder?prefix=`
async fn delete_folder(
    State(state): State<AppState>,
    Query(query): Query<PrefixQuery>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if query.prefix.is_empty() {
        return Err(AppError::Validation("prefix must not be empty".to_string()).into());
    }
    let deleted = state.documents.delete_folder(&query.prefix).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// DELETE `/users/{email}/documents`
async fn delete_user_documents(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state.documents.delete_user_documents(&email).await?;
    Ok(Json(DeleteResponse { deleted }))
}
