//! Conversion of domain errors into JSON HTTP responses.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docstore_core::{document::DocumentError, storage::StorageError};
use docstore_shared::AppError;
use serde_json::json;
use tracing::error;

/// Error returned by route handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound { key } => AppError::NotFound(key),
            StorageError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            StorageError::InvalidKey(msg) => AppError::Validation(msg),
            StorageError::PresignNotSupported => AppError::ServiceUnavailable(err.to_string()),
            StorageError::Configuration(_) | StorageError::Operation(_) => {
                error!(error = %err, "Storage operation failed");
                AppError::Storage("Storage operation failed".to_string())
            }
        };
        Self(app)
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Storage(storage_err) => storage_err.into(),
            DocumentError::UnsupportedExtension { .. } => {
                Self(AppError::UnsupportedMediaType(err.to_string()))
            }
            DocumentError::MissingField(_)
            | DocumentError::InvalidEmail(_)
            | DocumentError::NoFiles => {
                Self(AppError::Validation(err.to_string()))
            }
            DocumentError::DuplicateKey(_) => Self(AppError::Conflict(err.to_string())),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self(AppError::PayloadTooLarge(err.body_text()))
        } else {
            Self(AppError::Validation(format!("invalid multipart body: {}", err.body_text())))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.to_string()
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DocumentError::unsupported_extension("a.exe", ".exe"), StatusCode::UNSUPPORTED_MEDIA_TYPE)]
    #[case(DocumentError::MissingField("email"), StatusCode::BAD_REQUEST)]
    #[case(DocumentError::InvalidEmail("a/../b".into()), StatusCode::BAD_REQUEST)]
    #[case(DocumentError::NoFiles, StatusCode::BAD_REQUEST)]
    #[case(DocumentError::DuplicateKey("k".into()), StatusCode::CONFLICT)]
    #[case(DocumentError::Storage(StorageError::not_found("k")), StatusCode::NOT_FOUND)]
    #[case(
        DocumentError::Storage(StorageError::file_too_large(2, 1)),
        StatusCode::PAYLOAD_TOO_LARGE
    )]
    #[case(
        DocumentError::Storage(StorageError::PresignNotSupported),
        StatusCode::SERVICE_UNAVAILABLE
    )]
    #[case(
        DocumentError::Storage(StorageError::operation("boom")),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_document_error_status(#[case] err: DocumentError, #[case] expected: StatusCode) {
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), expected);
    }
}
