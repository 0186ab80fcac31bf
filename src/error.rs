use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Persistence gateway errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("file store is closed")]
    Closed,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure paths of `POST /add`.
///
/// Response bodies are fixed strings; the underlying cause is only logged.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("malformed multipart body: {0}")]
    MalformedForm(String),

    #[error("no file in form field `file`")]
    MissingFile,

    #[error("invalid file metadata: {0}")]
    InvalidMetadata(String),

    #[error("failed to read file content: {0}")]
    ReadFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            UploadError::MalformedForm(_)
            | UploadError::MissingFile
            | UploadError::InvalidMetadata(_) => StatusCode::BAD_REQUEST,
            UploadError::ReadFailed(_) | UploadError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            UploadError::MethodNotAllowed => "Method not allowed",
            UploadError::MalformedForm(_) => "Failed to parse form",
            UploadError::MissingFile => "Failed to get file",
            UploadError::InvalidMetadata(_) => "Invalid file metadata",
            UploadError::ReadFailed(_) => "Failed to read file",
            UploadError::Store(_) => "Failed to save file to database",
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}
