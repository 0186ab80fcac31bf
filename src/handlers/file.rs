use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{Method, StatusCode},
};
use tracing::{error, info, warn};

use crate::{
    dto::file::FileUploadResponse, error::UploadError, models::file::NewFile, AppState,
};

/// Multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Room for boundaries, part headers and small text fields on top of the
/// file itself.
pub const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Request body limit for a file bound of `max_file_bytes`.
pub fn body_limit(max_file_bytes: usize) -> usize {
    max_file_bytes.saturating_add(FORM_OVERHEAD_BYTES)
}

#[utoipa::path(
    post,
    path = "/add",
    request_body(content = String, content_type = "multipart/form-data", description = "One file in the `file` field"),
    params(
        ("Authorization" = String, Header, description = "Shared upload secret")
    ),
    responses(
        (status = 201, description = "File stored", body = String),
        (status = 400, description = "Malformed form or missing file", body = String),
        (status = 401, description = "Authorization header does not match", body = String),
        (status = 405, description = "Method other than POST", body = String),
        (status = 500, description = "Read or database failure", body = String)
    ),
    tag = "file"
)]
pub async fn upload_file(
    method: Method,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, String), UploadError> {
    let result = store_upload(method, &state, multipart).await;
    match &result {
        Ok(_) => {}
        Err(e @ UploadError::Store(_)) => {
            error!(error = %e, "Failed to save file to database");
        }
        Err(e @ UploadError::ReadFailed(_)) => {
            error!(error = %e, "Failed to read uploaded file");
        }
        Err(e) => {
            info!(error = %e, status = %e.status(), "Upload rejected");
        }
    }
    result
}

async fn store_upload(
    method: Method,
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, String), UploadError> {
    if method != Method::POST {
        return Err(UploadError::MethodNotAllowed);
    }

    let mut multipart = multipart.map_err(|e| UploadError::MalformedForm(e.body_text()))?;
    let file = read_file_field(&mut multipart, state.config.upload.max_file_bytes).await?;
    file.validate().map_err(UploadError::InvalidMetadata)?;

    // Dropping this future (client went away) aborts the query.
    let id = state.file_store.insert(&file).await?;

    info!(
        id,
        filename = %file.filename,
        mime_type = %file.mime_type,
        size = file.size(),
        "File uploaded"
    );

    Ok((StatusCode::CREATED, FileUploadResponse { id }.to_string()))
}

/// Returns the first part named `file`. Parts of other names are skipped;
/// a `file` part without a filename is a plain form value, not a file.
async fn read_file_field(
    multipart: &mut Multipart,
    max_file_bytes: usize,
) -> Result<NewFile, UploadError> {
    while let Some(mut field) = multipart.next_field().await.map_err(classify)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = match field.file_name().map(base_name) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                warn!("Form field `file` carries no filename");
                return Err(UploadError::MissingFile);
            }
        };
        let mime_type = field
            .content_type()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        let mut content = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(classify)? {
            if content.len() + chunk.len() > max_file_bytes {
                return Err(UploadError::MalformedForm(format!(
                    "file exceeds {max_file_bytes} bytes"
                )));
            }
            content.extend_from_slice(&chunk);
        }
        return Ok(NewFile::new(filename, mime_type, content));
    }

    Err(UploadError::MissingFile)
}

/// Drops any client-side directory part, `/` or `\` separated.
fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// Size-limit and encoding errors are the client's fault; anything else
/// is a failed read.
fn classify(err: MultipartError) -> UploadError {
    if err.status().is_client_error() {
        UploadError::MalformedForm(err.body_text())
    } else {
        UploadError::ReadFailed(err.body_text())
    }
}
