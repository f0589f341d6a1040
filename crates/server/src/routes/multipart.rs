//! Reading uploaded files out of multipart bodies.

use axum::extract::Multipart;

use crate::error::{AppError, Result};

/// Request body limit for upload routes.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One file part of a multipart body.
#[derive(Debug)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Collect every file part; non-file fields are skipped.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a malformed body.
pub async fn read_files(mut multipart: Multipart) -> Result<Vec<FilePart>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read {file_name}: {e}")))?;
        files.push(FilePart {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

/// The single file of a one-file upload.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when no file was sent.
pub async fn read_one(multipart: Multipart) -> Result<FilePart> {
    read_files(multipart)
        .await?
        .into_iter()
        .find(|f| !f.bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("no file uploaded".to_string()))
}
