use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    storage::{generate_filename, is_allowed_extension, is_allowed_mime, is_valid_category},
};

#[derive(Serialize)]
pub struct UploadedFile {
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub path: String,
    pub category: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub files: Vec<UploadedFile>,
}

struct PendingFile {
    original_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

/// Accepts a `category` text field plus one or more `files` parts. Every part
/// is validated against the category's allow-lists and the configured size
/// cap before anything touches disk.
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let mut category: Option<String> = None;
    let mut pending: Vec<PendingFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        match field.name() {
            Some("category") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                category = Some(value.trim().to_string());
            }
            Some("files") => {
                let original_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.trim().is_empty())
                    .ok_or_else(|| AppError::bad_request("file part is missing a filename"))?;
                let mime_type = match field.content_type() {
                    Some(mime) => mime.to_string(),
                    None => mime_guess::from_path(&original_name)
                        .first()
                        .map(|mime| mime.essence_str().to_string())
                        .ok_or_else(|| {
                            AppError::bad_request("file part is missing a content type")
                        })?,
                };
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                pending.push(PendingFile {
                    original_name,
                    mime_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let category = category
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("category field is required"))?;
    if !is_valid_category(&category) {
        return Err(AppError::bad_request(format!(
            "unknown upload category {category:?}"
        )));
    }
    if pending.is_empty() {
        return Err(AppError::bad_request("no files provided"));
    }

    let max_size = state.config.max_file_size as usize;
    for file in &pending {
        if file.bytes.is_empty() {
            return Err(AppError::bad_request(format!(
                "{} is empty",
                file.original_name
            )));
        }
        if file.bytes.len() > max_size {
            return Err(AppError::bad_request(format!(
                "{} exceeds the maximum file size of {} bytes",
                file.original_name, max_size
            )));
        }
        if !is_allowed_mime(&category, &file.mime_type) {
            return Err(AppError::bad_request(format!(
                "{} is not allowed for {category}: unsupported type {}",
                file.original_name, file.mime_type
            )));
        }
        if !is_allowed_extension(&category, &file.original_name) {
            return Err(AppError::bad_request(format!(
                "{} is not allowed for {category}: unsupported extension",
                file.original_name
            )));
        }
    }

    let mut stored = Vec::with_capacity(pending.len());
    for file in pending {
        let filename = generate_filename(&file.original_name);
        let size_bytes = file.bytes.len() as i64;
        let path = state
            .files
            .store(&category, &filename, file.bytes)
            .await
            .map_err(AppError::internal)?;

        tracing::debug!(category = %category, filename = %filename, size_bytes, "stored upload");

        stored.push(UploadedFile {
            filename,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size_bytes,
            path,
            category: category.clone(),
        });
    }

    Ok((StatusCode::CREATED, Json(UploadResponse { files: stored })))
}
