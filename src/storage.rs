use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub const UPLOAD_CATEGORIES: &[&str] = &["screenshots", "certificates", "documents"];

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif"];
const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid stored path: {0}")]
    InvalidPath(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

pub fn is_valid_category(category: &str) -> bool {
    UPLOAD_CATEGORIES.iter().any(|allowed| *allowed == category)
}

/// Mime types accepted for a category. Screenshots are images, certificates
/// may be a scan or a PDF, documents are office formats.
pub fn allowed_mime_types(category: &str) -> &'static [&'static str] {
    match category {
        "screenshots" => IMAGE_TYPES,
        "certificates" => {
            const CERT_TYPES: &[&str] = &[
                "image/jpeg",
                "image/jpg",
                "image/png",
                "image/gif",
                "application/pdf",
            ];
            CERT_TYPES
        }
        "documents" => DOCUMENT_TYPES,
        _ => &[],
    }
}

pub fn is_allowed_mime(category: &str, mime: &str) -> bool {
    allowed_mime_types(category)
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(mime))
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
const CERTIFICATE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "pdf"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx"];

pub fn allowed_extensions(category: &str) -> &'static [&'static str] {
    match category {
        "screenshots" => IMAGE_EXTENSIONS,
        "certificates" => CERTIFICATE_EXTENSIONS,
        "documents" => DOCUMENT_EXTENSIONS,
        _ => &[],
    }
}

/// Extension check runs alongside the mime check because the declared content
/// type is client-controlled.
pub fn is_allowed_extension(category: &str, original_name: &str) -> bool {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension {
        Some(ext) => allowed_extensions(category)
            .iter()
            .any(|allowed| *allowed == ext),
        None => false,
    }
}

/// Generates a collision-free stored filename, keeping the original extension
/// so served files get a sensible content type.
pub fn generate_filename(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension {
        Some(ext) if !ext.is_empty() => format!("{}.{ext}", Uuid::new_v4()),
        _ => Uuid::new_v4().to_string(),
    }
}

#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Writes `bytes` under the category directory and returns the public
    /// path (`/uploads/<category>/<filename>`).
    async fn store(&self, category: &str, filename: &str, bytes: Vec<u8>)
        -> StorageResult<String>;

    /// Removes a previously stored file by its public path. Missing files are
    /// not an error.
    async fn remove(&self, public_path: &str) -> StorageResult<()>;
}

/// Disk-backed store rooted at the configured upload directory.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, public_path: &str) -> StorageResult<PathBuf> {
        let relative = public_path
            .strip_prefix("/uploads/")
            .ok_or_else(|| StorageError::InvalidPath(public_path.to_string()))?;
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return Err(StorageError::InvalidPath(public_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(
        &self,
        category: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> StorageResult<String> {
        let dir = self.root.join(category);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(filename), bytes).await?;
        Ok(format!("/uploads/{category}/{filename}"))
    }

    async fn remove(&self, public_path: &str) -> StorageResult<()> {
        let target = self.resolve(public_path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
