//! Storage for admin-uploaded media.
//!
//! Files land in the configured upload directory under a fresh
//! `<uuid>.<ext>` name; the original filename only contributes its
//! (normalised) extension.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Public URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Extensions accepted for upload.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "mp4", "webm", "mov", "mp3", "m4a", "wav", "ogg",
    "pdf",
];

/// Upload errors.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file provided")]
    MissingFile,

    #[error("file is empty")]
    EmptyFile,

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("failed to store file: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// File name inside the upload directory.
    pub file_name: String,
    /// Public URL (`/uploads/<file_name>`).
    pub url: String,
}

/// Writes uploads to disk.
#[derive(Debug, Clone)]
pub struct UploadService {
    dir: PathBuf,
}

impl UploadService {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory uploads are written to (and served from).
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store `bytes` under a fresh name derived from `original_name`.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::EmptyFile` for empty bodies,
    /// `UploadError::UnsupportedType` for extensions outside the allowlist and
    /// `UploadError::Io` if the file cannot be written.
    pub async fn store(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredUpload, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        let extension = sanitize_extension(original_name.unwrap_or_default())?;
        let file_name = format!("{}.{extension}", Uuid::new_v4());

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        tracing::info!(file_name = %file_name, size = bytes.len(), "Upload stored");
        Ok(StoredUpload {
            url: format!("{PUBLIC_PREFIX}/{file_name}"),
            file_name,
        })
    }
}

/// Lower-cased extension of `name`, if it is on the allowlist.
fn sanitize_extension(name: &str) -> Result<String, UploadError> {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| e.bytes().all(|b| b.is_ascii_alphanumeric()))
        .ok_or_else(|| UploadError::UnsupportedType(name.to_string()))?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadError::UnsupportedType(extension));
    }
    Ok(extension)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_extension() {
        assert_eq!(sanitize_extension("Photo.JPG").unwrap(), "jpg");
        assert_eq!(sanitize_extension("../../etc/clip.mp4").unwrap(), "mp4");
        assert!(sanitize_extension("noextension").is_err());
        assert!(sanitize_extension("script.svg").is_err());
        assert!(sanitize_extension("archive.tar.gz").is_err());
    }

    #[tokio::test]
    async fn test_store_writes_uuid_named_file() {
        let dir = std::env::temp_dir().join(format!("mff-uploads-{}", Uuid::new_v4()));
        let service = UploadService::new(dir.clone());

        let stored = service.store(Some("hymn.mp3"), b"ID3").await.unwrap();

        assert!(stored.file_name.ends_with(".mp3"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.file_name));
        let written = tokio::fs::read(dir.join(&stored.file_name)).await.unwrap();
        assert_eq!(written, b"ID3");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_rejects_empty_file() {
        let service = UploadService::new(std::env::temp_dir());
        assert!(matches!(
            service.store(Some("a.png"), b"").await,
            Err(UploadError::EmptyFile)
        ));
    }
}
