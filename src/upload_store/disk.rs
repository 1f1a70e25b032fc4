/// Disk-based upload storage backend
use crate::{
    error::{ApiError, ApiResult},
    upload_store::{naming::has_image_extension, StoredFile, UploadBackend},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::{fs, io::AsyncWriteExt};

/// Disk storage backend
///
/// Stores uploads flat in one directory, which is also served read-only
/// under the public upload path.
#[derive(Clone)]
pub struct DiskUploadBackend {
    base_path: PathBuf,
}

impl DiskUploadBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn file_path(&self, filename: &str) -> PathBuf {
        self.base_path.join(filename)
    }

    /// Create the upload directory if it does not exist
    pub async fn ensure_directory(&self) -> ApiResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            ApiError::Storage(format!("Failed to create upload directory: {}", e))
        })
    }
}

#[async_trait]
impl UploadBackend for DiskUploadBackend {
    async fn put(&self, filename: &str, data: &[u8]) -> ApiResult<()> {
        self.ensure_directory().await?;
        let path = self.file_path(filename);

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ApiError::Conflict(format!("File already exists: {}", filename)));
            }
            Err(e) => {
                return Err(ApiError::Storage(format!(
                    "Failed to create upload {}: {}",
                    filename, e
                )));
            }
        };

        let written = async {
            file.write_all(data).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            // Don't leave a truncated image behind
            let _ = fs::remove_file(&path).await;
            return Err(ApiError::Storage(format!(
                "Failed to write upload {}: {}",
                filename, e
            )));
        }

        Ok(())
    }

    async fn delete(&self, filename: &str) -> ApiResult<()> {
        match fs::remove_file(self.file_path(filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ApiError::NotFound(format!("File not found: {}", filename)))
            }
            Err(e) => Err(ApiError::Storage(format!(
                "Failed to delete upload {}: {}",
                filename, e
            ))),
        }
    }

    async fn list(&self) -> ApiResult<Vec<StoredFile>> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ApiError::Storage(format!(
                    "Failed to read upload directory: {}",
                    e
                )))
            }
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ApiError::Storage(format!("Failed to read upload directory: {}", e)))?
        {
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !has_image_extension(&filename) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(filename = %filename, error = %e, "skipping unreadable upload");
                    continue;
                }
            };

            let modified_at: DateTime<Utc> = metadata
                .modified()
                .map(DateTime::from)
                .unwrap_or_else(|_| Utc::now());
            // Not every filesystem records creation time
            let created_at = metadata
                .created()
                .map(DateTime::from)
                .unwrap_or(modified_at);

            files.push(StoredFile {
                filename,
                size: metadata.len(),
                created_at,
                modified_at,
            });
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_list() {
        let dir = tempdir().unwrap();
        let backend = DiskUploadBackend::new(dir.path().to_path_buf());

        backend.put("cake-1-aaaaaaaaaaaa.jpg", b"jpeg bytes").await.unwrap();
        assert!(dir.path().join("cake-1-aaaaaaaaaaaa.jpg").is_file());

        let files = backend.list().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "cake-1-aaaaaaaaaaaa.jpg");
        assert_eq!(files[0].size, 10);
    }

    #[tokio::test]
    async fn test_put_never_overwrites() {
        let dir = tempdir().unwrap();
        let backend = DiskUploadBackend::new(dir.path().to_path_buf());

        backend.put("a.png", b"first").await.unwrap();
        let err = backend.put("a.png", b"second").await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let data = std::fs::read(dir.path().join("a.png")).unwrap();
        assert_eq!(data, b"first");
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let backend = DiskUploadBackend::new(dir.path().to_path_buf());

        let err = backend.delete("missing.jpg").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_skips_non_images_and_dirs() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();
        std::fs::write(dir.path().join("photo.webp"), b"x").unwrap();

        let backend = DiskUploadBackend::new(dir.path().to_path_buf());
        let files = backend.list().await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["photo.webp"]);
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let backend = DiskUploadBackend::new(dir.path().join("absent"));
        assert!(backend.list().await.unwrap().is_empty());
    }
}
