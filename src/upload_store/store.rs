/// Upload Store Manager
///
/// Validates incoming image files, names them, and coordinates the storage
/// backend.
use crate::{
    error::{ApiError, ApiResult},
    metrics,
    upload_store::{
        disk::DiskUploadBackend,
        naming::{generate_filename, validate_filename},
        IncomingFile, UploadBackend, UploadResult, UploadedFileInfo, ALLOWED_MIME_TYPES,
        MAX_FILE_SIZE,
    },
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Attempts at finding an unused generated name before giving up
const NAME_ATTEMPTS: usize = 3;

/// Upload store configuration
#[derive(Debug, Clone)]
pub struct UploadStoreConfig {
    /// Directory the files are written to
    pub directory: PathBuf,
    /// URL prefix the directory is served under, e.g. `/uploads`
    pub public_prefix: String,
}

/// Main upload store manager
#[derive(Clone)]
pub struct UploadStore {
    config: UploadStoreConfig,
    backend: Arc<dyn UploadBackend>,
}

impl UploadStore {
    /// Create an upload store on local disk
    pub fn new(config: UploadStoreConfig) -> Self {
        let backend = Arc::new(DiskUploadBackend::new(config.directory.clone()));
        Self { config, backend }
    }

    /// Create an upload store over a custom backend
    pub fn with_backend(config: UploadStoreConfig, backend: Arc<dyn UploadBackend>) -> Self {
        Self { config, backend }
    }

    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    /// Public URL of a stored file
    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.config.public_prefix.trim_end_matches('/'), filename)
    }

    /// Check a file against the MIME allow list and size limit
    pub fn validate(file: &IncomingFile) -> Result<(), String> {
        if !is_allowed_mime_type(&file.mime_type) {
            return Err(format!(
                "File type {} is not allowed. Allowed types: {}",
                file.mime_type,
                ALLOWED_MIME_TYPES.join(", ")
            ));
        }
        if file.size > MAX_FILE_SIZE {
            return Err(format!(
                "File is too large ({} bytes). Maximum size is {} bytes",
                file.size, MAX_FILE_SIZE
            ));
        }
        Ok(())
    }

    /// Validate and store one file
    ///
    /// Validation failures come back as a rejected result; storage failures
    /// are errors.
    pub async fn store(&self, file: &IncomingFile) -> ApiResult<UploadResult> {
        if let Err(reason) = Self::validate(file) {
            let outcome = if is_allowed_mime_type(&file.mime_type) {
                "rejected_size"
            } else {
                "rejected_type"
            };
            metrics::record_upload(outcome, file.size);
            tracing::info!(
                original_name = %file.original_name,
                reason = %reason,
                "upload rejected"
            );
            return Ok(UploadResult::rejected(file, reason));
        }

        let mut last_error = None;
        for _ in 0..NAME_ATTEMPTS {
            let filename = generate_filename(&file.original_name, &file.mime_type, Utc::now());
            match self.backend.put(&filename, &file.data).await {
                Ok(()) => {
                    metrics::record_upload("stored", file.size);
                    tracing::info!(
                        filename = %filename,
                        original_name = %file.original_name,
                        size = file.size,
                        "upload stored"
                    );
                    let url = self.public_url(&filename);
                    return Ok(UploadResult::stored(url, filename, file));
                }
                Err(ApiError::Conflict(msg)) => {
                    tracing::warn!(filename = %filename, "generated upload name taken, retrying");
                    last_error = Some(ApiError::Conflict(msg));
                }
                Err(e) => {
                    metrics::record_upload("failed", file.size);
                    return Err(e);
                }
            }
        }

        metrics::record_upload("failed", file.size);
        Err(last_error
            .unwrap_or_else(|| ApiError::Internal("No upload name attempts were made".to_string())))
    }

    /// Store several files, reporting each one independently
    pub async fn store_many(&self, files: &[IncomingFile]) -> Vec<UploadResult> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let result = match self.store(file).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(
                        original_name = %file.original_name,
                        error = %e,
                        "failed to store upload"
                    );
                    UploadResult::rejected(file, "Failed to store file")
                }
            };
            results.push(result);
        }
        results
    }

    /// List stored images, newest first
    pub async fn list(&self) -> ApiResult<Vec<UploadedFileInfo>> {
        let mut files = self.backend.list().await?;
        files.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.filename.cmp(&b.filename))
        });

        Ok(files
            .into_iter()
            .map(|f| UploadedFileInfo {
                url: self.public_url(&f.filename),
                filename: f.filename,
                size: f.size,
                upload_date: f.created_at,
                modified_date: f.modified_at,
            })
            .collect())
    }

    /// Delete a stored file by name
    pub async fn delete(&self, filename: &str) -> ApiResult<()> {
        if let Err(e) = validate_filename(filename) {
            metrics::record_upload_delete("rejected");
            return Err(e);
        }

        match self.backend.delete(filename).await {
            Ok(()) => {
                metrics::record_upload_delete("deleted");
                tracing::info!(filename = %filename, "upload deleted");
                Ok(())
            }
            Err(e) => {
                let outcome = match e {
                    ApiError::NotFound(_) => "not_found",
                    _ => "failed",
                };
                metrics::record_upload_delete(outcome);
                Err(e)
            }
        }
    }
}

/// Whether a MIME type is on the allow list
pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_type)
}
