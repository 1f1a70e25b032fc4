/// Upload Storage System
///
/// Handles uploaded image files for the galleries and admin panel.
/// Files are stored flat under the upload directory with generated names.

pub mod disk;
pub mod models;
pub mod naming;
pub mod store;

pub use models::*;
pub use store::{is_allowed_mime_type, UploadStore, UploadStoreConfig};

use crate::error::ApiResult;
use async_trait::async_trait;

/// Maximum size of a single uploaded file (5 MiB)
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum number of files in one multi-file upload request
pub const MAX_FILES_PER_REQUEST: usize = 10;

/// MIME types accepted for upload
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// File extensions recognised as images when listing
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Upload storage backend trait
///
/// Implementations handle the actual storage of uploaded files.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Store a new file; never overwrites an existing one
    async fn put(&self, filename: &str, data: &[u8]) -> ApiResult<()>;

    /// Delete a file, returning `NotFound` when it does not exist
    async fn delete(&self, filename: &str) -> ApiResult<()>;

    /// List stored image files with their filesystem metadata
    async fn list(&self) -> ApiResult<Vec<StoredFile>>;
}
