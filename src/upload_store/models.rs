/// Upload data models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file found in the upload directory
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub filename: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A file part received from a multipart request
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub mime_type: String,
    /// Bytes seen on the wire, which may exceed `data.len()` for rejected parts
    pub size: u64,
    pub data: Vec<u8>,
}

impl IncomingFile {
    pub fn new(
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
        }
    }
}

/// Per-file upload result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub original_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(rename = "mimetype", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    pub fn stored(url: String, filename: String, file: &IncomingFile) -> Self {
        Self {
            success: true,
            url: Some(url),
            filename: Some(filename),
            original_name: file.original_name.clone(),
            size: Some(file.size),
            mime_type: Some(file.mime_type.clone()),
            error: None,
        }
    }

    pub fn rejected(file: &IncomingFile, error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            filename: None,
            original_name: file.original_name.clone(),
            size: Some(file.size),
            mime_type: Some(file.mime_type.clone()),
            error: Some(error.into()),
        }
    }
}

/// Response of `POST /api/upload/multiple`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiUploadResponse {
    pub success: bool,
    pub files: Vec<UploadResult>,
    /// Number of files actually stored
    pub count: usize,
}

/// Entry of `GET /api/upload/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileInfo {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub upload_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

/// Response of `GET /api/upload/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadListResponse {
    pub success: bool,
    pub files: Vec<UploadedFileInfo>,
    pub count: usize,
}
