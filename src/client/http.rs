/// HTTP client for the persistence API
use super::{ClientError, ClientResult};
use crate::{
    error::ErrorResponse,
    json_store::{BulkUpdateRequest, BulkUpdateResponse, Language, TranslationSet},
    upload_store::{
        IncomingFile, MultiUploadResponse, UploadListResponse, UploadResult, UploadStore,
        UploadedFileInfo, MAX_FILES_PER_REQUEST,
    },
};
use async_trait::async_trait;
use reqwest::{multipart, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;

/// Request timeout for every call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Document operations the caches need from the server
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Fetch every language's translation document
    async fn fetch_translations(&self) -> ClientResult<TranslationSet>;

    /// Replace the translation documents of every language in `translations`
    async fn save_translations(
        &self,
        translations: &TranslationSet,
    ) -> ClientResult<BulkUpdateResponse>;

    /// Fetch the site data document
    async fn fetch_site_data(&self) -> ClientResult<Value>;

    /// Replace the site data document
    async fn save_site_data(&self, doc: &Value) -> ClientResult<()>;
}

/// reqwest-backed client for both services
#[derive(Clone)]
pub struct HttpPersistenceClient {
    client: reqwest::Client,
    api_base: String,
    upload_base: String,
}

impl HttpPersistenceClient {
    /// Create a client
    ///
    /// * `api_base` - translation service origin, e.g. `http://localhost:3001`
    /// * `upload_base` - upload service origin, e.g. `http://localhost:3002`
    pub fn new(api_base: impl Into<String>, upload_base: impl Into<String>) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("triple-fun-api/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self::with_client(client, api_base, upload_base))
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    pub fn with_client(
        client: reqwest::Client,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            upload_base: upload_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn upload_url(&self, path: &str) -> String {
        format!("{}{}", self.upload_base, path)
    }

    /// Upload one image through `POST /api/upload/single`
    ///
    /// The file is checked locally first so obviously invalid files never
    /// leave the client.
    pub async fn upload_image(&self, file: &IncomingFile) -> ClientResult<UploadResult> {
        validate_image(file)?;

        let form = multipart::Form::new().part("image", file_part(file)?);
        let response = self
            .client
            .post(self.upload_url("/api/upload/single"))
            .multipart(form)
            .send()
            .await?;

        parse_response(response).await
    }

    /// Upload several images through `POST /api/upload/multiple`
    ///
    /// Files failing the local check are reported as rejected after the
    /// server's results and are not sent.
    pub async fn upload_images(&self, files: &[IncomingFile]) -> ClientResult<MultiUploadResponse> {
        if files.len() > MAX_FILES_PER_REQUEST {
            return Err(ClientError::Validation(format!(
                "Too many files. Maximum is {} per request",
                MAX_FILES_PER_REQUEST
            )));
        }

        let mut local_rejections = Vec::new();
        let mut form = multipart::Form::new();
        let mut sent = 0;
        for file in files {
            match UploadStore::validate(file) {
                Ok(()) => {
                    form = form.part("images", file_part(file)?);
                    sent += 1;
                }
                Err(reason) => local_rejections.push(UploadResult::rejected(file, reason)),
            }
        }

        let mut result = if sent == 0 {
            MultiUploadResponse {
                success: false,
                files: Vec::new(),
                count: 0,
            }
        } else {
            let response = self
                .client
                .post(self.upload_url("/api/upload/multiple"))
                .multipart(form)
                .send()
                .await?;

            // A request where nothing was stored still carries per-file results
            let status = response.status();
            let body = response.text().await?;
            match serde_json::from_str::<MultiUploadResponse>(&body) {
                Ok(parsed) => parsed,
                Err(_) => return Err(status_error(status.as_u16(), &body)),
            }
        };

        result.files.extend(local_rejections);
        Ok(result)
    }

    /// List uploaded images, newest first
    pub async fn list_uploads(&self) -> ClientResult<Vec<UploadedFileInfo>> {
        let response = self
            .client
            .get(self.upload_url("/api/upload/list"))
            .send()
            .await?;

        let list: UploadListResponse = parse_response(response).await?;
        Ok(list.files)
    }

    /// Delete an uploaded image by its stored filename
    pub async fn delete_upload(&self, filename: &str) -> ClientResult<()> {
        let mut url = Url::parse(&self.upload_url("/api/upload"))
            .map_err(|e| ClientError::Validation(format!("Invalid upload URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Validation("Upload URL cannot be a base".to_string()))?
            .push(filename);

        let response = self.client.delete(url).send().await?;
        let _: Value = parse_response(response).await?;
        Ok(())
    }

    /// Whether the upload service answers its health check
    pub async fn upload_server_available(&self) -> bool {
        match self
            .client
            .get(self.upload_url("/api/upload/health"))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "upload server unavailable");
                false
            }
        }
    }
}

#[async_trait]
impl PersistenceClient for HttpPersistenceClient {
    async fn fetch_translations(&self) -> ClientResult<TranslationSet> {
        let response = self
            .client
            .get(self.api_url("/api/translations"))
            .send()
            .await?;

        let documents: Map<String, Value> = parse_response(response).await?;
        Ok(documents
            .into_iter()
            .filter_map(|(code, doc)| code.parse::<Language>().ok().map(|lang| (lang, doc)))
            .collect())
    }

    async fn save_translations(
        &self,
        translations: &TranslationSet,
    ) -> ClientResult<BulkUpdateResponse> {
        let request = BulkUpdateRequest {
            translations: translations
                .iter()
                .map(|(lang, doc)| (lang.code().to_string(), doc.clone()))
                .collect(),
        };

        let response = self
            .client
            .post(self.api_url("/api/translations/bulk"))
            .json(&request)
            .send()
            .await?;

        parse_response(response).await
    }

    async fn fetch_site_data(&self) -> ClientResult<Value> {
        let response = self
            .client
            .get(self.api_url("/api/sitedata"))
            .send()
            .await?;

        parse_response(response).await
    }

    async fn save_site_data(&self, doc: &Value) -> ClientResult<()> {
        let response = self
            .client
            .post(self.api_url("/api/sitedata"))
            .json(doc)
            .send()
            .await?;

        let _: Value = parse_response(response).await?;
        Ok(())
    }
}

/// Check a file against the upload allow list and size limit
pub fn validate_image(file: &IncomingFile) -> ClientResult<()> {
    UploadStore::validate(file).map_err(ClientError::Validation)
}

/// Human-readable size with binary units, e.g. `1.5 MB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

fn file_part(file: &IncomingFile) -> ClientResult<multipart::Part> {
    Ok(multipart::Part::bytes(file.data.clone())
        .file_name(file.original_name.clone())
        .mime_str(&file.mime_type)?)
}

/// Decode a 2xx body, or turn an error body into `ClientError::Status`
async fn parse_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &body))
}

fn status_error(status: u16, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string());
    ClientError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload_store::MAX_FILE_SIZE;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(MAX_FILE_SIZE), "5 MB");
        assert_eq!(format_file_size(1_288_490_189), "1.2 GB");
    }

    #[test]
    fn test_validate_image() {
        let ok = IncomingFile::new("a.webp", "image/webp", vec![1]);
        assert!(validate_image(&ok).is_ok());

        let bad = IncomingFile::new("a.svg", "image/svg+xml", vec![1]);
        assert!(matches!(validate_image(&bad), Err(ClientError::Validation(_))));
    }

    #[test]
    fn test_status_error_prefers_api_message() {
        let body =
            r#"{"success":false,"error":"NotFound","message":"Not found: File not found: a.jpg"}"#;
        match status_error(404, body) {
            ClientError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not found: File not found: a.jpg");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        match status_error(502, "Bad Gateway") {
            ClientError::Status { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_base_urls_are_trimmed() {
        let client =
            HttpPersistenceClient::new("http://localhost:3001/", "http://localhost:3002").unwrap();
        assert_eq!(client.api_url("/api/sitedata"), "http://localhost:3001/api/sitedata");
        assert_eq!(client.upload_url("/api/upload/list"), "http://localhost:3002/api/upload/list");
    }
}
