/// Image upload endpoints
use crate::{
    context::AppContext,
    error::{ApiError, ApiResult},
    json_store::MutationResponse,
    upload_store::{
        is_allowed_mime_type, IncomingFile, MultiUploadResponse, UploadListResponse, UploadResult,
        MAX_FILES_PER_REQUEST, MAX_FILE_SIZE,
    },
};
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

/// Multipart field carrying the file of a single upload
pub const SINGLE_FIELD: &str = "image";

/// Multipart field carrying the files of a multi-file upload
pub const MULTIPLE_FIELD: &str = "images";

/// Build upload routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/upload/single", post(upload_single))
        .route("/api/upload/multiple", post(upload_multiple))
        .route("/api/upload/list", get(list_uploads))
        .route("/api/upload/:filename", delete(delete_upload))
}

/// Upload one image from the `image` field
async fn upload_single(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResult>> {
    let multipart = multipart.map_err(|e| ApiError::Validation(e.body_text()))?;
    let files = read_files(multipart, SINGLE_FIELD, 1).await?;

    let file = files
        .first()
        .ok_or_else(|| ApiError::Validation("No file uploaded".to_string()))?;

    let result = ctx.uploads.store(file).await?;
    if !result.success {
        return Err(ApiError::Validation(
            result.error.unwrap_or_else(|| "File rejected".to_string()),
        ));
    }

    Ok(Json(result))
}

/// Upload up to ten images from the `images` field
///
/// Each file is accepted or rejected on its own; the request fails only if
/// nothing was stored.
async fn upload_multiple(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<MultiUploadResponse>)> {
    let multipart = multipart.map_err(|e| ApiError::Validation(e.body_text()))?;
    let files = read_files(multipart, MULTIPLE_FIELD, MAX_FILES_PER_REQUEST).await?;

    if files.is_empty() {
        return Err(ApiError::Validation("No files uploaded".to_string()));
    }

    let results = ctx.uploads.store_many(&files).await;
    let count = results.iter().filter(|r| r.success).count();
    let status = if count > 0 {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    tracing::info!(received = files.len(), stored = count, "multi-file upload processed");

    Ok((
        status,
        Json(MultiUploadResponse {
            success: count > 0,
            files: results,
            count,
        }),
    ))
}

async fn list_uploads(State(ctx): State<AppContext>) -> ApiResult<Json<UploadListResponse>> {
    let files = ctx.uploads.list().await?;

    Ok(Json(UploadListResponse {
        success: true,
        count: files.len(),
        files,
    }))
}

async fn delete_upload(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
) -> ApiResult<Json<MutationResponse>> {
    ctx.uploads.delete(&filename).await?;
    Ok(Json(MutationResponse::ok(format!("File {} deleted", filename))))
}

/// Read every file part of a multipart body before anything is written
///
/// Text fields are skipped. A file part under any other field name, or more
/// than `max_files` file parts, rejects the whole request.
async fn read_files(
    mut multipart: Multipart,
    field_name: &str,
    max_files: usize,
) -> ApiResult<Vec<IncomingFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let name = field.name().unwrap_or_default();
        if name != field_name {
            return Err(ApiError::Validation(format!(
                "Unexpected file field '{}', expected '{}'",
                name, field_name
            )));
        }

        if files.len() == max_files {
            return Err(ApiError::Validation(format!(
                "Too many files. Maximum is {} per request",
                max_files
            )));
        }

        files.push(read_file(field, original_name).await?);
    }

    Ok(files)
}

/// Buffer one file part, keeping at most `MAX_FILE_SIZE` bytes
///
/// Parts with a disallowed MIME type or over the size limit are drained
/// without being kept, so the store can reject them with their real size.
async fn read_file(mut field: Field<'_>, original_name: String) -> ApiResult<IncomingFile> {
    let mime_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let keep = is_allowed_mime_type(&mime_type);

    let mut size: u64 = 0;
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        if keep && size <= MAX_FILE_SIZE {
            data.extend_from_slice(&chunk);
        } else if !data.is_empty() {
            data = Vec::new();
        }
    }

    tracing::debug!(
        original_name = %original_name,
        mime_type = %mime_type,
        size,
        "received file part"
    );

    Ok(IncomingFile {
        original_name,
        mime_type,
        size,
        data,
    })
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::Validation(e.body_text())
    }
}
