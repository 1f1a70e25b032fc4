/// Health and metrics endpoints
///
/// Both services expose a health document and the Prometheus scrape
/// endpoint. The upload service's health also advertises the upload limits
/// so clients can validate files before sending them.
use crate::{
    context::AppContext,
    metrics,
    upload_store::{ALLOWED_MIME_TYPES, MAX_FILE_SIZE},
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name reported by the upload service health check
pub const UPLOAD_SERVER_NAME: &str = "Triple Fun Upload Server";

/// Health of the translation and site-data service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Always "OK" while the process can answer
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: f64,
}

/// Health of the upload service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadHealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub server: String,
    pub version: String,
    pub upload_dir: String,
    pub max_file_size: u64,
    pub allowed_types: Vec<String>,
}

/// Routes mounted on the translation service
pub fn translation_routes() -> Router<AppContext> {
    Router::new()
        .route("/api/health", get(health_basic))
        .route("/metrics", get(metrics_endpoint))
}

/// Routes mounted on the upload service
pub fn upload_routes() -> Router<AppContext> {
    Router::new()
        .route("/api/upload/health", get(upload_health))
        .route("/metrics", get(metrics_endpoint))
}

/// Basic health check
pub async fn health_basic(State(ctx): State<AppContext>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        version: ctx.config.service.version.clone(),
        uptime_seconds: ctx.uptime_seconds(),
    })
}

/// Upload service health check
pub async fn upload_health(State(ctx): State<AppContext>) -> Json<UploadHealthStatus> {
    Json(UploadHealthStatus {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        server: UPLOAD_SERVER_NAME.to_string(),
        version: ctx.config.service.version.clone(),
        upload_dir: ctx.uploads.directory().display().to_string(),
        max_file_size: MAX_FILE_SIZE,
        allowed_types: ALLOWED_MIME_TYPES.iter().map(|t| t.to_string()).collect(),
    })
}

/// Prometheus scrape endpoint
pub async fn metrics_endpoint(State(ctx): State<AppContext>) -> impl IntoResponse {
    metrics::set_uptime(ctx.uptime_seconds());

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}
