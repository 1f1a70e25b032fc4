/// API routes and handlers
pub mod health;
pub mod middleware;
pub mod site_data;
pub mod translations;
pub mod upload;

use crate::{context::AppContext, error::ApiError};
use axum::{extract::rejection::JsonRejection, Json, Router};

/// Routes served by the translation and site-data service
pub fn translation_routes() -> Router<AppContext> {
    Router::new()
        .merge(health::translation_routes())
        .merge(translations::routes())
        .merge(site_data::routes())
}

/// Routes served by the upload service
pub fn upload_routes() -> Router<AppContext> {
    Router::new()
        .merge(health::upload_routes())
        .merge(upload::routes())
}

/// Unwrap a JSON body, turning extractor rejections into the API error body
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::Validation(e.body_text()))
}
