/// Translation endpoints
use crate::{
    api::json_body,
    context::AppContext,
    error::ApiResult,
    json_store::{
        BulkUpdateRequest, BulkUpdateResponse, Language, MutationResponse, TranslationSet,
        UpdateKeyRequest,
    },
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

/// Build translation routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/translations", get(get_translations))
        .route("/api/translations/bulk", post(bulk_update))
        .route("/api/translations/:lang/:key", post(update_key))
}

/// Get every language's document
///
/// Unreadable languages come back as placeholders, so this never fails.
async fn get_translations(State(ctx): State<AppContext>) -> Json<TranslationSet> {
    Json(ctx.translations.load_all().await)
}

/// Set a single string leaf addressed by a dotted key
async fn update_key(
    State(ctx): State<AppContext>,
    Path((lang, key)): Path<(String, String)>,
    payload: Result<Json<UpdateKeyRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let language: Language = lang.parse()?;
    let request = json_body(payload)?;

    ctx.translations
        .update_key(language, &key, Value::String(request.value))
        .await?;

    tracing::info!(language = %language, key = %key, "translation updated");

    Ok(Json(MutationResponse::ok(format!(
        "Translation {} updated for {}",
        key, language
    ))))
}

/// Replace whole documents for several languages at once
async fn bulk_update(
    State(ctx): State<AppContext>,
    payload: Result<Json<BulkUpdateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BulkUpdateResponse>)> {
    let request = json_body(payload)?;

    let report = ctx.translations.bulk_replace(&request.translations).await?;

    let success = report.all_succeeded();
    let (status, error, message) = if report.results.is_empty() {
        tracing::debug!(
            ignored = ?report.ignored,
            "bulk translation update had no supported languages"
        );
        (StatusCode::OK, None, "No supported languages to save".to_string())
    } else if success {
        (StatusCode::OK, None, "All translations saved".to_string())
    } else {
        let failed: Vec<_> = report
            .failed_languages()
            .iter()
            .map(|l| l.code())
            .collect();
        tracing::warn!(failed = ?failed, "bulk translation update partially failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("InternalServerError".to_string()),
            format!("Failed to save translations for: {}", failed.join(", ")),
        )
    };

    Ok((
        status,
        Json(BulkUpdateResponse {
            success,
            error,
            message,
            results: report.results,
            ignored: report.ignored,
        }),
    ))
}
