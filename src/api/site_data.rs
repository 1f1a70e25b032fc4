/// Site data endpoints
use crate::{
    api::json_body,
    context::AppContext,
    error::ApiResult,
    json_store::MutationResponse,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

/// Build site data routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/sitedata", get(get_site_data).post(save_site_data))
}

async fn get_site_data(State(ctx): State<AppContext>) -> ApiResult<Json<Value>> {
    Ok(Json(ctx.site_data.get().await?))
}

/// Replace the whole site data document after schema validation
async fn save_site_data(
    State(ctx): State<AppContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let doc = json_body(payload)?;
    ctx.site_data.put(&doc).await?;

    tracing::info!("site data saved");

    Ok(Json(MutationResponse::ok("Site data saved")))
}
