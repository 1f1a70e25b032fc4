/// HTTP server setup and routing
///
/// One process runs two listeners: the translation and site-data service,
/// and the upload service.
use crate::{
    api::{self, middleware::track_metrics},
    context::AppContext,
    error::{ApiError, ApiResult},
    upload_store::{MAX_FILES_PER_REQUEST, MAX_FILE_SIZE},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    middleware,
    response::Json,
    Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::info;

/// Largest multipart body accepted by the upload service
///
/// Room for every file at its size limit plus multipart framing; individual
/// files are still limited to `MAX_FILE_SIZE` while being read.
pub const UPLOAD_BODY_LIMIT: usize =
    MAX_FILE_SIZE as usize * (MAX_FILES_PER_REQUEST + 1) + 1024 * 1024;

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the translation and site-data router
///
/// Returns Router<()> because state is already provided
pub fn build_translation_router(ctx: AppContext) -> Router {
    let i18n = ServeDir::new(&ctx.config.storage.i18n_directory);
    let site_data = ServeFile::new(&ctx.config.storage.site_data_path);

    Router::new()
        .merge(api::translation_routes())
        .with_state(ctx)
        .nest_service("/i18n", i18n)
        .route_service("/data/defaultSiteData.json", site_data)
        .layer(middleware::from_fn(track_metrics))
        .layer(cors())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// Build the upload router
pub fn build_upload_router(ctx: AppContext) -> Router {
    let public_path = ctx.config.uploads.public_path.trim_end_matches('/').to_string();
    let uploads = ServeDir::new(&ctx.config.storage.upload_directory);

    let router = Router::new()
        .merge(api::upload_routes())
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    // An empty prefix would mount the directory at the root
    let router = if public_path.is_empty() {
        router.fallback_service(uploads)
    } else {
        router.nest_service(&public_path, uploads).fallback(not_found)
    };

    router
        .layer(middleware::from_fn(track_metrics))
        .layer(cors())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Bind a listener, mapping failures to a startup error
async fn bind(hostname: &str, port: u16) -> ApiResult<tokio::net::TcpListener> {
    let addr = format!("{}:{}", hostname, port);
    tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to bind to {}: {}", addr, e)))
}

/// Start both HTTP services and run until ctrl-c
pub async fn serve(ctx: AppContext) -> ApiResult<()> {
    let hostname = ctx.config.service.hostname.clone();
    let translation_listener = bind(&hostname, ctx.config.service.translation_port).await?;
    let upload_listener = bind(&hostname, ctx.config.service.upload_port).await?;

    info!(
        "🌍 Translation service listening on {}",
        translation_listener.local_addr()?
    );
    info!("   i18n directory: {}", ctx.config.storage.i18n_directory.display());
    info!("   site data: {}", ctx.config.storage.site_data_path.display());
    info!("📸 Upload service listening on {}", upload_listener.local_addr()?);
    info!("   upload directory: {}", ctx.config.storage.upload_directory.display());

    let translation_app = build_translation_router(ctx.clone());
    let upload_app = build_upload_router(ctx);

    let translation_server = async {
        axum::serve(translation_listener, translation_app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Internal(format!("Translation server error: {}", e)))
    };
    let upload_server = async {
        axum::serve(upload_listener, upload_app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Internal(format!("Upload server error: {}", e)))
    };

    tokio::try_join!(translation_server, upload_server)?;

    info!("servers stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
