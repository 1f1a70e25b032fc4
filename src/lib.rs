/// Triple Fun persistence service
///
/// HTTP persistence for the Triple Fun party venue website: per-language
/// translation documents, the site data document and uploaded images, plus
/// the client-side caches that read and write them.

pub mod api;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod json_store;
pub mod metrics;
pub mod server;
pub mod upload_store;
pub mod validation;

pub use config::ServerConfig;
pub use context::AppContext;
pub use error::{ApiError, ApiResult};
