/// Client-side access to the persistence API
///
/// The website front end keeps translations and site data in memory and
/// writes them back to the server on demand. These caches reproduce that
/// behaviour for Rust consumers: they serve from memory, fall back to
/// built-in defaults when the server is unreachable, and persist admin
/// state in a key-value local storage.

pub mod defaults;
pub mod http;
pub mod local_storage;
pub mod site_data;
pub mod translations;

pub use http::{format_file_size, validate_image, HttpPersistenceClient, PersistenceClient};
pub use local_storage::{FileStorage, LocalStorage, MemoryStorage, LANGUAGE_KEY, SITE_DATA_KEY};
pub use site_data::{SiteDataCache, SiteDataSource};
pub use translations::{CacheState, TranslationCache};

use thiserror::Error;

/// Errors from the persistence client and caches
#[derive(Error, Debug)]
pub enum ClientError {
    /// The HTTP request itself failed (connection, timeout, decoding)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Local storage read or write failed
    #[error("Local storage error: {0}")]
    Storage(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input rejected before any request was made
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
