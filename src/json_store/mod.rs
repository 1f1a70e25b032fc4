/// JSON Document Store
///
/// Per-language translation documents and the singleton site data document,
/// persisted as pretty-printed JSON files.

pub mod file;
pub mod json_path;
pub mod language;
pub mod models;
pub mod site_data;
pub mod translations;

pub use language::Language;
pub use models::*;
pub use site_data::{default_site_data, SiteDataStore};
pub use translations::{BulkUpdateReport, TranslationStore};
