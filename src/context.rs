/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    error::{ApiError, ApiResult},
    json_store::{SiteDataStore, TranslationStore},
    upload_store::{UploadStore, UploadStoreConfig},
};
use std::sync::Arc;
use std::time::Instant;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub translations: Arc<TranslationStore>,
    pub site_data: Arc<SiteDataStore>,
    pub uploads: Arc<UploadStore>,
    pub started_at: Instant,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        let translations = Arc::new(TranslationStore::new(config.storage.i18n_directory.clone()));
        translations.ensure_directory().await?;

        let site_data = Arc::new(SiteDataStore::new(config.storage.site_data_path.clone()));
        site_data.seed_if_missing().await?;

        let uploads = Arc::new(UploadStore::new(UploadStoreConfig {
            directory: config.storage.upload_directory.clone(),
            public_prefix: config.uploads.public_path.clone(),
        }));

        Ok(Self {
            config: Arc::new(config),
            translations,
            site_data,
            uploads,
            started_at: Instant::now(),
        })
    }

    /// Ensure all required directories exist
    async fn ensure_directories(config: &ServerConfig) -> ApiResult<()> {
        let mut directories = vec![
            config.storage.public_directory.clone(),
            config.storage.upload_directory.clone(),
        ];
        if let Some(parent) = config.storage.site_data_path.parent() {
            directories.push(parent.to_path_buf());
        }

        for dir in directories {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                ApiError::Storage(format!("Failed to create directory {}: {}", dir.display(), e))
            })?;
        }

        Ok(())
    }

    /// Seconds since the context was created
    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
