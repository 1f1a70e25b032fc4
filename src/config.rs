/// Configuration management for the Triple Fun persistence API
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub uploads: UploadConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    /// Port of the translation and site-data service
    pub translation_port: u16,
    /// Port of the upload service
    pub upload_port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub public_directory: PathBuf,
    pub i18n_directory: PathBuf,
    pub site_data_path: PathBuf,
    pub upload_directory: PathBuf,
}

/// Upload serving configuration
///
/// Size, count and type limits are fixed constants in `upload_store` and
/// are intentionally absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// URL prefix uploaded files are served under
    pub public_path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Default configuration with every data path placed under `public_directory`
    pub fn rooted_at(public_directory: impl AsRef<Path>) -> Self {
        let public_directory = public_directory.as_ref().to_path_buf();

        Self {
            service: ServiceConfig {
                hostname: "0.0.0.0".to_string(),
                translation_port: 3001,
                upload_port: 3002,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            storage: StorageConfig {
                i18n_directory: public_directory.join("i18n"),
                site_data_path: public_directory.join("data").join("defaultSiteData.json"),
                upload_directory: public_directory.join("uploads"),
                public_directory,
            },
            uploads: UploadConfig {
                public_path: "/uploads".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let public_directory: PathBuf = env::var("TRIPLE_FUN_PUBLIC_DIRECTORY")
            .unwrap_or_else(|_| "./public".to_string())
            .into();
        let mut config = Self::rooted_at(&public_directory);

        if let Ok(hostname) = env::var("TRIPLE_FUN_HOSTNAME") {
            config.service.hostname = hostname;
        }
        config.service.translation_port = parse_port("TRIPLE_FUN_TRANSLATION_PORT", 3001)?;
        config.service.upload_port = parse_port("TRIPLE_FUN_UPLOAD_PORT", 3002)?;

        if let Ok(dir) = env::var("TRIPLE_FUN_I18N_DIRECTORY") {
            config.storage.i18n_directory = PathBuf::from(dir);
        }
        if let Ok(path) = env::var("TRIPLE_FUN_SITE_DATA_PATH") {
            config.storage.site_data_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("TRIPLE_FUN_UPLOAD_DIRECTORY") {
            config.storage.upload_directory = PathBuf::from(dir);
        }
        if let Ok(public_path) = env::var("TRIPLE_FUN_UPLOAD_PUBLIC_PATH") {
            config.uploads.public_path = public_path;
        }

        config.logging.level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.service.translation_port == self.service.upload_port
            && self.service.translation_port != 0
        {
            return Err(ApiError::Validation(format!(
                "Translation and upload services cannot share port {}",
                self.service.translation_port
            )));
        }

        if !self.uploads.public_path.starts_with('/') {
            return Err(ApiError::Validation(
                "Upload public path must start with '/'".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_port(var: &str, default: u16) -> ApiResult<u16> {
    match env::var(var) {
        Ok(value) => value.parse().map_err(|_| {
            ApiError::Validation(format!("Invalid port number in {}: {}", var, value))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_at_layout() {
        let config = ServerConfig::rooted_at("/srv/site");
        assert_eq!(config.storage.i18n_directory, PathBuf::from("/srv/site/i18n"));
        assert_eq!(
            config.storage.site_data_path,
            PathBuf::from("/srv/site/data/defaultSiteData.json")
        );
        assert_eq!(config.storage.upload_directory, PathBuf::from("/srv/site/uploads"));
        assert_eq!(config.service.translation_port, 3001);
        assert_eq!(config.service.upload_port, 3002);
    }

    #[test]
    fn test_validate_rejects_shared_port() {
        let mut config = ServerConfig::rooted_at("/tmp");
        config.service.upload_port = config.service.translation_port;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_public_path() {
        let mut config = ServerConfig::rooted_at("/tmp");
        config.uploads.public_path = "uploads".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ServerConfig::rooted_at("/tmp").validate().is_ok());
    }
}
