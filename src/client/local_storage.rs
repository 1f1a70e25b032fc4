/// Key-value storage for client state that survives restarts
use super::{ClientError, ClientResult};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// Key holding the admin's site data snapshot
pub const SITE_DATA_KEY: &str = "triple-fun-site-data";

/// Key holding the visitor's selected language
pub const LANGUAGE_KEY: &str = "triple-fun-language";

/// Synchronous string key-value store
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> ClientResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> ClientResult<()>;

    fn remove_item(&self, key: &str) -> ClientResult<()>;
}

/// In-memory storage, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panicked writer can't leave a half-inserted String behind
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> ClientResult<()> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> ClientResult<()> {
        self.items().remove(key);
        Ok(())
    }
}

/// Storage backed by one file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, key: &str) -> ClientResult<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            || key.starts_with('.')
        {
            return Err(ClientError::Storage(format!("Invalid storage key: {}", key)));
        }
        Ok(self.directory.join(key))
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> ClientResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::Storage(format!("Failed to read {}: {}", key, e))),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> ClientResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.directory).map_err(|e| {
            ClientError::Storage(format!("Failed to create storage directory: {}", e))
        })?;

        let temp = self
            .directory
            .join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4()));
        fs::write(&temp, value)
            .and_then(|_| fs::rename(&temp, &path))
            .map_err(|e| {
                let _ = fs::remove_file(&temp);
                ClientError::Storage(format!("Failed to write {}: {}", key, e))
            })
    }

    fn remove_item(&self, key: &str) -> ClientResult<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(format!("Failed to remove {}: {}", key, e))),
        }
    }
}
