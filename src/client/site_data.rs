/// Client site data cache
///
/// The admin panel edits the site data document locally, persisting every
/// change to local storage, and publishes it to the server with `flush`.
use super::{
    local_storage::{LocalStorage, SITE_DATA_KEY},
    ClientError, ClientResult, PersistenceClient,
};
use crate::{
    json_store::{
        default_site_data,
        json_path::{ensure_object, fill_missing},
        Language,
    },
    validation,
};
use serde_json::{Map, Value};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Where the document came from on load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteDataSource {
    /// Snapshot from local storage, topped up with any missing fields
    LocalSnapshot,
    /// Fetched from the server
    Server,
    /// Nothing else was available
    BuiltInDefault,
}

struct Inner {
    document: Arc<Value>,
    source: Option<SiteDataSource>,
    unsaved: bool,
}

/// In-memory site data with write-through to local storage
pub struct SiteDataCache {
    client: Arc<dyn PersistenceClient>,
    storage: Arc<dyn LocalStorage>,
    inner: RwLock<Inner>,
}

impl SiteDataCache {
    /// Create a cache holding the built-in default until `load` runs
    pub fn new(client: Arc<dyn PersistenceClient>, storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            client,
            storage,
            inner: RwLock::new(Inner {
                document: Arc::new(default_site_data()),
                source: None,
                unsaved: false,
            }),
        }
    }

    /// Load the document: local snapshot, then server, then built-in default
    pub async fn load(&self) -> SiteDataSource {
        let (document, source) = match self.read_snapshot() {
            Some(mut snapshot) => {
                let defaults = match self.client.fetch_site_data().await {
                    Ok(doc) if doc.is_object() => doc,
                    Ok(_) => default_site_data(),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "server site data unavailable, filling snapshot from built-in default"
                        );
                        default_site_data()
                    }
                };
                let added = fill_missing(&mut snapshot, &defaults);
                if added > 0 {
                    tracing::info!(added, "filled missing site data fields in local snapshot");
                }
                (snapshot, SiteDataSource::LocalSnapshot)
            }
            None => match self.client.fetch_site_data().await {
                Ok(doc) if doc.is_object() => (doc, SiteDataSource::Server),
                Ok(_) => {
                    tracing::warn!("server site data is not an object, using built-in default");
                    (default_site_data(), SiteDataSource::BuiltInDefault)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to load site data, using built-in default");
                    (default_site_data(), SiteDataSource::BuiltInDefault)
                }
            },
        };

        let mut inner = self.write();
        self.persist(&document);
        inner.document = Arc::new(document);
        inner.source = Some(source);

        source
    }

    /// Source of the current document, `None` before `load`
    pub fn source(&self) -> Option<SiteDataSource> {
        self.read().source
    }

    /// Shared immutable view of the current document
    pub fn document(&self) -> Arc<Value> {
        Arc::clone(&self.read().document)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.read().unsaved
    }

    /// Shallow merge of top-level fields
    pub fn update(&self, patch: Value) -> ClientResult<()> {
        let Value::Object(patch) = patch else {
            return Err(ClientError::Validation("Site data patch must be an object".to_string()));
        };

        self.mutate(|doc| {
            let map = ensure_object(doc);
            for (key, value) in patch {
                map.insert(key, value);
            }
        });
        Ok(())
    }

    /// Replace one top-level field
    pub fn set_field(&self, name: &str, value: Value) {
        self.mutate(|doc| {
            ensure_object(doc).insert(name.to_string(), value);
        });
    }

    /// Set the text of a multilingual content entry for one language
    pub fn update_multilingual_content(&self, key: &str, language: Language, value: &str) {
        self.mutate(|doc| {
            let content = child_object(ensure_object(doc), "multilingualContent");
            let entry = child_object(content, key);
            entry.insert(language.code().to_string(), Value::String(value.to_string()));
        });
    }

    /// Text of a multilingual content entry, empty when absent
    pub fn multilingual_content(&self, key: &str, language: Language) -> String {
        self.read()
            .document
            .get("multilingualContent")
            .and_then(|content| content.get(key))
            .and_then(|entry| entry.get(language.code()))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Insert or replace a record in an id-keyed collection
    ///
    /// A record without a string `id` gets a fresh one. Returns the id.
    pub fn upsert_record(&self, collection: &str, record: Value) -> ClientResult<String> {
        ensure_record_collection(collection)?;
        let Value::Object(mut record) = record else {
            return Err(ClientError::Validation("Record must be an object".to_string()));
        };

        let id = match record.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = uuid::Uuid::new_v4().to_string();
                record.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };

        self.mutate(|doc| {
            let items = child_array(ensure_object(doc), collection);
            let record = Value::Object(record);
            match items.iter().position(|item| record_id(item) == Some(id.as_str())) {
                Some(index) => items[index] = record,
                None => items.push(record),
            }
        });

        Ok(id)
    }

    /// Remove a record by id, returning whether one was removed
    pub fn remove_record(&self, collection: &str, id: &str) -> ClientResult<bool> {
        ensure_record_collection(collection)?;

        let exists = self
            .read()
            .document
            .get(collection)
            .and_then(Value::as_array)
            .map(|items| items.iter().any(|item| record_id(item) == Some(id)))
            .unwrap_or(false);
        if !exists {
            return Ok(false);
        }

        self.mutate(|doc| {
            child_array(ensure_object(doc), collection).retain(|item| record_id(item) != Some(id));
        });
        Ok(true)
    }

    /// Publish the whole document to the server
    ///
    /// On failure the local document is kept and stays unsaved.
    pub async fn flush(&self) -> ClientResult<()> {
        let document = self.document();

        if let Err(e) = self.client.save_site_data(&document).await {
            tracing::warn!(error = %e, "failed to save site data, keeping local changes");
            return Err(e);
        }

        let mut inner = self.write();
        if Arc::ptr_eq(&inner.document, &document) {
            inner.unsaved = false;
        }
        tracing::info!("site data saved");
        Ok(())
    }

    /// Apply a change copy-on-write, then write the result through
    ///
    /// The lock is held across the local storage write so storage never
    /// ends up behind memory.
    fn mutate(&self, change: impl FnOnce(&mut Value)) {
        let mut inner = self.write();
        change(Arc::make_mut(&mut inner.document));
        inner.unsaved = true;
        self.persist(&inner.document);
    }

    fn read_snapshot(&self) -> Option<Value> {
        let raw = match self.storage.get_item(SITE_DATA_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read site data snapshot");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(doc) if doc.is_object() => Some(doc),
            Ok(_) => {
                tracing::warn!("site data snapshot is not an object, ignoring it");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "site data snapshot is not valid JSON, ignoring it");
                None
            }
        }
    }

    fn persist(&self, document: &Value) {
        let result = serde_json::to_string(document)
            .map_err(ClientError::from)
            .and_then(|raw| self.storage.set_item(SITE_DATA_KEY, &raw));

        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write site data to local storage");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn ensure_record_collection(collection: &str) -> ClientResult<()> {
    if validation::record_collections().any(|name| name == collection) {
        Ok(())
    } else {
        Err(ClientError::Validation(format!(
            "{} is not a record collection",
            collection
        )))
    }
}

fn record_id(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

fn child_object<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    ensure_object(
        parent
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
    )
}

fn child_array<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Vec<Value> {
    let value = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !value.is_array() {
        *value = Value::Array(Vec::new());
    }
    match value {
        Value::Array(items) => items,
        _ => unreachable!("value was just made an array"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryStorage;
    use crate::json_store::{BulkUpdateResponse, TranslationSet};
    use async_trait::async_trait;
    use serde_json::json;

    struct Offline;

    #[async_trait]
    impl PersistenceClient for Offline {
        async fn fetch_translations(&self) -> ClientResult<TranslationSet> {
            Err(ClientError::Validation("offline".into()))
        }

        async fn save_translations(&self, _: &TranslationSet) -> ClientResult<BulkUpdateResponse> {
            Err(ClientError::Validation("offline".into()))
        }

        async fn fetch_site_data(&self) -> ClientResult<Value> {
            Err(ClientError::Validation("offline".into()))
        }

        async fn save_site_data(&self, _: &Value) -> ClientResult<()> {
            Err(ClientError::Validation("offline".into()))
        }
    }

    fn cache() -> (SiteDataCache, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (SiteDataCache::new(Arc::new(Offline), storage.clone()), storage)
    }

    fn stored(storage: &MemoryStorage) -> Value {
        serde_json::from_str(&storage.get_item(SITE_DATA_KEY).unwrap().unwrap()).unwrap()
    }

    /// Memory storage with a slow write, to widen races between writers
    #[derive(Default)]
    struct SlowStorage(MemoryStorage);

    impl LocalStorage for SlowStorage {
        fn get_item(&self, key: &str) -> ClientResult<Option<String>> {
            self.0.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> ClientResult<()> {
            std::thread::sleep(std::time::Duration::from_millis(1));
            self.0.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> ClientResult<()> {
            self.0.remove_item(key)
        }
    }

    #[test]
    fn test_concurrent_mutations_leave_storage_current() {
        let storage = Arc::new(SlowStorage::default());
        let cache = SiteDataCache::new(Arc::new(Offline), storage.clone());

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let cache = &cache;
                scope.spawn(move || {
                    for step in 0..10 {
                        cache.set_field(&format!("worker{}", worker), json!(step));
                    }
                });
            }
        });

        let stored: Value =
            serde_json::from_str(&storage.get_item(SITE_DATA_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(&stored, cache.document().as_ref());
        for worker in 0..4 {
            assert_eq!(stored[format!("worker{}", worker)], json!(9));
        }
    }

    #[tokio::test]
    async fn test_offline_load_uses_built_in_default() {
        let (cache, storage) = cache();
        assert_eq!(cache.load().await, SiteDataSource::BuiltInDefault);
        assert_eq!(stored(&storage)["siteName"], "Triple Fun");
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_ignored() {
        let (cache, storage) = cache();
        storage.set_item(SITE_DATA_KEY, "{not json").unwrap();
        assert_eq!(cache.load().await, SiteDataSource::BuiltInDefault);
    }

    #[test]
    fn test_update_is_shallow_and_written_through() {
        let (cache, storage) = cache();
        cache.update(json!({"contact": {"phone": "1"}})).unwrap();

        assert_eq!(cache.document()["contact"], json!({"phone": "1"}));
        assert_eq!(stored(&storage)["contact"], json!({"phone": "1"}));
        assert!(cache.has_unsaved_changes());
        assert!(cache.update(json!([1])).is_err());
    }

    #[test]
    fn test_multilingual_content() {
        let (cache, _) = cache();
        assert_eq!(cache.multilingual_content("banner", Language::En), "");

        cache.update_multilingual_content("banner", Language::En, "Welcome");
        cache.update_multilingual_content("banner", Language::Ro, "Bun venit");

        assert_eq!(cache.multilingual_content("banner", Language::En), "Welcome");
        assert_eq!(cache.multilingual_content("banner", Language::Ro), "Bun venit");
        assert_eq!(cache.multilingual_content("banner", Language::Hu), "");
    }

    #[test]
    fn test_upsert_and_remove_records() {
        let (cache, _) = cache();

        let id = cache
            .upsert_record("offers", json!({"title": "Summer"}))
            .unwrap();
        cache
            .upsert_record("offers", json!({"id": "fixed", "title": "Winter"}))
            .unwrap();
        cache
            .upsert_record("offers", json!({"id": id, "title": "Summer 2"}))
            .unwrap();

        let offers = cache.document()["offers"].clone();
        assert_eq!(offers.as_array().unwrap().len(), 2);
        assert_eq!(offers[0]["title"], "Summer 2");
        assert_eq!(offers[1]["id"], "fixed");

        assert!(cache.remove_record("offers", "fixed").unwrap());
        assert!(!cache.remove_record("offers", "fixed").unwrap());
        assert!(cache.upsert_record("contact", json!({})).is_err());
        assert!(validation::validate_site_data(&cache.document()).is_ok());
    }

    #[test]
    fn test_snapshots_are_copy_on_write() {
        let (cache, _) = cache();
        let before = cache.document();
        cache.set_field("siteName", json!("Renamed"));
        assert_eq!(before["siteName"], "Triple Fun");
        assert_eq!(cache.document()["siteName"], "Renamed");
    }
}
