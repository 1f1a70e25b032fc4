/// Client translation cache
///
/// Holds every language's translation document in memory and answers
/// lookups without touching the network. Documents start as the built-in
/// defaults and are replaced by the server's copies on `load`.
use super::{
    defaults::{default_translation_set, default_translations},
    local_storage::{LocalStorage, LANGUAGE_KEY},
    ClientError, ClientResult, PersistenceClient,
};
use crate::json_store::{
    is_placeholder,
    json_path::{get_string, set_path, split_key},
    placeholder_document, Language, TranslationSet,
};
use serde_json::Value;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Load state of the cache
#[derive(Debug, Clone, PartialEq)]
pub enum CacheState {
    /// Serving built-in defaults while the first load is pending
    Loading,
    /// Every language came from the server
    Ready,
    /// Some languages are served from the built-in defaults
    ReadyWithFallback { failed: Vec<Language> },
}

struct Inner {
    state: CacheState,
    documents: Arc<TranslationSet>,
    language: Language,
    unsaved: bool,
}

/// In-memory translations with a fallback chain and explicit flush
pub struct TranslationCache {
    client: Arc<dyn PersistenceClient>,
    storage: Arc<dyn LocalStorage>,
    inner: RwLock<Inner>,
}

impl TranslationCache {
    /// Create a cache serving defaults, with the language restored from storage
    pub fn new(client: Arc<dyn PersistenceClient>, storage: Arc<dyn LocalStorage>) -> Self {
        let language = match storage.get_item(LANGUAGE_KEY) {
            Ok(Some(code)) => code.parse().unwrap_or_else(|_| {
                tracing::warn!(code = %code, "stored language is not supported, using default");
                Language::DEFAULT
            }),
            Ok(None) => Language::DEFAULT,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored language");
                Language::DEFAULT
            }
        };

        Self {
            client,
            storage,
            inner: RwLock::new(Inner {
                state: CacheState::Loading,
                documents: Arc::new(default_translation_set()),
                language,
                unsaved: false,
            }),
        }
    }

    /// Fetch the server's documents
    ///
    /// Languages the server can't provide keep the built-in defaults. Unsaved
    /// local edits are not replaced.
    pub async fn load(&self) -> CacheState {
        let (documents, failed) = match self.client.fetch_translations().await {
            Ok(mut fetched) => {
                let mut documents = TranslationSet::new();
                let mut failed = Vec::new();
                for language in Language::ALL {
                    match fetched.remove(&language) {
                        Some(doc) if !is_placeholder(&doc) => {
                            documents.insert(language, doc);
                        }
                        _ => {
                            documents.insert(language, default_translations(language));
                            failed.push(language);
                        }
                    }
                }
                (documents, failed)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load translations, using defaults");
                (default_translation_set(), Language::ALL.to_vec())
            }
        };

        if !failed.is_empty() {
            tracing::warn!(failed = ?failed, "serving default translations for some languages");
        }

        let state = if failed.is_empty() {
            CacheState::Ready
        } else {
            CacheState::ReadyWithFallback { failed }
        };

        let mut inner = self.write();
        if inner.unsaved {
            tracing::info!("keeping unsaved translation edits over loaded documents");
        } else {
            inner.documents = Arc::new(documents);
        }
        inner.state = state.clone();
        state
    }

    pub fn state(&self) -> CacheState {
        self.read().state.clone()
    }

    /// Translate `key`: current language, then the default language, then the key itself
    pub fn lookup(&self, key: &str) -> String {
        let inner = self.read();
        let documents = &inner.documents;

        let found = documents
            .get(&inner.language)
            .and_then(|doc| get_string(doc, key))
            .or_else(|| {
                documents
                    .get(&Language::DEFAULT)
                    .and_then(|doc| get_string(doc, key))
            });

        found.unwrap_or(key).to_string()
    }

    pub fn language(&self) -> Language {
        self.read().language
    }

    /// Switch the current language and remember it
    pub fn set_language(&self, language: Language) {
        self.write().language = language;

        if let Err(e) = self.storage.set_item(LANGUAGE_KEY, language.code()) {
            tracing::warn!(error = %e, "failed to persist selected language");
        }
    }

    /// Set one translation in memory only
    ///
    /// Copy-on-write: snapshots handed out earlier keep their contents.
    pub fn local_edit(&self, key: &str, language: Language, value: &str) -> ClientResult<()> {
        let segments = split_key(key).map_err(|e| ClientError::Validation(e.to_string()))?;

        let mut inner = self.write();
        let documents = Arc::make_mut(&mut inner.documents);
        let doc = documents
            .entry(language)
            .or_insert_with(|| placeholder_document(language));
        set_path(doc, &segments, Value::String(value.to_string()));
        inner.unsaved = true;

        Ok(())
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.read().unsaved
    }

    /// Shared immutable view of the current documents
    pub fn snapshot(&self) -> Arc<TranslationSet> {
        Arc::clone(&self.read().documents)
    }

    /// Send every document to the server
    ///
    /// On failure the local edits stay in place and remain unsaved.
    pub async fn flush(&self) -> ClientResult<()> {
        let documents = self.snapshot();

        if let Err(e) = self.client.save_translations(&documents).await {
            tracing::warn!(error = %e, "failed to save translations, keeping local changes");
            return Err(e);
        }

        let mut inner = self.write();
        // Edits made while the request was in flight still need saving
        if Arc::ptr_eq(&inner.documents, &documents) {
            inner.unsaved = false;
        }
        tracing::info!("translations saved");
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
