/// Translation document store
///
/// One `{lang}.json` file per supported language. Reads never fail as a
/// whole: an unreadable language degrades to its placeholder document.
use super::{
    file::{read_json, write_json},
    json_path::{set_path, split_key},
    models::{placeholder_document, LanguageWriteResult, TranslationSet},
    Language,
};
use crate::{
    error::{ApiError, ApiResult},
    metrics,
    validation,
};
use futures::future::join_all;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Outcome of a bulk replacement across languages
#[derive(Debug, Clone, Default)]
pub struct BulkUpdateReport {
    pub results: BTreeMap<Language, LanguageWriteResult>,
    pub ignored: Vec<String>,
}

impl BulkUpdateReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.values().all(|r| r.success)
    }

    pub fn failed_languages(&self) -> Vec<Language> {
        self.results
            .iter()
            .filter(|(_, r)| !r.success)
            .map(|(lang, _)| *lang)
            .collect()
    }
}

/// Per-language translation files with serialized writes
pub struct TranslationStore {
    directory: PathBuf,
    locks: HashMap<Language, Mutex<()>>,
}

impl TranslationStore {
    /// Create a store rooted at `directory`
    pub fn new(directory: PathBuf) -> Self {
        let locks = Language::ALL
            .iter()
            .map(|lang| (*lang, Mutex::new(())))
            .collect();

        Self { directory, locks }
    }

    /// Path of the file backing `language`
    pub fn path_for(&self, language: Language) -> PathBuf {
        self.directory.join(language.file_name())
    }

    /// Create the translation directory if missing
    pub async fn ensure_directory(&self) -> ApiResult<()> {
        tokio::fs::create_dir_all(&self.directory).await.map_err(|e| {
            ApiError::Storage(format!(
                "Failed to create translation directory {}: {}",
                self.directory.display(),
                e
            ))
        })
    }

    /// Read one language, failing on missing or corrupt files
    pub async fn load(&self, language: Language) -> ApiResult<Value> {
        read_json(&self.path_for(language)).await
    }

    /// Read one language, substituting the placeholder on any failure
    pub async fn load_or_placeholder(&self, language: Language) -> Value {
        match self.load(language).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(
                    language = %language,
                    error = %e,
                    "could not load translations, using placeholder"
                );
                metrics::record_read_fallback(language.code());
                placeholder_document(language)
            }
        }
    }

    /// Read every supported language concurrently
    pub async fn load_all(&self) -> TranslationSet {
        let docs = join_all(Language::ALL.iter().map(|lang| self.load_or_placeholder(*lang))).await;

        Language::ALL.iter().copied().zip(docs).collect()
    }

    /// Set a single dotted key in one language (read-modify-write)
    pub async fn update_key(&self, language: Language, key: &str, value: Value) -> ApiResult<()> {
        let segments = split_key(key)?;
        let _guard = self.lock(language).lock().await;

        let mut doc = match self.load(language).await {
            Ok(doc) if doc.is_object() => doc,
            Ok(_) => {
                tracing::warn!(
                    language = %language,
                    "translation file is not an object, starting over"
                );
                placeholder_document(language)
            }
            Err(ApiError::NotFound(_)) => {
                tracing::info!(language = %language, "creating new translation file");
                placeholder_document(language)
            }
            Err(e) => {
                tracing::warn!(
                    language = %language,
                    error = %e,
                    "translation file unreadable, starting over"
                );
                placeholder_document(language)
            }
        };

        set_path(&mut doc, &segments, value);

        let result = write_json(&self.path_for(language), &doc).await;
        metrics::record_document_write(&format!("translations.{}", language), result.is_ok());
        result.map_err(|e| {
            ApiError::Storage(format!("Failed to update translation {}.{}: {}", language, key, e))
        })?;

        tracing::info!(language = %language, key = %key, "translation key updated");
        Ok(())
    }

    /// Replace one language's document wholesale
    pub async fn replace(&self, language: Language, doc: &Value) -> ApiResult<()> {
        validation::validate_translation_document(doc)
            .map_err(|errors| ApiError::Validation(validation::describe(&errors)))?;

        let _guard = self.lock(language).lock().await;
        let result = write_json(&self.path_for(language), doc).await;
        metrics::record_document_write(&format!("translations.{}", language), result.is_ok());
        result.map_err(|e| {
            ApiError::Storage(format!("Failed to write {} translations: {}", language, e))
        })?;

        tracing::info!(language = %language, "translations replaced");
        Ok(())
    }

    /// Replace every recognised language in `documents`
    ///
    /// Every recognised document is validated before anything is written, so
    /// a malformed request leaves the disk untouched. After that languages are
    /// written independently; one I/O failure does not stop the others.
    /// Unrecognised codes are ignored and reported.
    pub async fn bulk_replace(
        &self,
        documents: &Map<String, Value>,
    ) -> ApiResult<BulkUpdateReport> {
        let mut report = BulkUpdateReport::default();
        let mut targets = Vec::new();
        let mut invalid = Vec::new();

        for (code, doc) in documents {
            match code.parse::<Language>() {
                Ok(language) => {
                    if let Err(errors) = validation::validate_translation_document(doc) {
                        invalid.push(format!("{}: {}", language, validation::describe(&errors)));
                    }
                    targets.push((language, doc));
                }
                Err(_) => {
                    tracing::debug!(code = %code, "ignoring unsupported language in bulk update");
                    report.ignored.push(code.clone());
                }
            }
        }

        if !invalid.is_empty() {
            return Err(ApiError::Validation(invalid.join("; ")));
        }

        let outcomes = join_all(targets.iter().map(|(language, doc)| async move {
            (*language, self.replace(*language, doc).await)
        }))
        .await;

        for (language, outcome) in outcomes {
            let result = match outcome {
                Ok(()) => LanguageWriteResult::written(),
                Err(e) => {
                    tracing::error!(
                        language = %language,
                        error = %e,
                        "bulk translation write failed"
                    );
                    LanguageWriteResult::failed(e.to_string())
                }
            };
            report.results.insert(language, result);
        }

        Ok(report)
    }

    fn lock(&self, language: Language) -> &Mutex<()> {
        // Every language gets a lock in `new`
        &self.locks[&language]
    }
}
