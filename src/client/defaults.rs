/// Built-in UI translations shipped with the client
///
/// Served before the server's documents load, and in place of any language
/// the server could not provide.
use crate::json_store::{Language, TranslationSet};
use serde_json::Value;

const RO: &str = include_str!("defaults/ro.json");
const EN: &str = include_str!("defaults/en.json");
const HU: &str = include_str!("defaults/hu.json");

/// Default document for one language
pub fn default_translations(language: Language) -> Value {
    let raw = match language {
        Language::Ro => RO,
        Language::En => EN,
        Language::Hu => HU,
    };

    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::error!(
            language = %language,
            error = %e,
            "embedded translations are not valid JSON"
        );
        Value::Object(Default::default())
    })
}

/// Default documents for every language
pub fn default_translation_set() -> TranslationSet {
    Language::ALL
        .iter()
        .map(|lang| (*lang, default_translations(*lang)))
        .collect()
}
