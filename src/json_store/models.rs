/// Request and response bodies of the translation and site-data endpoints
use super::Language;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// All translation documents, keyed by language
pub type TranslationSet = BTreeMap<Language, Value>;

/// Placeholder document used when a language file is missing or unreadable
pub fn placeholder_document(language: Language) -> Value {
    serde_json::json!({ "language": language.code() })
}

/// Whether a document carries no translations beyond the language marker
pub fn is_placeholder(doc: &Value) -> bool {
    match doc.as_object() {
        Some(map) => map.keys().all(|k| k == "language"),
        None => true,
    }
}

/// Generic `{success, message}` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
}

impl MutationResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Body of `POST /api/translations/:lang/:key`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateKeyRequest {
    pub value: String,
}

/// Body of `POST /api/translations/bulk`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    pub translations: Map<String, Value>,
}

/// Outcome of writing one language during a bulk update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageWriteResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LanguageWriteResult {
    pub fn written() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Response of `POST /api/translations/bulk`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub success: bool,
    /// Error code when any language failed to save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
    pub results: BTreeMap<Language, LanguageWriteResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder(&placeholder_document(Language::En)));
        assert!(is_placeholder(&json!({})));
        assert!(is_placeholder(&json!("text")));
        assert!(!is_placeholder(&json!({"language": "en", "nav": {}})));
    }

    #[test]
    fn test_bulk_response_omits_empty_ignored() {
        let response = BulkUpdateResponse {
            success: true,
            error: None,
            message: "ok".into(),
            results: BTreeMap::from([(Language::En, LanguageWriteResult::written())]),
            ignored: vec![],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("ignored").is_none());
        assert!(value.get("error").is_none());
        assert_eq!(value["results"]["en"], json!({"success": true}));
    }
}
