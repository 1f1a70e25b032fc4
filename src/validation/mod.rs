/// Document validation module
///
/// Validates client-supplied JSON at the API boundary before it is written
/// to disk.
use serde_json::Value;
use std::collections::HashSet;

/// Validation error detail
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validation result with detailed errors
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Expected shape of a top-level site data field
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldKind {
    String,
    Object,
    /// Array of objects, each with a unique non-empty string `id`
    RecordList,
}

impl FieldKind {
    fn describe(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Object => "an object",
            FieldKind::RecordList => "an array of records",
        }
    }
}

/// Top-level site data fields: (name, kind, required)
const SITE_DATA_FIELDS: &[(&str, FieldKind, bool)] = &[
    ("logo", FieldKind::String, false),
    ("siteName", FieldKind::String, true),
    ("contact", FieldKind::Object, true),
    ("whatsappMessages", FieldKind::Object, false),
    ("schedule", FieldKind::Object, true),
    ("hero", FieldKind::Object, false),
    ("services", FieldKind::RecordList, true),
    ("menu", FieldKind::Object, false),
    ("pricing", FieldKind::RecordList, true),
    ("offers", FieldKind::RecordList, true),
    ("gallery", FieldKind::RecordList, true),
    ("fullWidthGallery", FieldKind::RecordList, true),
    ("regulations", FieldKind::RecordList, false),
    ("regulationTexts", FieldKind::Object, true),
    ("multilingualContent", FieldKind::Object, false),
];

/// Names of the site data fields that hold id-keyed record lists
pub fn record_collections() -> impl Iterator<Item = &'static str> {
    SITE_DATA_FIELDS
        .iter()
        .filter(|(_, kind, _)| *kind == FieldKind::RecordList)
        .map(|(name, _, _)| *name)
}

/// Validate a site data document
///
/// Unknown fields are allowed and preserved.
pub fn validate_site_data(doc: &Value) -> ValidationResult {
    let Some(map) = doc.as_object() else {
        return Err(vec![ValidationError::new("$", "Site data must be an object")]);
    };

    let mut errors = Vec::new();

    for (name, kind, required) in SITE_DATA_FIELDS {
        let path = format!("$.{}", name);
        match map.get(*name) {
            None if *required => {
                errors.push(ValidationError::new(
                    path,
                    format!("Required field '{}' is missing", name),
                ));
            }
            None => {}
            Some(value) => match kind {
                FieldKind::RecordList => validate_record_list(&path, value, &mut errors),
                FieldKind::String if !value.is_string() => {
                    errors.push(wrong_kind(path, name, *kind));
                }
                FieldKind::Object if !value.is_object() => {
                    errors.push(wrong_kind(path, name, *kind));
                }
                _ => {}
            },
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn wrong_kind(path: String, name: &str, kind: FieldKind) -> ValidationError {
    ValidationError::new(path, format!("Field '{}' must be {}", name, kind.describe()))
}

fn validate_record_list(path: &str, value: &Value, errors: &mut Vec<ValidationError>) {
    let Some(items) = value.as_array() else {
        errors.push(ValidationError::new(path, "Field must be an array of records"));
        return;
    };

    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{}[{}]", path, index);
        let Some(record) = item.as_object() else {
            errors.push(ValidationError::new(item_path, "Record must be an object"));
            continue;
        };

        match record.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => {
                if !seen.insert(id) {
                    errors.push(ValidationError::new(
                        format!("{}.id", item_path),
                        format!("Duplicate record id '{}'", id),
                    ));
                }
            }
            _ => errors.push(ValidationError::new(
                format!("{}.id", item_path),
                "Record must have a non-empty string 'id'",
            )),
        }
    }
}

/// Validate a translation document (any JSON object)
pub fn validate_translation_document(doc: &Value) -> ValidationResult {
    if doc.is_object() {
        Ok(())
    } else {
        Err(vec![ValidationError::new(
            "$",
            "Translation document must be a JSON object",
        )])
    }
}

/// Join validation errors into a single message
pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.path, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_store::default_site_data;
    use serde_json::json;

    #[test]
    fn test_non_object_rejected() {
        let errors = validate_site_data(&json!([])).unwrap_err();
        assert_eq!(errors[0].path, "$");
    }

    #[test]
    fn test_missing_required_fields_reported() {
        let errors = validate_site_data(&json!({"siteName": "x"})).unwrap_err();
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"$.contact"));
        assert!(paths.contains(&"$.services"));
        assert!(paths.contains(&"$.regulationTexts"));
        assert!(!paths.contains(&"$.logo"));
    }

    #[test]
    fn test_wrong_type_reported() {
        let mut doc = default_site_data();
        doc["contact"] = json!("phone");
        let errors = validate_site_data(&doc).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "$.contact");
    }

    #[test]
    fn test_record_ids_required_and_unique() {
        let mut doc = default_site_data();
        doc["services"] = json!([
            {"id": "a", "title": "One"},
            {"title": "No id"},
            {"id": "a", "title": "Dup"},
            "not a record"
        ]);

        let errors = validate_site_data(&doc).unwrap_err();
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(paths, vec!["$.services[1].id", "$.services[2].id", "$.services[3]"]);
    }

    #[test]
    fn test_unknown_fields_allowed() {
        let mut doc = default_site_data();
        doc["newSection"] = json!({"anything": true});
        assert!(validate_site_data(&doc).is_ok());
    }

    #[test]
    fn test_record_collections() {
        let names: Vec<_> = record_collections().collect();
        assert!(names.contains(&"gallery"));
        assert!(names.contains(&"regulations"));
        assert!(!names.contains(&"contact"));
    }

    #[test]
    fn test_translation_document() {
        assert!(validate_translation_document(&json!({})).is_ok());
        assert!(validate_translation_document(&json!("x")).is_err());
    }

    #[test]
    fn test_describe() {
        let errors = vec![
            ValidationError::new("$.a", "bad"),
            ValidationError::new("$.b", "worse"),
        ];
        assert_eq!(describe(&errors), "$.a: bad; $.b: worse");
    }
}
