/// Dotted key paths over nested JSON objects (`hero.stats.parties`)
use crate::error::{ApiError, ApiResult};
use serde_json::{Map, Value};

/// Split a dotted key into its segments
///
/// Empty keys and empty segments (`a..b`, `.a`, `a.`) are rejected.
pub fn split_key(key: &str) -> ApiResult<Vec<&str>> {
    if key.is_empty() {
        return Err(ApiError::Validation("Translation key cannot be empty".to_string()));
    }

    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ApiError::Validation(format!(
            "Translation key has an empty segment: {}",
            key
        )));
    }

    Ok(segments)
}

/// Resolve a dotted key, returning None when any segment is missing
pub fn get_path<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}

/// Resolve a dotted key to a string leaf
pub fn get_string<'a>(doc: &'a Value, key: &str) -> Option<&'a str> {
    get_path(doc, key).and_then(Value::as_str)
}

/// Set the value at `segments`, creating intermediate objects as needed
///
/// Non-object values met along the way (including the root) are replaced
/// by empty objects.
pub fn set_path(doc: &mut Value, segments: &[&str], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let mut current = doc;
    for segment in parents {
        current = ensure_object(current)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    ensure_object(current).insert(leaf.to_string(), value);
}

/// Copy every key of `defaults` that `target` lacks, recursing into objects
///
/// Existing values in `target` are never overwritten. Returns the number of
/// keys that were added.
pub fn fill_missing(target: &mut Value, defaults: &Value) -> usize {
    let (Value::Object(target_map), Value::Object(default_map)) = (target, defaults) else {
        return 0;
    };

    let mut added = 0;
    for (key, default_value) in default_map {
        match target_map.get_mut(key) {
            Some(existing) => added += fill_missing(existing, default_value),
            None => {
                target_map.insert(key.clone(), default_value.clone());
                added += 1;
            }
        }
    }
    added
}

/// Make `value` an object if it isn't one, and borrow its map
pub fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}
