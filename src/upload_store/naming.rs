/// Generated filenames for uploaded images
use super::IMAGE_EXTENSIONS;
use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::Path;

/// Lowercase slug of a filename stem: `[a-z0-9]` runs joined by single dashes
pub fn slugify(stem: &str) -> String {
    let mut slug = String::with_capacity(stem.len());
    for c in stem.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "image".to_string()
    } else {
        slug.to_string()
    }
}

/// Lowercased extension of `filename`, if any
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Whether `filename` has an image extension
pub fn has_image_extension(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Extension to store a file under
///
/// Keeps the original extension when it is an image extension, otherwise
/// derives one from the MIME type.
pub fn storage_extension(original_name: &str, mime_type: &str) -> String {
    match extension_of(original_name) {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => ext,
        _ => match mime_type {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "jpg",
        }
        .to_string(),
    }
}

/// Generate `{slug}-{unix_millis}-{12 hex}.{ext}`
pub fn generate_filename(original_name: &str, mime_type: &str, now: DateTime<Utc>) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix: [u8; 6] = rand::thread_rng().gen();
    let suffix: String = suffix.iter().map(|b| format!("{:02x}", b)).collect();

    format!(
        "{}-{}-{}.{}",
        slugify(&stem),
        now.timestamp_millis(),
        suffix,
        storage_extension(original_name, mime_type)
    )
}

/// Reject filenames that could escape the upload directory
pub fn validate_filename(filename: &str) -> ApiResult<()> {
    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0')
    {
        return Err(ApiError::Validation(format!("Invalid filename: {}", filename)));
    }
    Ok(())
}
