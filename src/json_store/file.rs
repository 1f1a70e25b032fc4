/// JSON file reads and atomic writes
use crate::error::{ApiError, ApiResult};
use serde_json::Value;
use std::path::Path;
use tokio::fs;

/// Read and parse a JSON file
///
/// A missing file is reported as `NotFound`; unreadable or corrupt files
/// surface their IO or parse error.
pub async fn read_json(path: &Path) -> ApiResult<Value> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("{}", path.display())));
        }
        Err(e) => return Err(ApiError::Io(e)),
    };

    Ok(serde_json::from_str(&content)?)
}

/// Write a JSON document with two-space indentation
///
/// The document is written to a sibling temp file first and renamed over
/// the target, so readers see either the old or the new document.
pub async fn write_json(path: &Path, value: &Value) -> ApiResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let temp_path = path.with_file_name(format!(
        ".{}.{}.tmp",
        file_name,
        uuid::Uuid::new_v4().simple()
    ));

    fs::write(&temp_path, content).await?;
    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(ApiError::Io(e));
    }

    Ok(())
}
