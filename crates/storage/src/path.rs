//! Logical path validation.
//!
//! Logical paths are relative, `/`-separated, and may not escape the
//! store root.

use std::path::{Path, PathBuf};

use pixsynth_core::error::CoreError;

/// Validate `logical_path` and return it normalized (no leading/trailing
/// slashes, no empty segments).
pub fn normalize(logical_path: &str) -> Result<String, CoreError> {
    let trimmed = logical_path.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Blob path must not be empty".into()));
    }
    if trimmed.starts_with('/') || trimmed.starts_with('\\') || Path::new(trimmed).is_absolute() {
        return Err(CoreError::Validation(format!(
            "Blob path '{logical_path}' must be relative"
        )));
    }

    let mut segments = Vec::new();
    for segment in trimmed.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(CoreError::Validation(format!(
                    "Blob path '{logical_path}' must not contain '..'"
                )))
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return Err(CoreError::Validation("Blob path must not be empty".into()));
    }
    Ok(segments.join("/"))
}

/// Resolve a validated logical path under `root`.
pub fn resolve(root: &Path, logical_path: &str) -> Result<PathBuf, CoreError> {
    Ok(root.join(normalize(logical_path)?))
}
