//! Whole-file JSON persistence with atomic replacement.

use std::path::Path;

use {
    serde::{Serialize, de::DeserializeOwned},
    tracing::debug,
};

use crate::Result;

/// Load a JSON document, returning `None` if the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

/// Write `value` to `path` atomically via temp file + rename.
///
/// Parent directories are created as needed. The previous contents are
/// replaced in full.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_string_pretty(value)?;
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "wrote json file");
    Ok(())
}
