//! Pre-detected template catalog served to the web UI

use crate::error::{GreenScreenError, Result};
use std::path::Path;

/// Read the JSON catalog at `path` and hand it back as-is
pub fn load(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        GreenScreenError::TemplatesUnavailable(format!("{}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        GreenScreenError::TemplatesUnavailable(format!("{}: invalid JSON: {}", path.display(), e))
    })
}
