//! `selections.json` loading and lenient per-entry access.
//!
//! The file is parsed once as a JSON array. Individual entries are read
//! field by field so that one bad entry or range only skips itself.

use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use super::model::IndexRange;
use crate::error::{ExtractError, Result};

/// Read `selections.json`: must be a JSON array.
pub fn load_selections(path: &Path) -> Result<Vec<JsonValue>> {
    let text = std::fs::read_to_string(path).map_err(|source| ExtractError::SelectionsRead {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|source| ExtractError::SelectionsParse {
            path: path.to_path_buf(),
            source,
        })?;
    match root {
        JsonValue::Array(entries) => Ok(entries),
        _ => Err(ExtractError::SelectionsNotArray {
            path: path.to_path_buf(),
        }),
    }
}

/// A borrowed view over one selection entry.
#[derive(Debug, Clone, Copy)]
pub struct SelectionEntry<'a> {
    value: &'a JsonValue,
}

impl<'a> SelectionEntry<'a> {
    pub fn new(value: &'a JsonValue) -> Self {
        Self { value }
    }

    /// The stored file reference, if present and a non-empty string.
    pub fn file_name(&self) -> Option<&'a str> {
        self.value
            .get("file_name")
            .and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The raw range list, if present, a list, and non-empty.
    pub fn ranges(&self) -> Option<&'a [JsonValue]> {
        self.value
            .get("selections")
            .and_then(JsonValue::as_array)
            .map(Vec::as_slice)
            .filter(|r| !r.is_empty())
    }
}

/// Parse one `{ "start_index": .., "end_index": .. }` object.
pub fn parse_range(value: &JsonValue) -> Option<IndexRange> {
    let start = parse_index(value.get("start_index")?)?;
    let end = parse_index(value.get("end_index")?)?;
    Some(IndexRange::new(start, end))
}

/// Accept JSON integers, finite floats (truncated toward zero), and strings
/// that hold an integer. Values outside the `i64` range saturate so that
/// clamping still applies to them.
pub fn parse_index(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            }),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| {
                s.parse::<i128>()
                    .ok()
                    .map(|v| v.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
            })
        }
        _ => None,
    }
}

/// Last component of a stored file reference. Both `/` and `\` separate
/// components so references recorded on either platform resolve.
pub fn basename(reference: &str) -> &str {
    reference
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(reference)
}

/// `data_dir / basename(reference)`, or `None` when the reference has no
/// file name component (e.g. `"raw/"`).
pub fn resolve_source_path(data_dir: &Path, reference: &str) -> Option<PathBuf> {
    let name = basename(reference);
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(data_dir.join(name))
}
