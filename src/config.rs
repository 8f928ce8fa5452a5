//! Workspace layout and `config.json` loading.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ExtractError, Result};

/// Default file names inside a workspace directory.
pub const CONFIG_FILE: &str = "config.json";
pub const SELECTIONS_FILE: &str = "selections.json";
pub const PULSES_FILE: &str = "pulses.txt";

/// Name of the array inside each `.npz` archive unless configured otherwise.
pub const DEFAULT_ARRAY_NAME: &str = "data";

// ---------------------------------------------------------------------------
// Workspace – where the sidecar files live
// ---------------------------------------------------------------------------

/// The set of files one extraction run reads and writes.
///
/// Paths default to fixed names inside `base_dir`; each can be overridden.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub base_dir: PathBuf,
    pub config: PathBuf,
    pub selections: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    /// Standard layout rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            config: base_dir.join(CONFIG_FILE),
            selections: base_dir.join(SELECTIONS_FILE),
            output: base_dir.join(PULSES_FILE),
            base_dir,
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelMap – which array row holds which quantity
// ---------------------------------------------------------------------------

/// Row indices of the time, voltage and current channels in the source array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelMap {
    pub time: usize,
    pub voltage: usize,
    pub current: usize,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            time: 0,
            voltage: 1,
            current: 2,
        }
    }
}

impl ChannelMap {
    /// Each quantity must come from its own row.
    pub fn validate(&self) -> Result<()> {
        if self.time == self.voltage || self.time == self.current || self.voltage == self.current
        {
            return Err(ExtractError::InvalidChannels {
                message: format!(
                    "rows must be distinct (time={}, voltage={}, current={})",
                    self.time, self.voltage, self.current
                ),
            });
        }
        Ok(())
    }

    /// Number of rows a source array needs to provide all three channels.
    pub fn required_rows(&self) -> usize {
        self.time.max(self.voltage).max(self.current) + 1
    }
}

// ---------------------------------------------------------------------------
// ExtractorConfig – parsed config.json
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawConfig {
    data_folder_path: Option<String>,
    array_name: Option<String>,
    #[serde(default)]
    channels: ChannelMap,
}

/// Validated extractor configuration.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Data directory as written in the config (relative to the base dir).
    pub data_folder_path: String,
    /// Array looked up inside each archive.
    pub array_name: String,
    pub channels: ChannelMap,
}

impl ExtractorConfig {
    /// Read and validate `config.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ExtractError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse config text; `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let parse_error = |source: serde_json::Error| ExtractError::ConfigParse {
            path: path.to_path_buf(),
            source,
        };
        let value: serde_json::Value = serde_json::from_str(text).map_err(parse_error)?;
        if !value.is_object() {
            return Err(ExtractError::ConfigNotObject {
                path: path.to_path_buf(),
            });
        }
        let raw: RawConfig = serde_json::from_value(value).map_err(parse_error)?;

        let data_folder_path = raw
            .data_folder_path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ExtractError::MissingDataFolder {
                path: path.to_path_buf(),
            })?;
        raw.channels.validate()?;

        Ok(Self {
            data_folder_path,
            array_name: raw
                .array_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_ARRAY_NAME.to_string()),
            channels: raw.channels,
        })
    }

    /// Absolute-or-relative data directory, resolved against `base_dir`.
    ///
    /// Fails when the directory does not exist.
    pub fn data_dir(&self, base_dir: &Path) -> Result<PathBuf> {
        let dir = base_dir.join(&self.data_folder_path);
        if !dir.is_dir() {
            return Err(ExtractError::DataFolderNotFound { path: dir });
        }
        Ok(dir.canonicalize().unwrap_or(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ExtractorConfig> {
        ExtractorConfig::parse(text, Path::new("config.json"))
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse(r#"{"data_folder_path": "data"}"#).unwrap();
        assert_eq!(cfg.data_folder_path, "data");
        assert_eq!(cfg.array_name, "data");
        assert_eq!(cfg.channels, ChannelMap::default());
    }

    #[test]
    fn custom_channels_and_array() {
        let cfg = parse(
            r#"{"data_folder_path": "d", "array_name": "scope",
                "channels": {"time": 2, "voltage": 0, "current": 1}}"#,
        )
        .unwrap();
        assert_eq!(cfg.array_name, "scope");
        assert_eq!(cfg.channels.time, 2);
        assert_eq!(cfg.channels.required_rows(), 3);
    }

    #[test]
    fn missing_or_empty_folder_is_fatal() {
        assert!(matches!(
            parse(r#"{"other": 1}"#),
            Err(ExtractError::MissingDataFolder { .. })
        ));
        assert!(matches!(
            parse(r#"{"data_folder_path": ""}"#),
            Err(ExtractError::MissingDataFolder { .. })
        ));
    }

    #[test]
    fn malformed_json_is_fatal() {
        assert!(matches!(
            parse("{not json"),
            Err(ExtractError::ConfigParse { .. })
        ));
        assert!(matches!(
            parse(r#"{"data_folder_path": 5}"#),
            Err(ExtractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn non_object_config_is_fatal() {
        assert!(matches!(
            parse(r#"["data", null]"#),
            Err(ExtractError::ConfigNotObject { .. })
        ));
        assert!(matches!(
            parse(r#""data""#),
            Err(ExtractError::ConfigNotObject { .. })
        ));
    }

    #[test]
    fn duplicate_channel_rows_rejected() {
        assert!(matches!(
            parse(r#"{"data_folder_path": "d", "channels": {"time": 0, "voltage": 0, "current": 1}}"#),
            Err(ExtractError::InvalidChannels { .. })
        ));
    }

    #[test]
    fn unreadable_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExtractorConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ExtractError::ConfigRead { .. }));
    }

    #[test]
    fn data_dir_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        let cfg = parse(r#"{"data_folder_path": "data"}"#).unwrap();
        assert!(cfg.data_dir(dir.path()).is_ok());

        let cfg = parse(r#"{"data_folder_path": "nope"}"#).unwrap();
        assert!(matches!(
            cfg.data_dir(dir.path()),
            Err(ExtractError::DataFolderNotFound { .. })
        ));
    }

    #[test]
    fn workspace_layout() {
        let ws = Workspace::new("/tmp/run");
        assert_eq!(ws.config, Path::new("/tmp/run/config.json"));
        assert_eq!(ws.selections, Path::new("/tmp/run/selections.json"));
        assert_eq!(ws.output, Path::new("/tmp/run/pulses.txt"));
    }
}
