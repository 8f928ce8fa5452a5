//! Error types for pulse extraction.
//!
//! [`ExtractError`] aborts a run. [`SkipReason`] describes a single entry or
//! range that was left out; the run carries on after logging it.

use std::path::PathBuf;

use crate::data::loader::BundleError;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Fatal errors: the run cannot produce a meaningful pulses file.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Failed to read the configuration file.
    #[error("failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON of the expected shape.
    #[error("failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file parsed but is not a JSON object.
    #[error("config file '{path}' must contain a JSON object")]
    ConfigNotObject { path: PathBuf },

    /// `data_folder_path` is absent or empty.
    #[error("missing 'data_folder_path' in config file '{path}'")]
    MissingDataFolder { path: PathBuf },

    /// The configured data folder does not exist.
    #[error("data folder does not exist: {path}")]
    DataFolderNotFound { path: PathBuf },

    /// Channel rows are not usable.
    #[error("invalid channel mapping: {message}")]
    InvalidChannels { message: String },

    /// Failed to read the selections file.
    #[error("failed to read selections file '{path}': {source}")]
    SelectionsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Selections file is not valid JSON.
    #[error("failed to parse selections file '{path}': {source}")]
    SelectionsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Selections file parsed but is not a JSON array.
    #[error("selections file '{path}' must contain a JSON array")]
    SelectionsNotArray { path: PathBuf },

    /// The pulses file could not be created.
    #[error("failed to create output file '{path}': {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to the pulses file failed part-way.
    #[error("failed to write output: {0}")]
    OutputWrite(#[from] csv::Error),

    /// I/O failure on the pulses file after it was opened.
    #[error("output I/O error: {0}")]
    OutputIo(#[from] std::io::Error),
}

/// Why an entry or a single range was skipped.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("entry {entry} missing 'file_name'")]
    MissingFileName { entry: usize },

    #[error("entry {entry}: file not found: {path} (from {reference})")]
    FileNotFound {
        entry: usize,
        path: PathBuf,
        reference: String,
    },

    #[error("entry {entry}: failed to load {path}: {source}")]
    Load {
        entry: usize,
        path: PathBuf,
        #[source]
        source: BundleError,
    },

    #[error("entry {entry}: empty arrays in {path}")]
    EmptyArrays { entry: usize, path: PathBuf },

    #[error("entry {entry}: no selections for {path}")]
    NoSelections { entry: usize, path: PathBuf },

    #[error("invalid selection indices in entry {entry}, selection {selection}")]
    InvalidIndices { entry: usize, selection: usize },

    #[error(
        "entry {entry}: end_index < start_index for {path} sel {selection} (requested [{start}, {end}], {len} samples)"
    )]
    InvertedRange {
        entry: usize,
        path: PathBuf,
        selection: usize,
        start: i64,
        end: i64,
        len: usize,
    },
}

impl SkipReason {
    /// Whether this skip drops a whole entry (as opposed to one range).
    pub fn skips_entry(&self) -> bool {
        !matches!(
            self,
            SkipReason::InvalidIndices { .. } | SkipReason::InvertedRange { .. }
        )
    }
}
