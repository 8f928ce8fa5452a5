//! Pulse extraction: selections + source archives → one pulses file.
//!
//! ```text
//!  config.json ──► data dir ─┐
//!                            ▼
//!  selections.json ──► entry ──► load .npz ──► ranges ──► clamp ──► segment
//!                                                                    │
//!                                                  pulses.txt ◄──────┘
//! ```
//!
//! Entries and ranges are processed in file order. Anything wrong with a
//! single entry or range is logged and skipped; only configuration, the
//! selections file, and the output file itself can abort a run.

mod writer;

pub use writer::{PulseWriter, HEADER, MARKER};

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use crate::config::{ChannelMap, ExtractorConfig, Workspace};
use crate::data::loader::load_bundle;
use crate::data::model::{ArrayBundle, ClampedRange};
use crate::data::selection::{load_selections, parse_range, resolve_source_path, SelectionEntry};
use crate::error::{Result, SkipReason};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Counters for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Selection entries seen.
    pub entries: usize,
    /// Entries skipped as a whole.
    pub entries_skipped: usize,
    /// Individual ranges skipped inside otherwise usable entries.
    pub ranges_skipped: usize,
    /// Segments written.
    pub segments: usize,
    /// Sample lines written across all segments.
    pub samples: usize,
}

impl ExtractionReport {
    fn record_skip(&mut self, reason: &SkipReason) {
        log::warn!("{reason}; skipping.");
        if reason.skips_entry() {
            self.entries_skipped += 1;
        } else {
            self.ranges_skipped += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// A selection entry whose archive loaded and which has ranges to apply.
struct OpenedEntry<'a> {
    index: usize,
    path: PathBuf,
    bundle: ArrayBundle,
    len: usize,
    ranges: &'a [JsonValue],
}

impl OpenedEntry<'_> {
    fn select(&self, selection: usize, raw: &JsonValue) -> std::result::Result<ClampedRange, SkipReason> {
        let requested = parse_range(raw).ok_or(SkipReason::InvalidIndices {
            entry: self.index,
            selection,
        })?;
        requested.clamp(self.len).ok_or_else(|| SkipReason::InvertedRange {
            entry: self.index,
            path: self.path.clone(),
            selection,
            start: requested.start,
            end: requested.end,
            len: self.len,
        })
    }
}

/// Applies selection entries against archives in one data directory.
#[derive(Debug, Clone)]
pub struct Extractor {
    data_dir: PathBuf,
    array_name: String,
    channels: ChannelMap,
}

impl Extractor {
    pub fn new(data_dir: impl Into<PathBuf>, array_name: impl Into<String>, channels: ChannelMap) -> Self {
        Self {
            data_dir: data_dir.into(),
            array_name: array_name.into(),
            channels,
        }
    }

    /// Build from a loaded configuration, resolving its data folder against
    /// `base_dir`.
    pub fn from_config(config: &ExtractorConfig, base_dir: &Path) -> Result<Self> {
        Ok(Self::new(
            config.data_dir(base_dir)?,
            config.array_name.clone(),
            config.channels,
        ))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Process every entry in order, streaming segments into `out`.
    ///
    /// Only write failures on `out` are returned as errors.
    pub fn run<W: Write>(
        &self,
        entries: &[JsonValue],
        out: &mut PulseWriter<W>,
    ) -> Result<ExtractionReport> {
        let mut report = ExtractionReport::default();

        for (index, value) in entries.iter().enumerate() {
            report.entries += 1;
            let opened = match self.open_entry(index, SelectionEntry::new(value)) {
                Ok(opened) => opened,
                Err(reason) => {
                    report.record_skip(&reason);
                    continue;
                }
            };
            log::debug!(
                "entry {index}: {} ({} samples, {} ranges)",
                opened.path.display(),
                opened.len,
                opened.ranges.len()
            );

            for (selection, raw) in opened.ranges.iter().enumerate() {
                match opened.select(selection, raw) {
                    Ok(range) => {
                        let segment = opened.bundle.segment(range);
                        report.samples += out.write_segment(&segment)?;
                        report.segments += 1;
                    }
                    Err(reason) => report.record_skip(&reason),
                }
            }
        }

        Ok(report)
    }

    /// Resolve, load and sanity-check one entry before any range is applied.
    fn open_entry<'a>(
        &self,
        index: usize,
        entry: SelectionEntry<'a>,
    ) -> std::result::Result<OpenedEntry<'a>, SkipReason> {
        let missing = SkipReason::MissingFileName { entry: index };
        let reference = entry.file_name().ok_or(missing)?;
        let path = resolve_source_path(&self.data_dir, reference)
            .ok_or(SkipReason::MissingFileName { entry: index })?;

        if !path.is_file() {
            return Err(SkipReason::FileNotFound {
                entry: index,
                path,
                reference: reference.to_string(),
            });
        }

        let bundle = match load_bundle(&path, &self.array_name, &self.channels) {
            Ok(bundle) => bundle,
            Err(source) => {
                return Err(SkipReason::Load {
                    entry: index,
                    path,
                    source,
                })
            }
        };

        let len = bundle.usable_len();
        if len == 0 {
            return Err(SkipReason::EmptyArrays { entry: index, path });
        }

        let Some(ranges) = entry.ranges() else {
            return Err(SkipReason::NoSelections { entry: index, path });
        };

        Ok(OpenedEntry {
            index,
            path,
            bundle,
            len,
            ranges,
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Run a full extraction for `workspace`.
///
/// Fatal problems (configuration, selections, output file) are returned as
/// errors; everything else is logged and skipped. On success the pulses file
/// always exists and starts with the header line.
pub fn run_extraction(workspace: &Workspace) -> Result<ExtractionReport> {
    let config = ExtractorConfig::load(&workspace.config)?;
    let extractor = Extractor::from_config(&config, &workspace.base_dir)?;
    let entries = load_selections(&workspace.selections)?;
    log::info!(
        "Loaded {} selection entries; data folder {}",
        entries.len(),
        extractor.data_dir().display()
    );

    let mut out = PulseWriter::create(&workspace.output)?;
    let report = extractor.run(&entries, &mut out)?;
    out.finish()?.flush()?;

    log::info!(
        "Wrote {} segments ({} samples) from {} entries; skipped {} entries and {} ranges",
        report.segments,
        report.samples,
        report.entries,
        report.entries_skipped,
        report.ranges_skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;
    use crate::data::npy::{write_npz, NpyArray};
    use serde_json::json;

    /// Data dir with `a.npz` holding time 0..5, voltage 20..25, current 10..15.
    fn fixture() -> (tempfile::TempDir, Extractor) {
        let dir = tempfile::tempdir().unwrap();
        let array = NpyArray::from_rows(&[
            Column::F64(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]),
            Column::F64(vec![20.0, 21.0, 22.0, 23.0, 24.0, 25.0]),
            Column::F64(vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]),
        ])
        .unwrap();
        write_npz(&dir.path().join("a.npz"), &[("data", &array)]).unwrap();
        let extractor = Extractor::new(dir.path(), "data", ChannelMap::default());
        (dir, extractor)
    }

    fn run(extractor: &Extractor, entries: JsonValue) -> (ExtractionReport, String) {
        let entries = entries.as_array().unwrap().clone();
        let mut out = PulseWriter::new(Vec::new()).unwrap();
        let report = extractor.run(&entries, &mut out).unwrap();
        (report, String::from_utf8(out.finish().unwrap()).unwrap())
    }

    #[test]
    fn slices_and_rebases_requested_range() {
        let (_dir, extractor) = fixture();
        let (report, text) = run(
            &extractor,
            json!([{"file_name": "a.npz", "selections": [{"start_index": 2, "end_index": 4}]}]),
        );
        assert_eq!(report.segments, 1);
        assert_eq!(report.samples, 3);
        assert_eq!(
            text,
            "time\tcurrent\tvoltage\nstart\t\t\n0.0\t12.0\t22.0\n1.0\t13.0\t23.0\n2.0\t14.0\t24.0\n"
        );
    }

    #[test]
    fn out_of_bounds_range_is_clamped() {
        let (_dir, extractor) = fixture();
        let (report, text) = run(
            &extractor,
            json!([{"file_name": "/elsewhere/a.npz",
                    "selections": [{"start_index": -5, "end_index": 100}]}]),
        );
        assert_eq!(report.samples, 6);
        assert_eq!(text.lines().count(), 1 + 1 + 6);
    }

    #[test]
    fn bad_ranges_skip_only_themselves() {
        let (_dir, extractor) = fixture();
        let (report, text) = run(
            &extractor,
            json!([{"file_name": "a.npz", "selections": [
                {"start_index": 4, "end_index": 1},
                {"start_index": "x", "end_index": 1},
                {"end_index": 1},
                {"start_index": 0, "end_index": 0}
            ]}]),
        );
        assert_eq!(report.ranges_skipped, 3);
        assert_eq!(report.entries_skipped, 0);
        assert_eq!(report.segments, 1);
        assert_eq!(text.matches("start\t\t\n").count(), 1);
    }

    #[test]
    fn bad_entries_skip_and_processing_continues() {
        let (_dir, extractor) = fixture();
        let (report, text) = run(
            &extractor,
            json!([
                {"selections": [{"start_index": 0, "end_index": 1}]},
                {"file_name": "missing.npz", "selections": [{"start_index": 0, "end_index": 1}]},
                {"file_name": "a.npz", "selections": []},
                {"file_name": "a.npz"},
                "not an object",
                {"file_name": "a.npz", "selections": [{"start_index": 5, "end_index": 5}]}
            ]),
        );
        assert_eq!(report.entries, 6);
        assert_eq!(report.entries_skipped, 5);
        assert_eq!(report.segments, 1);
        assert_eq!(text, "time\tcurrent\tvoltage\nstart\t\t\n0.0\t15.0\t25.0\n");
    }

    #[test]
    fn wrong_array_name_skips_entry() {
        let (dir, _) = fixture();
        let extractor = Extractor::new(dir.path(), "scope", ChannelMap::default());
        let (report, text) = run(
            &extractor,
            json!([{"file_name": "a.npz", "selections": [{"start_index": 0, "end_index": 1}]}]),
        );
        assert_eq!(report.entries_skipped, 1);
        assert_eq!(text, "time\tcurrent\tvoltage\n");
    }

    #[test]
    fn empty_arrays_skip_entry() {
        let dir = tempfile::tempdir().unwrap();
        let array = NpyArray {
            shape: vec![3, 0],
            fortran_order: false,
            values: Column::F64(Vec::new()),
        };
        write_npz(&dir.path().join("e.npz"), &[("data", &array)]).unwrap();
        let extractor = Extractor::new(dir.path(), "data", ChannelMap::default());
        let (report, _) = run(
            &extractor,
            json!([{"file_name": "e.npz", "selections": [{"start_index": 0, "end_index": 1}]}]),
        );
        assert_eq!(report.entries_skipped, 1);
        assert_eq!(report.segments, 0);
    }
}
