use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui::Color32;

use rusty_pulse::data::model::{PulseSet, PulseTrace};
use rusty_pulse::data::pulses::read_pulses;

use crate::color::generate_palette;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read a pulses file and report dropped lines.
pub fn load_pulse_set(path: &Path) -> Result<PulseSet> {
    let set = read_pulses(path).with_context(|| format!("loading {}", path.display()))?;
    if set.skipped_lines > 0 {
        log::warn!(
            "Skipped {} malformed line(s) in {}",
            set.skipped_lines,
            path.display()
        );
    }
    log::info!("Loaded {} pulses from {}", set.len(), path.display());
    Ok(set)
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Pulses in file order; the label of pulse `i` is `Pulse {i + 1}`.
    pub pulses: Vec<PulseTrace>,

    /// File the pulses were read from.
    pub source: Option<PathBuf>,

    /// Index of the pulse shown in single-pulse mode.
    pub selected: usize,

    /// Draw every pulse on one plot instead of only the selected one.
    pub overlay_all: bool,

    /// Also draw the voltage trace.
    pub show_voltage: bool,

    /// Malformed lines dropped while reading `source`.
    pub skipped_lines: usize,

    /// One colour per pulse, used in overlay mode.
    pub palette: Vec<Color32>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Replace the current pulses with a freshly loaded set.
    pub fn set_pulses(&mut self, set: PulseSet, source: PathBuf) {
        self.palette = generate_palette(set.len());
        self.skipped_lines = set.skipped_lines;
        self.pulses = set.pulses;
        self.source = Some(source);
        self.selected = 0;
        self.status_message = if self.pulses.is_empty() {
            Some("No pulses found in file".to_string())
        } else {
            None
        };
    }

    /// Plot label for pulse `index` (1-based numbering).
    pub fn label(index: usize) -> String {
        format!("Pulse {}", index + 1)
    }

    pub fn selected_pulse(&self) -> Option<&PulseTrace> {
        self.pulses.get(self.selected)
    }

    pub fn select(&mut self, index: usize) {
        if index < self.pulses.len() {
            self.selected = index;
        }
    }

    pub fn select_next(&mut self) {
        self.select(self.selected + 1);
    }

    pub fn select_previous(&mut self) {
        if let Some(prev) = self.selected.checked_sub(1) {
            self.select(prev);
        }
    }

    pub fn color_for(&self, index: usize) -> Color32 {
        self.palette
            .get(index)
            .copied()
            .unwrap_or(Color32::LIGHT_BLUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(n: usize) -> AppState {
        let pulses = (0..n)
            .map(|i| {
                let mut t = PulseTrace::default();
                t.push(0.0, i as f64, 0.0);
                t
            })
            .collect();
        let mut state = AppState::default();
        state.set_pulses(
            PulseSet {
                pulses,
                skipped_lines: 2,
            },
            PathBuf::from("pulses.txt"),
        );
        state
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut state = state_with(3);
        state.select_previous();
        assert_eq!(state.selected, 0);
        state.select_next();
        state.select_next();
        state.select_next();
        assert_eq!(state.selected, 2);
        state.select(10);
        assert_eq!(state.selected, 2);
    }

    #[test]
    fn labels_are_one_based() {
        assert_eq!(AppState::label(0), "Pulse 1");
        assert_eq!(AppState::label(9), "Pulse 10");
    }

    #[test]
    fn loading_resets_selection_and_palette() {
        let mut state = state_with(4);
        state.select(3);
        assert_eq!(state.palette.len(), 4);
        assert_eq!(state.skipped_lines, 2);

        state.set_pulses(PulseSet::default(), PathBuf::from("empty.txt"));
        assert_eq!(state.selected, 0);
        assert!(state.selected_pulse().is_none());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn loads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulses.txt");
        std::fs::write(&path, "time\tcurrent\tvoltage\nstart\t\t\n0.0\t1\t2\nbad\n").unwrap();
        let set = load_pulse_set(&path).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.skipped_lines, 1);
    }
}
