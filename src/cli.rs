//! Command-line arguments for the binaries.
//!
//! Every tool works relative to an explicit base directory (default: the
//! current directory) instead of the location of the executable.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Workspace, PULSES_FILE};

/// Extract pulse segments from NumPy archives into a pulses file.
#[derive(Debug, Parser)]
#[command(name = "extract-pulses", version, about, long_about = None)]
pub struct ExtractArgs {
    /// Directory holding config.json and selections.json.
    #[arg(short, long, default_value = ".")]
    pub base_dir: PathBuf,

    /// Configuration file [default: <BASE_DIR>/config.json].
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Selections file [default: <BASE_DIR>/selections.json].
    #[arg(long)]
    pub selections: Option<PathBuf>,

    /// Output pulses file [default: <BASE_DIR>/pulses.txt].
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ExtractArgs {
    /// Workspace with the standard layout plus any overrides.
    pub fn workspace(&self) -> Workspace {
        let mut ws = Workspace::new(&self.base_dir);
        if let Some(config) = &self.config {
            ws.config = config.clone();
        }
        if let Some(selections) = &self.selections {
            ws.selections = selections.clone();
        }
        if let Some(output) = &self.output {
            ws.output = output.clone();
        }
        ws
    }
}

/// Plot the pulses stored in a pulses file.
#[derive(Debug, Parser)]
#[command(name = "rusty-pulse", version, about, long_about = None)]
pub struct ViewArgs {
    /// Directory holding pulses.txt.
    #[arg(short, long, default_value = ".")]
    pub base_dir: PathBuf,

    /// Pulses file to open [default: <BASE_DIR>/pulses.txt].
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

impl ViewArgs {
    pub fn input_path(&self) -> PathBuf {
        self.input
            .clone()
            .unwrap_or_else(|| self.base_dir.join(PULSES_FILE))
    }
}

/// Write a synthetic demo workspace.
#[derive(Debug, Parser)]
#[command(name = "generate-sample", version, about, long_about = None)]
pub struct SampleArgs {
    /// Directory to write config.json, selections.json and the data folder into.
    #[arg(short, long, default_value = ".")]
    pub base_dir: PathBuf,

    /// Number of archives to generate.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub files: u32,

    /// PRNG seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn extract_defaults_to_current_dir() {
        let args = ExtractArgs::parse_from(["extract-pulses"]);
        let ws = args.workspace();
        assert_eq!(ws.config, Path::new("./config.json"));
        assert_eq!(ws.output, Path::new("./pulses.txt"));
    }

    #[test]
    fn extract_overrides() {
        let args = ExtractArgs::parse_from([
            "extract-pulses",
            "--base-dir",
            "/runs/7",
            "--output",
            "/tmp/out.tsv",
        ]);
        let ws = args.workspace();
        assert_eq!(ws.base_dir, Path::new("/runs/7"));
        assert_eq!(ws.selections, Path::new("/runs/7/selections.json"));
        assert_eq!(ws.output, Path::new("/tmp/out.tsv"));
    }

    #[test]
    fn view_input_defaults_under_base_dir() {
        let args = ViewArgs::parse_from(["rusty-pulse", "-b", "/runs/7"]);
        assert_eq!(args.input_path(), Path::new("/runs/7/pulses.txt"));
        let args = ViewArgs::parse_from(["rusty-pulse", "-i", "x.txt"]);
        assert_eq!(args.input_path(), Path::new("x.txt"));
    }

    #[test]
    fn sample_file_count_is_bounded() {
        assert!(SampleArgs::try_parse_from(["generate-sample", "--files", "0"]).is_err());
        assert_eq!(SampleArgs::parse_from(["generate-sample"]).files, 3);
    }
}
