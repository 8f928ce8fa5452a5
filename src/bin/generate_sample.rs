//! `generate-sample`: writes a demo workspace with synthetic pulse recordings.
//!
//! ```text
//! <base>/config.json
//! <base>/selections.json
//! <base>/data/run_000.npz ...
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use rusty_pulse::cli::SampleArgs;
use rusty_pulse::config::{CONFIG_FILE, DEFAULT_ARRAY_NAME, SELECTIONS_FILE};
use rusty_pulse::data::model::Column;
use rusty_pulse::data::npy::{write_npz, NpyArray};

const DATA_DIR: &str = "data";
const SAMPLES_PER_FILE: usize = 4000;
const SAMPLE_PERIOD: f64 = 1e-4;
const PULSES_PER_FILE: usize = 4;
const PULSE_WIDTH: usize = 300;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Square voltage pulses with an RC-shaped current response.
struct Recording {
    time: Vec<f64>,
    voltage: Vec<f64>,
    current: Vec<f64>,
    /// Sample index where each pulse starts.
    pulse_starts: Vec<usize>,
}

fn generate_recording(rng: &mut SimpleRng, t_offset: f64) -> Recording {
    let spacing = SAMPLES_PER_FILE / PULSES_PER_FILE;
    let pulse_starts: Vec<usize> = (0..PULSES_PER_FILE)
        .map(|p| p * spacing + spacing / 4 + (rng.next_f64() * 50.0) as usize)
        .collect();
    let amplitude = 2.0 + rng.next_f64() * 3.0;
    let tau = 20.0 + rng.next_f64() * 40.0;

    let mut time = Vec::with_capacity(SAMPLES_PER_FILE);
    let mut voltage = Vec::with_capacity(SAMPLES_PER_FILE);
    let mut current = Vec::with_capacity(SAMPLES_PER_FILE);

    for k in 0..SAMPLES_PER_FILE {
        time.push(t_offset + k as f64 * SAMPLE_PERIOD);
        let active = pulse_starts
            .iter()
            .find(|&&s| k >= s && k < s + PULSE_WIDTH)
            .map(|&s| (k - s) as f64);
        let (v, i) = match active {
            Some(dk) => (amplitude, amplitude * 0.1 * (-dk / tau).exp()),
            None => (0.0, 0.0),
        };
        voltage.push(v + rng.gauss(0.0, 0.01));
        current.push(i + rng.gauss(0.0, 0.002));
    }

    Recording {
        time,
        voltage,
        current,
        pulse_starts,
    }
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = SampleArgs::parse();

    let data_dir = args.base_dir.join(DATA_DIR);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;

    let mut rng = SimpleRng::new(args.seed);
    let mut selections = Vec::new();

    for file_idx in 0..args.files {
        let rec = generate_recording(&mut rng, file_idx as f64 * 10.0);
        // Row order: time, voltage, current.
        let array = NpyArray::from_rows(&[
            Column::F64(rec.time),
            Column::F64(rec.voltage),
            Column::F64(rec.current),
        ])
        .context("building sample array")?;

        let name = format!("run_{file_idx:03}.npz");
        let path = data_dir.join(&name);
        write_npz(&path, &[(DEFAULT_ARRAY_NAME, &array)])
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote {}", path.display());

        let mut ranges: Vec<serde_json::Value> = rec
            .pulse_starts
            .iter()
            .map(|&s| json!({ "start_index": s.saturating_sub(20), "end_index": s + PULSE_WIDTH + 20 }))
            .collect();
        // Overshoots the recording; clamped to the last sample on extraction.
        ranges.push(json!({ "start_index": SAMPLES_PER_FILE - 200, "end_index": SAMPLES_PER_FILE + 500 }));

        // Stored with a foreign prefix: only the file name is used.
        selections.push(json!({
            "file_name": format!("/lab/scope/exports/{name}"),
            "selections": ranges,
        }));
    }

    write_json(
        &args.base_dir.join(CONFIG_FILE),
        &json!({ "data_folder_path": DATA_DIR }),
    )?;
    write_json(
        &args.base_dir.join(SELECTIONS_FILE),
        &serde_json::Value::Array(selections),
    )?;

    println!(
        "Wrote {} recordings ({} samples each) to {}",
        args.files,
        SAMPLES_PER_FILE,
        data_dir.display()
    );
    Ok(())
}
