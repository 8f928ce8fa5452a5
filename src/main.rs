mod app;
mod color;
mod state;
mod ui;

use app::RustyPulseApp;
use clap::Parser;
use eframe::egui;
use rusty_pulse::cli::ViewArgs;
use state::{load_pulse_set, AppState};

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = ViewArgs::parse();
    let input = args.input_path();

    if !input.exists() {
        log::error!("pulses file not found at {}", input.display());
        return Ok(());
    }
    let pulses = match load_pulse_set(&input) {
        Ok(pulses) => pulses,
        Err(e) => {
            log::error!("{e:#}");
            return Ok(());
        }
    };
    if pulses.is_empty() {
        log::warn!("No pulses found in {}", input.display());
        return Ok(());
    }

    let mut state = AppState::default();
    state.set_pulses(pulses, input);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Pulse – Pulse Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(RustyPulseApp::new(state)))),
    )
}
