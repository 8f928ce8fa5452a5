//! `extract-pulses`: selections + NumPy archives → pulses.txt.

use std::process::ExitCode;

use clap::Parser;
use rusty_pulse::cli::ExtractArgs;
use rusty_pulse::extract::run_extraction;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = ExtractArgs::parse();
    let workspace = args.workspace();

    match run_extraction(&workspace) {
        Ok(_) => {
            println!("Done. Pulses written to: {}", workspace.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
