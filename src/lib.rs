//! Extract labelled pulse segments from NumPy time-series archives and read
//! them back for plotting.
//!
//! The `extract-pulses` binary turns `config.json` + `selections.json` into a
//! tab-separated `pulses.txt`; the `rusty-pulse` viewer plots that file.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod extract;

pub use error::{ExtractError, Result, SkipReason};
