//! Data layer: core types, the archive codec, loading, and the pulses file.
//!
//! Architecture:
//! ```text
//!   a.npz ──► npy ──► loader ──► ArrayBundle
//!                                    │  selection (clamped IndexRange)
//!                                    ▼
//!                               PulseSegment ──► pulses.txt
//!                                                    │
//!                                                    ▼
//!                                   pulses ──► PulseSet (viewer)
//! ```

pub mod loader;
pub mod model;
pub mod npy;
pub mod pulses;
pub mod selection;
