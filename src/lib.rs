//! Rhythm-game chart generation from decoded music.
//!
//! The pipeline runs strictly in order: frame energy, onsets, tempo,
//! structure, offset, candidate beats, notes. Acquisition, decoding and
//! band filtering live in [`audio`]; everything after the PCM buffer is
//! deterministic except note placement, which draws from a caller-supplied
//! random source.

pub mod analysis;
pub mod audio;
pub mod chart;
pub mod config;
pub mod error;

#[cfg(test)]
mod testing;

pub use error::{ChartError, Result};
