//! Frame energy extraction.
//!
//! The buffer is cut into non-overlapping windows of `frame_size` samples and
//! each window contributes the sum of its squared samples. The last window is
//! zero-padded, so the sequence length is `ceil(len / frame_size)`.

use crate::audio::PcmBuffer;
use crate::error::{ChartError, Result};

#[derive(Clone, Debug)]
pub struct EnergyFrames {
    pub frame_size: usize,
    pub sample_rate: u32,
    pub energies: Vec<f64>,
    /// Start time of each frame in seconds
    pub times: Vec<f64>,
}

impl EnergyFrames {
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    pub fn mean(&self) -> f64 {
        mean(&self.energies)
    }
}

pub fn frame_time(frame: usize, frame_size: usize, sample_rate: u32) -> f64 {
    frame as f64 * frame_size as f64 / sample_rate as f64
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Energy of channel 0.
pub fn extract(buffer: &PcmBuffer, frame_size: usize) -> Result<EnergyFrames> {
    extract_samples(buffer.primary(), frame_size, buffer.sample_rate)
}

pub fn extract_samples(samples: &[f32], frame_size: usize, sample_rate: u32) -> Result<EnergyFrames> {
    if frame_size == 0 {
        return Err(ChartError::InvalidInput("frame size must be > 0".into()));
    }
    if sample_rate == 0 {
        return Err(ChartError::InvalidInput("sample rate must be > 0".into()));
    }

    // Zero padding adds nothing to a sum of squares, so the short final
    // chunk is summed as-is.
    let energies: Vec<f64> = samples
        .chunks(frame_size)
        .map(|chunk| chunk.iter().map(|&s| (s as f64) * (s as f64)).sum())
        .collect();

    let times = (0..energies.len())
        .map(|i| frame_time(i, frame_size, sample_rate))
        .collect();

    log::debug!(
        "Energy: {} frames of {} samples ({:.1} ms)",
        energies.len(),
        frame_size,
        frame_size as f64 * 1000.0 / sample_rate as f64
    );

    Ok(EnergyFrames {
        frame_size,
        sample_rate,
        energies,
        times,
    })
}
