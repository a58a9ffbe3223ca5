use crate::analysis::energy::frame_time;
use crate::config::OffsetConfig;

/// Latency compensation used when the phase estimate cannot be trusted.
pub const DEFAULT_OFFSET_SEC: f64 = 0.04;

/// Signed distance in seconds from `time` to the nearest beat at `bpm`.
pub fn beat_deviation(time: f64, bpm: f64) -> f64 {
    let beat = time * bpm / 60.0;
    let deviation_beats = beat - beat.round();
    deviation_beats * 60.0 / bpm
}

/// Mean phase of onsets relative to the beat grid, in seconds.
///
/// Deviations outside `inlier_window` are dropped as syncopation or
/// detection noise. Falls back to [`DEFAULT_OFFSET_SEC`] when fewer than
/// `min_inliers` remain or the mean is non-finite or within `near_zero` of 0.
pub fn estimate(onsets: &[usize], bpm: u32, frame_size: usize, sample_rate: u32, config: &OffsetConfig) -> f64 {
    if bpm == 0 {
        return DEFAULT_OFFSET_SEC;
    }
    let bpm = bpm as f64;

    let inliers: Vec<f64> = onsets
        .iter()
        .map(|&frame| beat_deviation(frame_time(frame, frame_size, sample_rate), bpm))
        .filter(|d| d.abs() <= config.inlier_window)
        .collect();

    if inliers.len() < config.min_inliers {
        log::debug!(
            "Offset: {} inliers (< {}), using default {:.3}s",
            inliers.len(),
            config.min_inliers,
            DEFAULT_OFFSET_SEC
        );
        return DEFAULT_OFFSET_SEC;
    }

    let offset = inliers.iter().sum::<f64>() / inliers.len() as f64;
    if !offset.is_finite() || offset.abs() < config.near_zero {
        log::debug!("Offset: estimate {:.5}s rejected, using default", offset);
        return DEFAULT_OFFSET_SEC;
    }

    log::debug!(
        "Offset: {:.4}s from {}/{} inliers",
        offset,
        inliers.len(),
        onsets.len()
    );
    offset
}
