//! Synthetic beat positions for tracks whose detected onsets are too sparse.

/// Frame indices of an even grid at `bpm`, starting at time 0 and stopping
/// before `total_duration`.
pub fn generate(bpm: u32, total_duration: f64, frame_size: usize, sample_rate: u32) -> Vec<usize> {
    if bpm == 0 || frame_size == 0 || total_duration <= 0.0 {
        return Vec::new();
    }

    let seconds_per_beat = 60.0 / bpm as f64;
    let frames_per_second = sample_rate as f64 / frame_size as f64;

    (0..)
        .map(|k| k as f64 * seconds_per_beat)
        .take_while(|&t| t < total_duration)
        .map(|t| (t * frames_per_second).round() as usize)
        .collect()
}

/// Sorted, duplicate-free union of real and synthetic onsets.
pub fn merge(real: &[usize], synthetic: &[usize]) -> Vec<usize> {
    let mut merged: Vec<usize> = real.iter().chain(synthetic).copied().collect();
    merged.sort_unstable();
    merged.dedup();
    merged
}

/// Candidate beat positions for note generation. The grid is merged in only
/// when fewer than `min_real_onsets` onsets were detected.
pub fn candidates(
    real: &[usize],
    min_real_onsets: usize,
    bpm: u32,
    total_duration: f64,
    frame_size: usize,
    sample_rate: u32,
) -> Vec<usize> {
    if real.len() >= min_real_onsets {
        return real.to_vec();
    }
    let grid = generate(bpm, total_duration, frame_size, sample_rate);
    log::debug!(
        "Only {} real onsets (< {}), merging {} grid beats",
        real.len(),
        min_real_onsets,
        grid.len()
    );
    merge(real, &grid)
}
