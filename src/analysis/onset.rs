/// Pick frames that are local energy maxima above `mean * threshold_factor`.
///
/// The first and last frames are never candidates. Plateaus yield every
/// frame of the plateau because both neighbour comparisons are inclusive.
pub fn detect(energies: &[f64], threshold_factor: f64) -> Vec<usize> {
    let n = energies.len();
    if n < 3 {
        return Vec::new();
    }

    let mean = energies.iter().sum::<f64>() / n as f64;
    let threshold = mean * threshold_factor;

    let onsets: Vec<usize> = (1..n - 1)
        .filter(|&i| {
            let e = energies[i];
            e > threshold && e >= energies[i - 1] && e >= energies[i + 1]
        })
        .collect();

    log::debug!(
        "Onsets: {} of {} frames above {:.6} (mean {:.6} x {:.2})",
        onsets.len(),
        n,
        threshold,
        mean,
        threshold_factor
    );

    onsets
}
