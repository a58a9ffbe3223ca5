//! Tempo estimation from onset intervals.
//!
//! Consecutive onset intervals are grouped by first-fit clustering: each
//! interval joins the first cluster whose representative lies within the
//! tolerance, otherwise it opens a new cluster. Representatives keep the
//! first value seen and are never re-centered, and ties on count resolve to
//! the earliest cluster. The winning interval is converted to BPM and folded
//! by octaves into the configured range.

use crate::config::TempoConfig;

/// Tempo used when there is not enough rhythm to measure.
pub const FALLBACK_BPM: u32 = 120;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntervalCluster {
    pub representative: usize,
    pub count: usize,
}

pub fn intervals(onsets: &[usize]) -> Vec<usize> {
    onsets.windows(2).map(|w| w[1].saturating_sub(w[0])).collect()
}

pub fn cluster_intervals(intervals: &[usize], tolerance: usize) -> Vec<IntervalCluster> {
    let mut clusters: Vec<IntervalCluster> = Vec::new();
    for &interval in intervals {
        match clusters
            .iter_mut()
            .find(|c| c.representative.abs_diff(interval) <= tolerance)
        {
            Some(cluster) => cluster.count += 1,
            None => clusters.push(IntervalCluster {
                representative: interval,
                count: 1,
            }),
        }
    }
    clusters
}

/// Highest count wins; on equal counts the earlier cluster is kept.
pub fn dominant(clusters: &[IntervalCluster]) -> Option<&IntervalCluster> {
    clusters.iter().fold(None, |best: Option<&IntervalCluster>, c| match best {
        Some(b) if b.count >= c.count => Some(b),
        _ => Some(c),
    })
}

/// Fold `bpm` by octaves into `[min_bpm, max_bpm)`.
pub fn normalize_bpm(mut bpm: f64, min_bpm: f64, max_bpm: f64) -> f64 {
    if !bpm.is_finite() || bpm <= 0.0 {
        return FALLBACK_BPM as f64;
    }
    while bpm < min_bpm {
        bpm *= 2.0;
    }
    while bpm >= max_bpm {
        bpm /= 2.0;
    }
    bpm
}

pub fn estimate(onsets: &[usize], frame_size: usize, sample_rate: u32, config: &TempoConfig) -> u32 {
    if onsets.len() < 2 {
        log::debug!("Only {} onset(s), using fallback tempo {}", onsets.len(), FALLBACK_BPM);
        return FALLBACK_BPM;
    }

    let intervals = intervals(onsets);
    let clusters = cluster_intervals(&intervals, config.cluster_tolerance);

    let winner = match dominant(&clusters) {
        Some(c) if c.representative > 0 => c,
        _ => {
            log::debug!("No usable interval cluster, using fallback tempo {}", FALLBACK_BPM);
            return FALLBACK_BPM;
        }
    };

    let seconds_per_beat = winner.representative as f64 * frame_size as f64 / sample_rate as f64;
    let raw_bpm = 60.0 / seconds_per_beat;
    let folded = normalize_bpm(raw_bpm, config.min_bpm, config.max_bpm);

    let mut bpm = folded.round();
    // Rounding can land exactly on the upper bound
    if bpm >= config.max_bpm {
        bpm = (bpm / 2.0).round();
    }

    log::debug!(
        "Tempo: {} clusters, winner {} frames x{} -> {:.2} BPM raw, {} BPM",
        clusters.len(),
        winner.representative,
        winner.count,
        raw_bpm,
        bpm
    );

    bpm as u32
}
