use serde::Serialize;

use super::energy::{mean, EnergyFrames};
use crate::config::StructureConfig;

/// Coarse song layout in seconds. Notes are only placed in
/// `[intro_end, outro_start]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Structure {
    #[serde(rename = "totalDurSec")]
    pub total_duration: f64,
    #[serde(rename = "introEndSec")]
    pub intro_end: f64,
    #[serde(rename = "outroStartSec")]
    pub outro_start: f64,
}

impl Structure {
    pub fn contains(&self, time: f64) -> bool {
        time >= self.intro_end && time <= self.outro_start
    }
}

/// Three-bucket heuristic: a quiet first (last) third earns a longer intro
/// (outro). Loud or very short tracks keep the short defaults.
pub fn analyze(frames: &EnergyFrames, total_duration: f64, config: &StructureConfig) -> Structure {
    let n = frames.len();
    let global = frames.mean();
    let third = n / 3;

    let (intro_quiet, outro_quiet) = if third == 0 || global <= 0.0 {
        (false, false)
    } else {
        let intro_mean = mean(&frames.energies[..third]);
        let outro_mean = mean(&frames.energies[n - third..]);
        log::debug!(
            "Structure: intro {:.3}x, outro {:.3}x of global mean",
            intro_mean / global,
            outro_mean / global
        );
        (
            intro_mean < config.quiet_ratio * global,
            outro_mean < config.quiet_ratio * global,
        )
    };

    let intro_fraction = if intro_quiet { config.intro_long } else { config.intro_short };
    let outro_fraction = if outro_quiet { config.outro_long } else { config.outro_short };

    Structure {
        total_duration,
        intro_end: total_duration * intro_fraction,
        outro_start: total_duration * outro_fraction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(energies: Vec<f64>) -> EnergyFrames {
        let times = (0..energies.len()).map(|i| i as f64 * 0.01).collect();
        EnergyFrames {
            frame_size: 441,
            sample_rate: 44100,
            energies,
            times,
        }
    }

    #[test]
    fn loud_track_keeps_short_defaults() {
        let f = frames(vec![1.0; 300]);
        let s = analyze(&f, 3.0, &StructureConfig::default());
        assert!((s.intro_end - 0.15).abs() < 1e-9);
        assert!((s.outro_start - 2.7).abs() < 1e-9);
        assert_eq!(s.total_duration, 3.0);
    }

    #[test]
    fn quiet_intro_extends_boundary() {
        let mut e = vec![1.0; 300];
        e[..100].iter_mut().for_each(|v| *v = 0.1);
        let s = analyze(&frames(e), 100.0, &StructureConfig::default());
        assert!((s.intro_end - 12.0).abs() < 1e-9);
        assert!((s.outro_start - 90.0).abs() < 1e-9);
    }

    #[test]
    fn quiet_outro_moves_start_earlier() {
        let mut e = vec![1.0; 300];
        e[200..].iter_mut().for_each(|v| *v = 0.0);
        let s = analyze(&frames(e), 100.0, &StructureConfig::default());
        assert!((s.intro_end - 5.0).abs() < 1e-9);
        assert!((s.outro_start - 82.0).abs() < 1e-9);
    }

    #[test]
    fn silence_and_tiny_inputs_use_defaults() {
        let silent = analyze(&frames(vec![0.0; 300]), 10.0, &StructureConfig::default());
        assert!((silent.intro_end - 0.5).abs() < 1e-9);
        let tiny = analyze(&frames(vec![1.0, 0.0]), 10.0, &StructureConfig::default());
        assert!((tiny.outro_start - 9.0).abs() < 1e-9);
    }

    #[test]
    fn containment_is_inclusive() {
        let s = Structure {
            total_duration: 10.0,
            intro_end: 1.0,
            outro_start: 9.0,
        };
        assert!(s.contains(1.0));
        assert!(s.contains(9.0));
        assert!(!s.contains(0.99));
        assert!(!s.contains(9.01));
    }
}
