pub mod beat_grid;
pub mod generator;
pub mod note;

use rand::Rng;
use serde::Serialize;

use crate::analysis::structure::Structure;
use crate::analysis::Analysis;
use crate::config::NoteConfig;
use generator::{NoteGenerator, Timeline};
use note::Note;

/// Two difficulty tiers. `easy` is every other note of `hard`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Patterns {
    pub easy: Vec<Note>,
    pub hard: Vec<Note>,
}

impl Patterns {
    pub fn from_hard(hard: Vec<Note>) -> Self {
        let easy = hard.iter().step_by(2).cloned().collect();
        Self { easy, hard }
    }
}

/// The finished, serializable chart for one track.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub title: String,
    pub bpm: u32,
    pub offset_sec: f64,
    pub structure: Structure,
    pub patterns: Patterns,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Note>,
}

/// Place notes for an analyzed track and assemble the chart.
pub fn build<R: Rng + ?Sized>(title: &str, analysis: &Analysis, config: &NoteConfig, rng: &mut R) -> Chart {
    let energy = &analysis.energy;
    let candidates = beat_grid::candidates(
        &analysis.onsets,
        config.min_real_onsets,
        analysis.bpm,
        analysis.structure.total_duration,
        energy.frame_size,
        energy.sample_rate,
    );

    let timeline = Timeline {
        candidates: &candidates,
        energies: &energy.energies,
        bpm: analysis.bpm,
        frame_size: energy.frame_size,
        sample_rate: energy.sample_rate,
        offset: analysis.offset,
        structure: analysis.structure,
    };
    let patterns = NoteGenerator::new(config).generate(&timeline, rng);

    let markers = if config.markers {
        generator::region_markers(&analysis.structure, analysis.bpm)
    } else {
        Vec::new()
    };

    let long_count = patterns.hard.iter().filter(|n| n.is_long()).count();
    log::info!(
        "Chart: {} hard notes ({} long), {} easy notes",
        patterns.hard.len(),
        long_count,
        patterns.easy.len()
    );

    Chart {
        title: title.to_string(),
        bpm: analysis.bpm,
        offset_sec: analysis.offset,
        structure: analysis.structure,
        patterns,
        markers,
    }
}
