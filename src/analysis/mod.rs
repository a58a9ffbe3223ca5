pub mod energy;
pub mod offset;
pub mod onset;
pub mod structure;
pub mod tempo;

use crate::audio::filter::{BandFilter, FilterKind};
use crate::audio::PcmBuffer;
use crate::config::{AnalysisConfig, Config};
use crate::error::Result;

use energy::EnergyFrames;
use structure::Structure;

/// Everything measured about a track before notes are placed.
#[derive(Clone, Debug)]
pub struct Analysis {
    /// Broadband energy of channel 0
    pub energy: EnergyFrames,
    pub onsets: Vec<usize>,
    pub bpm: u32,
    pub offset: f64,
    pub structure: Structure,
}

/// Run energy, onset, tempo, offset and structure analysis in order.
pub fn analyze(buffer: &PcmBuffer, filter: &dyn BandFilter, config: &Config) -> Result<Analysis> {
    let frame_size = config.analysis.frame_size;
    let sample_rate = buffer.sample_rate;
    let duration = buffer.duration();

    let energy = energy::extract(buffer, frame_size)?;

    let onsets = if config.analysis.enhanced {
        let kick_snare = kick_snare_energy(buffer, filter, &config.analysis)?;
        onset::detect(&kick_snare.energies, config.analysis.onset_threshold)
    } else {
        onset::detect(&energy.energies, config.analysis.onset_threshold)
    };

    let bpm = tempo::estimate(&onsets, frame_size, sample_rate, &config.tempo);
    let structure = structure::analyze(&energy, duration, &config.structure);
    let offset = offset::estimate(&onsets, bpm, frame_size, sample_rate, &config.offset);

    log::info!(
        "Analysis: {} frames, {} onsets, {} BPM, offset {:.3}s, playable {:.1}s-{:.1}s of {:.1}s",
        energy.len(),
        onsets.len(),
        bpm,
        offset,
        structure.intro_end,
        structure.outro_start,
        structure.total_duration
    );

    Ok(Analysis {
        energy,
        onsets,
        bpm,
        offset,
        structure,
    })
}

/// Energy of the kick (low-pass) plus snare (band-pass) renderings of the
/// buffer. The two filter passes are independent and run in parallel.
pub fn kick_snare_energy(
    buffer: &PcmBuffer,
    filter: &dyn BandFilter,
    config: &AnalysisConfig,
) -> Result<EnergyFrames> {
    let (kick_lo, kick_hi) = config.kick_band;
    let (snare_lo, snare_hi) = config.snare_band;

    let (kick, snare) = rayon::join(
        || filter.filter(buffer, FilterKind::LowPass, kick_lo, kick_hi),
        || filter.filter(buffer, FilterKind::BandPass, snare_lo, snare_hi),
    );

    let summed: Vec<f32> = kick
        .primary()
        .iter()
        .zip(snare.primary())
        .map(|(k, s)| k + s)
        .collect();

    energy::extract_samples(&summed, config.frame_size, buffer.sample_rate)
}
