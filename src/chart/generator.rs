//! Constraint-driven note placement.
//!
//! Each candidate frame runs through a fixed sequence of checks and is
//! skipped by the first one it fails:
//!
//! 1. offset-corrected time must be non-negative
//! 2. the beat must lie inside the playable region (after intro, before outro)
//! 3. it must be at least `min_spacing_beats` after the last accepted note
//! 4. a lane is drawn from the ergonomic distribution; the lane must not be
//!    covered by a long note (plus margin)
//! 5. frames quieter than `quiet_ratio` of the mean energy, or below the
//!    absolute silence floor, are dropped
//!
//! Survivors become taps, or long notes when the frame is loud, far
//! enough from the previous long note, and the hold ends before the outro.
//! Random draws happen in a fixed order (lane, long chance, long length) so
//! a seeded generator is reproducible.

use rand::Rng;

use super::note::{round2, Note, LANE_COUNT, MARKER_LANE};
use super::Patterns;
use crate::analysis::energy::{frame_time, mean};
use crate::analysis::structure::Structure;
use crate::config::NoteConfig;

/// Lane probabilities: middle fingers (lanes 1, 2) are favoured over ring fingers.
pub const LANE_WEIGHTS: [f64; LANE_COUNT] = [0.15, 0.35, 0.35, 0.15];

/// Long note lengths in beats, drawn uniformly.
const LONG_LENGTHS: std::ops::RangeInclusive<u32> = 1..=3;

/// Slack for comparing values already rounded to 2 decimals.
const BEAT_EPSILON: f64 = 1e-9;

/// Everything the generator reads from the analysis stage.
#[derive(Clone, Copy, Debug)]
pub struct Timeline<'a> {
    /// Candidate frame indices, ascending
    pub candidates: &'a [usize],
    pub energies: &'a [f64],
    pub bpm: u32,
    pub frame_size: usize,
    pub sample_rate: u32,
    pub offset: f64,
    pub structure: Structure,
}

impl Timeline<'_> {
    fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm.max(1) as f64
    }
}

pub struct NoteGenerator<'a> {
    config: &'a NoteConfig,
}

#[derive(Default)]
struct Placement {
    hard: Vec<Note>,
    last_beat: Option<f64>,
    last_long_end: Option<f64>,
    long_notes: [Vec<(f64, f64)>; LANE_COUNT],
}

impl Placement {
    fn lane_covered(&self, lane: usize, beat: f64, margin: f64) -> bool {
        self.long_notes[lane]
            .iter()
            .any(|&(start, end)| beat >= start - margin && beat <= end + margin)
    }

    /// True when `[beat, end]` widened by `margin` touches no long note on `lane`.
    fn long_fits(&self, lane: usize, beat: f64, end: f64, margin: f64) -> bool {
        self.long_notes[lane]
            .iter()
            .all(|&(start, stop)| end + margin < start - margin || beat - margin > stop + margin)
    }
}

impl<'a> NoteGenerator<'a> {
    pub fn new(config: &'a NoteConfig) -> Self {
        Self { config }
    }

    pub fn generate<R: Rng + ?Sized>(&self, timeline: &Timeline<'_>, rng: &mut R) -> Patterns {
        let cfg = self.config;
        let spb = timeline.seconds_per_beat();
        let mean_energy = mean(timeline.energies);

        let floor = silence_floor_energy(cfg.silence_floor_db, timeline.frame_size);

        let mut state = Placement::default();
        let mut skipped = [0usize; 5];

        for &frame in timeline.candidates {
            let raw = frame_time(frame, timeline.frame_size, timeline.sample_rate);
            let time = raw - timeline.offset;
            if time < 0.0 {
                skipped[0] += 1;
                continue;
            }

            let beat = round2(time / spb);
            if !timeline.structure.contains(beat * spb) {
                skipped[1] += 1;
                continue;
            }

            if let Some(last) = state.last_beat {
                if beat - last + BEAT_EPSILON < cfg.min_spacing_beats {
                    skipped[2] += 1;
                    continue;
                }
            }

            let lane = pick_lane(rng);
            if state.lane_covered(lane, beat, cfg.long_margin_beats) {
                skipped[3] += 1;
                continue;
            }

            let ratio = energy_ratio(timeline.energies, frame, mean_energy, floor);
            let long_gap_ok = state
                .last_long_end
                .map_or(true, |end| beat - end + BEAT_EPSILON >= cfg.min_long_gap_beats);
            let long_eligible = long_gap_ok && ratio > cfg.loud_ratio;

            if ratio < cfg.quiet_ratio {
                skipped[4] += 1;
                continue;
            }

            let mut note = Note::tap(lane as u8, beat);
            if long_eligible && rng.gen_bool(cfg.long_probability) {
                let length = rng.gen_range(LONG_LENGTHS) as f64;
                let end = round2(beat + length);
                // A hold must also release inside the playable region
                if timeline.structure.contains(end * spb)
                    && state.long_fits(lane, beat, end, cfg.long_margin_beats)
                {
                    note = Note::long(lane as u8, beat, end);
                    state.long_notes[lane].push((beat, end));
                    state.last_long_end = Some(end);
                }
            }

            state.last_beat = Some(beat);
            state.hard.push(note);
        }

        log::debug!(
            "Notes: {} accepted from {} candidates (skipped: pre-song {}, outside region {}, spacing {}, lane busy {}, quiet {})",
            state.hard.len(),
            timeline.candidates.len(),
            skipped[0],
            skipped[1],
            skipped[2],
            skipped[3],
            skipped[4]
        );

        Patterns::from_hard(state.hard)
    }
}

/// Draw a lane from [`LANE_WEIGHTS`].
pub fn pick_lane<R: Rng + ?Sized>(rng: &mut R) -> usize {
    let roll: f64 = rng.gen();
    let mut acc = 0.0;
    for (lane, weight) in LANE_WEIGHTS.iter().enumerate() {
        acc += weight;
        if roll < acc {
            return lane;
        }
    }
    LANE_COUNT - 1
}

/// Frame energy of a full frame at a constant RMS level of `db` dBFS.
pub fn silence_floor_energy(db: f64, frame_size: usize) -> f64 {
    frame_size as f64 * 10f64.powf(db / 10.0)
}

/// Energy of `frame` relative to the track mean. Frames at or below `floor`,
/// frames past the end of the sequence and all-silent tracks give 0.
pub fn energy_ratio(energies: &[f64], frame: usize, mean: f64, floor: f64) -> f64 {
    if mean <= 0.0 {
        return 0.0;
    }
    match energies.get(frame) {
        Some(&e) if e > floor => e / mean,
        _ => 0.0,
    }
}

/// Non-playable taps on [`MARKER_LANE`] at the start and end of the playable region.
pub fn region_markers(structure: &Structure, bpm: u32) -> Vec<Note> {
    let spb = 60.0 / bpm.max(1) as f64;
    vec![
        Note::tap(MARKER_LANE, structure.intro_end / spb),
        Note::tap(MARKER_LANE, structure.outro_start / spb),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::note::NoteKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// 120 BPM at 100 frames per second: one beat every 50 frames.
    fn structure(total: f64) -> Structure {
        Structure {
            total_duration: total,
            intro_end: total * 0.05,
            outro_start: total * 0.9,
        }
    }

    fn timeline<'a>(candidates: &'a [usize], energies: &'a [f64], total: f64) -> Timeline<'a> {
        Timeline {
            candidates,
            energies,
            bpm: 120,
            frame_size: 441,
            sample_rate: 44100,
            offset: 0.0,
            structure: structure(total),
        }
    }

    /// Every frame a candidate, loud spikes every 25 frames over a quiet floor.
    fn dense_fixture(seconds: usize) -> (Vec<usize>, Vec<f64>) {
        let n = seconds * 100;
        let candidates: Vec<usize> = (0..n).collect();
        let energies: Vec<f64> = (0..n).map(|i| if i % 25 == 0 { 10.0 } else { 0.5 }).collect();
        (candidates, energies)
    }

    fn generate(seed: u64, tl: &Timeline<'_>) -> Patterns {
        let config = NoteConfig::default();
        NoteGenerator::new(&config).generate(tl, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn lane_distribution_favours_middle_fingers() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut counts = [0usize; LANE_COUNT];
        for _ in 0..20_000 {
            counts[pick_lane(&mut rng)] += 1;
        }
        let share = |lane: usize| counts[lane] as f64 / 20_000.0;
        assert!((share(0) - 0.15).abs() < 0.02);
        assert!((share(1) - 0.35).abs() < 0.02);
        assert!((share(2) - 0.35).abs() < 0.02);
        assert!((share(3) - 0.15).abs() < 0.02);
    }

    #[test]
    fn spacing_and_region_hold_for_many_seeds() {
        let (candidates, energies) = dense_fixture(60);
        let tl = timeline(&candidates, &energies, 60.0);
        let spb = 0.5;
        for seed in 0..20 {
            let p = generate(seed, &tl);
            assert!(!p.hard.is_empty());
            for w in p.hard.windows(2) {
                assert!(w[1].beat - w[0].beat + BEAT_EPSILON >= 0.25);
            }
            for n in &p.hard {
                assert!(tl.structure.contains(n.beat * spb), "note at beat {}", n.beat);
                if let Some(end) = n.end_beat {
                    assert!(tl.structure.contains(end * spb), "hold ends at beat {}", end);
                }
                assert!((n.lane as usize) < LANE_COUNT);
            }
        }
    }

    #[test]
    fn long_notes_never_overlap_on_a_lane() {
        let (candidates, energies) = dense_fixture(120);
        let tl = timeline(&candidates, &energies, 120.0);
        let mut saw_long = false;
        for seed in 0..20 {
            let p = generate(seed, &tl);
            for lane in 0..LANE_COUNT as u8 {
                let spans: Vec<(f64, f64)> = p
                    .hard
                    .iter()
                    .filter(|n| n.lane == lane && n.is_long())
                    .map(|n| n.guarded_span(0.2))
                    .collect();
                saw_long |= !spans.is_empty();
                for (i, a) in spans.iter().enumerate() {
                    for b in &spans[i + 1..] {
                        assert!(a.1 < b.0 || b.1 < a.0, "overlap {:?} {:?}", a, b);
                    }
                }
            }
            for n in p.hard.iter().filter(|n| n.is_long()) {
                let end = n.end_beat.unwrap();
                assert!(end > n.beat);
                let len = end - n.beat;
                assert!([1.0, 2.0, 3.0].iter().any(|l| (len - l).abs() < 1e-6));
            }
        }
        assert!(saw_long);
    }

    #[test]
    fn taps_avoid_lanes_held_by_long_notes() {
        let (candidates, energies) = dense_fixture(60);
        let tl = timeline(&candidates, &energies, 60.0);
        for seed in 0..10 {
            let p = generate(seed, &tl);
            for long in p.hard.iter().filter(|n| n.is_long()) {
                let (lo, hi) = long.guarded_span(0.2);
                let intruder = p
                    .hard
                    .iter()
                    .filter(|n| n.lane == long.lane && n != &long)
                    .any(|n| n.beat >= lo && n.beat <= hi);
                assert!(!intruder);
            }
        }
    }

    #[test]
    fn easy_is_even_indices_of_hard() {
        let (candidates, energies) = dense_fixture(30);
        let tl = timeline(&candidates, &energies, 30.0);
        let p = generate(3, &tl);
        assert_eq!(p.easy.len(), (p.hard.len() + 1) / 2);
        for (i, note) in p.easy.iter().enumerate() {
            assert_eq!(note, &p.hard[2 * i]);
        }
    }

    #[test]
    fn quiet_frames_are_rejected() {
        let candidates: Vec<usize> = (0..3000).step_by(50).collect();
        let mut energies = vec![1.0; 3000];
        // Candidates themselves sit in near-silence
        for &c in &candidates {
            energies[c] = 0.01;
        }
        let tl = timeline(&candidates, &energies, 30.0);
        assert!(generate(0, &tl).hard.is_empty());
    }

    #[test]
    fn silence_produces_no_notes() {
        let candidates: Vec<usize> = (0..3000).step_by(50).collect();
        let energies = vec![0.0; 3000];
        let tl = timeline(&candidates, &energies, 30.0);
        let p = generate(0, &tl);
        assert!(p.hard.is_empty());
        assert!(p.easy.is_empty());
    }

    #[test]
    fn offset_shifts_and_drops_pre_song_candidates() {
        let candidates = [0usize, 300, 350];
        let energies = vec![1.0; 400];
        let mut tl = timeline(&candidates, &energies, 4.0);
        tl.offset = 0.5;
        tl.structure = Structure {
            total_duration: 4.0,
            intro_end: 0.0,
            outro_start: 4.0,
        };
        let config = NoteConfig {
            long_probability: 0.0,
            ..NoteConfig::default()
        };
        let p = NoteGenerator::new(&config).generate(&tl, &mut StdRng::seed_from_u64(0));
        let beats: Vec<f64> = p.hard.iter().map(|n| n.beat).collect();
        // frame 300 -> 3.0 s - 0.5 s = 2.5 s = beat 5
        assert_eq!(beats, vec![5.0, 6.0]);
    }

    #[test]
    fn long_notes_end_before_outro() {
        // beat 1.0 has room to hold; beat 5.8 is 0.1 s before the outro
        let candidates = [50usize, 290];
        let mut energies = vec![1.0; 400];
        energies[50] = 10.0;
        energies[290] = 10.0;
        let mut tl = timeline(&candidates, &energies, 4.0);
        tl.structure = Structure {
            total_duration: 4.0,
            intro_end: 0.0,
            outro_start: 3.0,
        };
        let config = NoteConfig {
            long_probability: 1.0,
            ..NoteConfig::default()
        };
        for seed in 0..20 {
            let p = NoteGenerator::new(&config).generate(&tl, &mut StdRng::seed_from_u64(seed));
            assert_eq!(p.hard.len(), 2);
            assert!(p.hard[0].is_long());
            assert_eq!(p.hard[1].kind, NoteKind::Tap);
            assert_eq!(p.hard[1].beat, 5.8);
        }
    }

    #[test]
    fn no_long_notes_when_probability_is_zero() {
        let (candidates, energies) = dense_fixture(60);
        let tl = timeline(&candidates, &energies, 60.0);
        let config = NoteConfig {
            long_probability: 0.0,
            ..NoteConfig::default()
        };
        let p = NoteGenerator::new(&config).generate(&tl, &mut StdRng::seed_from_u64(9));
        assert!(p.hard.iter().all(|n| n.kind == NoteKind::Tap));
    }

    #[test]
    fn same_seed_same_chart() {
        let (candidates, energies) = dense_fixture(30);
        let tl = timeline(&candidates, &energies, 30.0);
        assert_eq!(generate(42, &tl), generate(42, &tl));
    }

    #[test]
    fn markers_bound_the_playable_region() {
        let markers = region_markers(&structure(100.0), 120);
        assert_eq!(markers.len(), 2);
        assert!(markers.iter().all(|m| m.lane == MARKER_LANE));
        assert_eq!(markers[0].beat, 10.0);
        assert_eq!(markers[1].beat, 180.0);
    }

    #[test]
    fn energy_ratio_handles_edges() {
        assert_eq!(energy_ratio(&[1.0, 3.0], 1, 2.0, 0.0), 1.5);
        assert_eq!(energy_ratio(&[1.0, 3.0], 5, 2.0, 0.0), 0.0);
        assert_eq!(energy_ratio(&[0.0, 0.0], 0, 0.0, 0.0), 0.0);
        assert_eq!(energy_ratio(&[1e-9, 1e-9], 0, 1e-9, 1e-6), 0.0);
    }

    #[test]
    fn silence_floor_scales_with_frame() {
        // -20 dBFS is an RMS of 0.1, so 0.01 energy per sample
        assert!((silence_floor_energy(-20.0, 100) - 1.0).abs() < 1e-12);
    }
}
