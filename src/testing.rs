//! Deterministic PCM fixtures shared by the unit tests.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::audio::PcmBuffer;

/// Single-sample clicks every `period` seconds, starting at `period`.
pub fn click_track(seconds: f64, period: f64, sample_rate: u32) -> PcmBuffer {
    let n = (seconds * sample_rate as f64) as usize;
    let mut samples = vec![0.0f32; n];
    for k in 1.. {
        let idx = (k as f64 * period * sample_rate as f64).round() as usize;
        if idx >= n {
            break;
        }
        samples[idx] = 1.0;
    }
    mono(sample_rate, samples)
}

/// Low-level white noise, seeded so every run sees the same samples.
pub fn noise_floor(seconds: f64, amplitude: f32, sample_rate: u32, seed: u64) -> PcmBuffer {
    let n = (seconds * sample_rate as f64) as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    let samples = (0..n).map(|_| rng.gen_range(-amplitude..=amplitude)).collect();
    mono(sample_rate, samples)
}

/// 60 Hz bursts of `burst_secs` every `period` seconds.
pub fn kick_pattern(seconds: f64, period: f64, burst_secs: f64, sample_rate: u32) -> PcmBuffer {
    let n = (seconds * sample_rate as f64) as usize;
    let burst = (burst_secs * sample_rate as f64) as usize;
    let mut samples = vec![0.0f32; n];
    for k in 1.. {
        let start = (k as f64 * period * sample_rate as f64) as usize;
        if start + burst >= n {
            break;
        }
        for i in 0..burst {
            let t = i as f64 / sample_rate as f64;
            samples[start + i] = (2.0 * std::f64::consts::PI * 60.0 * t).sin() as f32;
        }
    }
    mono(sample_rate, samples)
}

fn mono(sample_rate: u32, samples: Vec<f32>) -> PcmBuffer {
    PcmBuffer::mono(sample_rate, samples).expect("fixture buffer is valid")
}
