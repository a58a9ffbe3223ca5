use std::f64::consts::PI;

use super::decode::PcmBuffer;

/*
| kind      | cutoff used         | passes                |
| --------- | ------------------- | --------------------- |
| low-pass  | high_hz             | below high_hz         |
| band-pass | sqrt(low * high)    | between low and high  |
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    BandPass,
}

/// Frequency-domain isolation, treated by the analysis as a pure function.
///
/// Implementations must return a buffer with the same channel count, length
/// and sample rate as the input.
pub trait BandFilter: Sync {
    fn filter(&self, buffer: &PcmBuffer, kind: FilterKind, low_hz: f64, high_hz: f64) -> PcmBuffer;
}

/// Second-order IIR (RBJ cookbook) filter applied independently per channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct BiquadFilter;

#[derive(Debug, Clone, Copy)]
struct Coefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Coefficients {
    fn design(kind: FilterKind, low_hz: f64, high_hz: f64, sample_rate: u32) -> Self {
        let nyquist = sample_rate as f64 / 2.0;
        let (center, q) = match kind {
            FilterKind::LowPass => (high_hz, std::f64::consts::FRAC_1_SQRT_2),
            FilterKind::BandPass => {
                let center = (low_hz.max(1.0) * high_hz).sqrt();
                let bandwidth = (high_hz - low_hz).max(1.0);
                (center, center / bandwidth)
            }
        };
        let center = center.clamp(1.0, nyquist * 0.99);

        let w0 = 2.0 * PI * center / sample_rate as f64;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        let a0 = 1.0 + alpha;

        let (b0, b1, b2) = match kind {
            FilterKind::LowPass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            // Constant 0 dB peak gain
            FilterKind::BandPass => (alpha, 0.0, -alpha),
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    fn run(&self, samples: &[f32]) -> Vec<f32> {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        samples
            .iter()
            .map(|&s| {
                let x0 = s as f64;
                let y0 = self.b0 * x0 + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
                x2 = x1;
                x1 = x0;
                y2 = y1;
                y1 = y0;
                y0 as f32
            })
            .collect()
    }
}

impl BandFilter for BiquadFilter {
    fn filter(&self, buffer: &PcmBuffer, kind: FilterKind, low_hz: f64, high_hz: f64) -> PcmBuffer {
        let coeffs = Coefficients::design(kind, low_hz, high_hz, buffer.sample_rate);
        log::debug!(
            "{:?} filter {:.0}-{:.0} Hz over {} channel(s)",
            kind,
            low_hz,
            high_hz,
            buffer.channels.len()
        );
        PcmBuffer {
            sample_rate: buffer.sample_rate,
            channels: buffer.channels.iter().map(|c| coeffs.run(c)).collect(),
        }
    }
}
