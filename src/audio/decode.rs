use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{ChartError, Result};

/// Decoded PCM audio, one sample vector per channel.
#[derive(Clone, Debug)]
pub struct PcmBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(ChartError::InvalidInput("sample rate must be > 0".into()));
        }
        if channels.is_empty() {
            return Err(ChartError::InvalidInput("buffer has no channels".into()));
        }
        let len = channels[0].len();
        if channels.iter().any(|c| c.len() != len) {
            return Err(ChartError::InvalidInput(
                "channels have different lengths".into(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, vec![samples])
    }

    /// Channel 0, the only channel the analysis reads.
    pub fn primary(&self) -> &[f32] {
        &self.channels[0]
    }

    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an in-memory byte stream. `extension` is a container hint such as `"mp3"`.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<PcmBuffer> {
    decode_source(Box::new(Cursor::new(bytes)), extension)
}

pub fn decode_source(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<PcmBuffer> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| ChartError::Decode(format!("unrecognized audio format: {e}")))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ChartError::Decode("no audio tracks found".into()))?;

    let track_id = track.id;
    let channel_count = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| ChartError::Decode("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())?;

    let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("Skipping corrupt packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        // De-interleave into per-channel vectors
        let packet_channels = spec.channels.count().max(1);
        for frame in sample_buf.samples().chunks(packet_channels) {
            for (ch, out) in channels.iter_mut().enumerate() {
                out.push(frame.get(ch).copied().unwrap_or(0.0));
            }
        }
    }

    if channels[0].is_empty() {
        return Err(ChartError::Decode("no samples decoded".into()));
    }

    let buffer = PcmBuffer::new(sample_rate, channels)?;

    log::info!(
        "Decoded audio: {} samples x {} channels, {}Hz, {:.1}s",
        buffer.len(),
        buffer.channels.len(),
        sample_rate,
        buffer.duration()
    );

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(PcmBuffer::mono(0, vec![0.0; 10]).is_err());
    }

    #[test]
    fn rejects_ragged_channels() {
        let result = PcmBuffer::new(44100, vec![vec![0.0; 10], vec![0.0; 9]]);
        assert!(matches!(result, Err(ChartError::InvalidInput(_))));
    }

    #[test]
    fn duration_follows_sample_rate() {
        let buffer = PcmBuffer::mono(8000, vec![0.0; 16000]).unwrap();
        assert_eq!(buffer.duration(), 2.0);
        assert_eq!(buffer.primary().len(), 16000);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = decode_bytes(b"definitely not audio".to_vec(), None);
        assert!(matches!(result, Err(ChartError::Decode(_))));
    }

    #[test]
    fn decodes_pcm_wav() {
        let sample_rate = 8000u32;
        let samples: Vec<i16> = (0..800).map(|i| ((i % 40) as i16 - 20) * 500).collect();
        let bytes = wav_bytes(sample_rate, &samples);

        let buffer = decode_bytes(bytes, Some("wav")).unwrap();
        assert_eq!(buffer.sample_rate, sample_rate);
        assert_eq!(buffer.channels.len(), 1);
        assert_eq!(buffer.len(), samples.len());
        assert!(buffer.primary().iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }
}
