use clap::Parser;
use std::path::PathBuf;

use beatchart::config::Config;

#[derive(Parser, Debug)]
#[command(name = "beatchart", about = "Generate rhythm-game charts from music tracks")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC) or http(s) URL
    pub input: String,

    /// Output chart file (JSON). Writes to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Chart title. Defaults to the input's file name
    #[arg(long)]
    pub title: Option<String>,

    /// Seed for note placement; the same seed reproduces the same chart
    #[arg(long)]
    pub seed: Option<u64>,

    /// Samples per energy frame
    #[arg(long)]
    pub frame_size: Option<usize>,

    /// Onset threshold as a multiple of mean frame energy (1.05-1.3)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Detect onsets on kick + snare band energy
    #[arg(long)]
    pub enhanced: bool,

    /// Emit non-playable markers bounding the playable region
    #[arg(long)]
    pub markers: bool,

    /// Config file (TOML). Defaults to ./beatchart.toml or the user config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write single-line JSON
    #[arg(long)]
    pub compact: bool,

    /// Hide the progress spinner
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Flags given on the command line take precedence over the config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(seed) = self.seed {
            config.notes.seed = Some(seed);
        }
        if let Some(frame_size) = self.frame_size {
            config.analysis.frame_size = frame_size;
        }
        if let Some(threshold) = self.threshold {
            config.analysis.onset_threshold = threshold;
        }
        if self.enhanced {
            config.analysis.enhanced = true;
        }
        if self.markers {
            config.notes.markers = true;
        }
    }
}
