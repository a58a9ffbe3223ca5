use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ChartError, Result};

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub tempo: TempoConfig,
    #[serde(default)]
    pub offset: OffsetConfig,
    #[serde(default)]
    pub structure: StructureConfig,
    #[serde(default)]
    pub notes: NoteConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Samples per energy frame
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    /// Onset threshold as a multiple of the mean frame energy
    #[serde(default = "default_onset_threshold")]
    pub onset_threshold: f64,
    /// Detect onsets on kick + snare band energy instead of broadband energy
    #[serde(default)]
    pub enhanced: bool,
    #[serde(default = "default_kick_band")]
    pub kick_band: (f64, f64),
    #[serde(default = "default_snare_band")]
    pub snare_band: (f64, f64),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TempoConfig {
    /// Max frame distance from a cluster representative
    #[serde(default = "default_cluster_tolerance")]
    pub cluster_tolerance: usize,
    #[serde(default = "default_min_bpm")]
    pub min_bpm: f64,
    #[serde(default = "default_max_bpm")]
    pub max_bpm: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OffsetConfig {
    /// Deviations beyond this many seconds are outliers
    #[serde(default = "default_inlier_window")]
    pub inlier_window: f64,
    #[serde(default = "default_min_inliers")]
    pub min_inliers: usize,
    /// Estimates closer to zero than this are replaced by the default offset
    #[serde(default = "default_near_zero")]
    pub near_zero: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructureConfig {
    /// A third is quiet when its mean energy is below this fraction of the global mean
    #[serde(default = "default_quiet_section_ratio")]
    pub quiet_ratio: f64,
    #[serde(default = "default_intro_short")]
    pub intro_short: f64,
    #[serde(default = "default_intro_long")]
    pub intro_long: f64,
    #[serde(default = "default_outro_short")]
    pub outro_short: f64,
    #[serde(default = "default_outro_long")]
    pub outro_long: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_min_spacing")]
    pub min_spacing_beats: f64,
    #[serde(default = "default_long_margin")]
    pub long_margin_beats: f64,
    #[serde(default = "default_min_long_gap")]
    pub min_long_gap_beats: f64,
    #[serde(default = "default_loud_ratio")]
    pub loud_ratio: f64,
    #[serde(default = "default_quiet_ratio")]
    pub quiet_ratio: f64,
    /// Frames whose RMS level is below this many dBFS count as silence
    #[serde(default = "default_silence_floor_db")]
    pub silence_floor_db: f64,
    #[serde(default = "default_long_probability")]
    pub long_probability: f64,
    /// Real onset count below which the synthetic beat grid is merged in
    #[serde(default = "default_min_real_onsets")]
    pub min_real_onsets: usize,
    #[serde(default)]
    pub markers: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: default_frame_size(),
            onset_threshold: default_onset_threshold(),
            enhanced: false,
            kick_band: default_kick_band(),
            snare_band: default_snare_band(),
        }
    }
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            cluster_tolerance: default_cluster_tolerance(),
            min_bpm: default_min_bpm(),
            max_bpm: default_max_bpm(),
        }
    }
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            inlier_window: default_inlier_window(),
            min_inliers: default_min_inliers(),
            near_zero: default_near_zero(),
        }
    }
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            quiet_ratio: default_quiet_section_ratio(),
            intro_short: default_intro_short(),
            intro_long: default_intro_long(),
            outro_short: default_outro_short(),
            outro_long: default_outro_long(),
        }
    }
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            seed: None,
            min_spacing_beats: default_min_spacing(),
            long_margin_beats: default_long_margin(),
            min_long_gap_beats: default_min_long_gap(),
            loud_ratio: default_loud_ratio(),
            quiet_ratio: default_quiet_ratio(),
            silence_floor_db: default_silence_floor_db(),
            long_probability: default_long_probability(),
            min_real_onsets: default_min_real_onsets(),
            markers: false,
        }
    }
}

fn default_frame_size() -> usize { 512 }
fn default_onset_threshold() -> f64 { 1.2 }
fn default_kick_band() -> (f64, f64) { (40.0, 150.0) }
fn default_snare_band() -> (f64, f64) { (150.0, 800.0) }
fn default_cluster_tolerance() -> usize { 2 }
fn default_min_bpm() -> f64 { 80.0 }
fn default_max_bpm() -> f64 { 180.0 }
fn default_inlier_window() -> f64 { 0.12 }
fn default_min_inliers() -> usize { 5 }
fn default_near_zero() -> f64 { 1e-3 }
fn default_quiet_section_ratio() -> f64 { 0.7 }
fn default_intro_short() -> f64 { 0.05 }
fn default_intro_long() -> f64 { 0.12 }
fn default_outro_short() -> f64 { 0.90 }
fn default_outro_long() -> f64 { 0.82 }
fn default_min_spacing() -> f64 { 0.25 }
fn default_long_margin() -> f64 { 0.2 }
fn default_min_long_gap() -> f64 { 0.6 }
fn default_loud_ratio() -> f64 { 0.75 }
fn default_quiet_ratio() -> f64 { 0.15 }
fn default_silence_floor_db() -> f64 { -60.0 }
fn default_long_probability() -> f64 { 0.2 }
fn default_min_real_onsets() -> usize { 8 }

impl Config {
    /// Reject values that would make the pipeline loop, divide by zero or
    /// silently disable a placement rule.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ChartError::InvalidInput(msg.to_string()));

        let a = &self.analysis;
        if a.frame_size == 0 {
            return invalid("analysis.frame_size must be > 0");
        }
        if !(a.onset_threshold.is_finite() && a.onset_threshold > 0.0) {
            return invalid("analysis.onset_threshold must be a finite value > 0");
        }
        for (name, (lo, hi)) in [("analysis.kick_band", a.kick_band), ("analysis.snare_band", a.snare_band)] {
            if !(lo.is_finite() && hi.is_finite() && 0.0 <= lo && lo < hi) {
                return Err(ChartError::InvalidInput(format!("{name} must satisfy 0 <= low < high")));
            }
        }

        let t = &self.tempo;
        if !(t.min_bpm.is_finite() && t.max_bpm.is_finite() && t.min_bpm > 0.0)
            || t.max_bpm < 2.0 * t.min_bpm
        {
            return invalid("tempo.max_bpm must be at least twice tempo.min_bpm");
        }

        let n = &self.notes;
        if !(0.0..=1.0).contains(&n.long_probability) {
            return invalid("notes.long_probability must be within [0, 1]");
        }
        if !n.silence_floor_db.is_finite() {
            return invalid("notes.silence_floor_db must be finite");
        }

        let non_negative = [
            ("notes.min_spacing_beats", n.min_spacing_beats),
            ("notes.long_margin_beats", n.long_margin_beats),
            ("notes.min_long_gap_beats", n.min_long_gap_beats),
            ("notes.loud_ratio", n.loud_ratio),
            ("notes.quiet_ratio", n.quiet_ratio),
            ("offset.inlier_window", self.offset.inlier_window),
            ("offset.near_zero", self.offset.near_zero),
            ("structure.quiet_ratio", self.structure.quiet_ratio),
        ];
        // NaN fails both comparisons, so it is caught here too
        if let Some((name, _)) = non_negative.iter().find(|(_, v)| !(v.is_finite() && *v >= 0.0)) {
            return Err(ChartError::InvalidInput(format!("{name} must be finite and >= 0")));
        }

        let s = &self.structure;
        if !(0.0 <= s.intro_short && s.intro_short <= s.intro_long && s.intro_long < s.outro_long
            && s.outro_long <= s.outro_short && s.outro_short <= 1.0)
        {
            return invalid("structure fractions must satisfy intro_short <= intro_long < outro_long <= outro_short");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ChartError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| ChartError::InvalidInput(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// `./beatchart.toml`, then the per-user config file.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("beatchart.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("beatchart").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("beatchart").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
