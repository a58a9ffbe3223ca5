mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use beatchart::analysis;
use beatchart::audio::filter::BiquadFilter;
use beatchart::audio::source::{AudioContext, AudioSource};
use beatchart::chart::{self, Chart};
use beatchart::config::{self, Config};
use cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Explicit --config path, or auto-detect beatchart.toml / global config
    let mut config = match cli.config.clone().or_else(config::discover_config) {
        Some(path) => {
            let cfg = config::load_config(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let source = AudioSource::parse(&cli.input);
    let title = cli.title.clone().unwrap_or_else(|| source.title());
    log::info!("beatchart - rhythm chart generator");
    log::info!("Input: {}", cli.input);

    let spinner = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} [{elapsed}] {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    // 1. Acquire and decode
    spinner.set_message("Loading audio");
    let ctx = AudioContext::new();
    let buffer = ctx
        .load(&source)
        .with_context(|| format!("Failed to load audio from {}", cli.input))?;

    // 2. Energy, onsets, tempo, structure, offset
    spinner.set_message("Analyzing");
    let analysis = analysis::analyze(&buffer, &BiquadFilter, &config)?;

    // 3. Notes
    spinner.set_message("Placing notes");
    let mut rng = match config.notes.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let chart = chart::build(&title, &analysis, &config.notes, &mut rng);
    spinner.finish_and_clear();

    write_chart(&chart, cli.output.as_deref(), cli.compact)?;
    if let Some(path) = &cli.output {
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}

fn write_chart(chart: &Chart, output: Option<&Path>, compact: bool) -> Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    if compact {
        serde_json::to_writer(&mut writer, chart)?;
    } else {
        serde_json::to_writer_pretty(&mut writer, chart)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
