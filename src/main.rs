//! AMT Augment CLI
//!
//! Command-line entry point for the augmentation pipeline.

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use amt_augment::config::Config;
use amt_augment::effects::EffectKind;
use amt_augment::{dataset, pipeline, Result};

#[derive(Parser, Debug)]
#[command(
    name = "amt-augment-cli",
    version,
    about = "Annotation-synchronized audio augmentation for transcription datasets"
)]
struct Cli {
    /// Directory containing the audio/MIDI pairs to augment
    input_directory: PathBuf,

    /// Output directory for augmented files (defaults to the input directory)
    #[arg(short, long)]
    output_directory: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the default configuration to the given path and exit
    #[arg(short, long, value_name = "PATH")]
    generate_config: Option<PathBuf>,

    /// Worker count for the per-pair effect fan-out
    #[arg(short = 'w', long)]
    num_workers: Option<usize>,

    /// Disable an effect family (repeatable): pauses, timestretch,
    /// pitchshift, reverb, chorus, merge, noise
    #[arg(short = 'd', long = "disable-effect", value_name = "EFFECT")]
    disabled_effects: Vec<String>,

    /// Skip writing the dataset split manifest
    #[arg(long)]
    skip_csv: bool,

    /// Override the configured train split ratio
    #[arg(long)]
    train_ratio: Option<f64>,

    /// Override the configured test split ratio
    #[arg(long)]
    test_ratio: Option<f64>,

    /// Override the configured validation split ratio
    #[arg(long)]
    validation_ratio: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("AMT Augment v{}", env!("CARGO_PKG_VERSION"));

    if let Some(path) = &cli.generate_config {
        Config::save_default(path)
            .with_context(|| format!("writing default configuration to {}", path.display()))?;
        info!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = build_config(&cli).context("loading configuration")?;
    if !cli.input_directory.is_dir() {
        error!(
            "Input directory does not exist: {}",
            cli.input_directory.display()
        );
        process::exit(1);
    }

    let summary = pipeline::run(&cli.input_directory, &config)
        .with_context(|| format!("augmenting {}", cli.input_directory.display()))?;
    if summary.pairs_attempted == 0 {
        error!("No audio files with matching MIDI files found");
        process::exit(1);
    }
    for failure in &summary.failures {
        warn!("Failure during run: {}", failure);
    }

    let output_dir = config
        .processing
        .output_dir
        .clone()
        .unwrap_or_else(|| cli.input_directory.clone());
    if cli.skip_csv {
        dataset::audit_output(&output_dir)?;
    } else {
        let mut rng = rand::thread_rng();
        match dataset::write_manifest(&mut rng, &output_dir, &config.dataset) {
            Ok(manifest) => info!(
                "Manifest: {} entries ({} train / {} test / {} validation)",
                manifest.total, manifest.train, manifest.test, manifest.validation
            ),
            Err(err) => error!("Failed to write dataset manifest: {}", err),
        }
    }

    if summary.pairs_processed == 0 {
        error!("No pairs were processed successfully");
        process::exit(1);
    }
    Ok(())
}

/// Load the configuration and fold the CLI overrides into the snapshot.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(output) = &cli.output_directory {
        config.processing.output_dir = Some(output.clone());
    }
    if let Some(workers) = cli.num_workers {
        config.processing.num_workers = workers;
    }
    if let Some(ratio) = cli.train_ratio {
        config.dataset.train_ratio = ratio;
    }
    if let Some(ratio) = cli.test_ratio {
        config.dataset.test_ratio = ratio;
    }
    if let Some(ratio) = cli.validation_ratio {
        config.dataset.validation_ratio = ratio;
    }

    for name in &cli.disabled_effects {
        match EffectKind::from_name(name) {
            Some(EffectKind::Pauses) => config.add_pause.enabled = false,
            Some(EffectKind::TimeStretch) => config.time_stretch.enabled = false,
            Some(EffectKind::PitchShift) => config.pitch_shift.enabled = false,
            Some(EffectKind::ReverbFilter) => config.reverb_filter.enabled = false,
            Some(EffectKind::GainChorus) => config.gain_chorus.enabled = false,
            Some(EffectKind::Merge) => config.merge_audio.enabled = false,
            Some(EffectKind::Noise) => config.add_noise.enabled = false,
            None => warn!("Unknown effect name in --disable-effect: {}", name),
        }
    }

    config.validate()?;
    Ok(config)
}
