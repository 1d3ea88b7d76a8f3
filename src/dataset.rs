//! Output-directory audit and dataset manifest.
//!
//! After a run the output directory should hold one audio file and one MIDI
//! file per variant. The audit pairs them up by stem and reports orphans; the
//! manifest assigns every matched pair to a train/test/validation split and
//! writes a CSV alongside the data.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use hound::WavReader;
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use walkdir::WalkDir;

use crate::config::DatasetConfig;
use crate::error::{AugmentError, Result};

const MANIFEST_NAME: &str = "dataset_manifest.csv";
const MANIFEST_HEADER: &str = "canonical_name,split,audio_filename,midi_filename,duration";

/// Pairing state of an output directory
#[derive(Debug, Default)]
pub struct AuditReport {
    /// Stems with both a `.wav` and a `.mid` file
    pub matched: Vec<String>,
    /// Audio files without a MIDI counterpart
    pub audio_only: Vec<String>,
    /// MIDI files without an audio counterpart
    pub midi_only: Vec<String>,
}

/// Manifest statistics after a write
#[derive(Debug)]
pub struct ManifestSummary {
    pub path: PathBuf,
    pub total: usize,
    pub train: usize,
    pub test: usize,
    pub validation: usize,
}

/// Pair `.wav` and `.mid` files in `dir` by stem and report orphans.
pub fn audit_output(dir: &Path) -> Result<AuditReport> {
    let mut wav_stems: BTreeSet<String> = BTreeSet::new();
    let mut mid_stems: BTreeSet<String> = BTreeSet::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let (Some(stem), Some(extension)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) else {
            continue;
        };
        match extension.to_ascii_lowercase().as_str() {
            "wav" => {
                wav_stems.insert(stem.to_string());
            }
            "mid" => {
                mid_stems.insert(stem.to_string());
            }
            _ => {}
        }
    }

    let report = AuditReport {
        matched: wav_stems.intersection(&mid_stems).cloned().collect(),
        audio_only: wav_stems.difference(&mid_stems).cloned().collect(),
        midi_only: mid_stems.difference(&wav_stems).cloned().collect(),
    };

    info!(
        "Audit of {}: {} matched pairs, {} unmatched audio, {} unmatched MIDI",
        dir.display(),
        report.matched.len(),
        report.audio_only.len(),
        report.midi_only.len()
    );
    for stem in &report.audio_only {
        warn!("Audio file without MIDI pair: {}.wav", stem);
    }
    for stem in &report.midi_only {
        warn!("MIDI file without audio pair: {}.mid", stem);
    }
    Ok(report)
}

/// Write the split manifest for every matched pair in `dir`.
///
/// Pairs are shuffled, then partitioned so the split sizes match the
/// configured ratios as closely as integer counts allow. The written file is
/// re-read and its observed ratios checked before returning.
pub fn write_manifest<R: Rng>(
    rng: &mut R,
    dir: &Path,
    config: &DatasetConfig,
) -> Result<ManifestSummary> {
    let report = audit_output(dir)?;
    let mut stems = report.matched;
    if stems.is_empty() {
        return Err(AugmentError::EmptyAnnotation {
            path: dir.to_path_buf(),
        });
    }
    stems.shuffle(rng);

    let total = stems.len();
    let n_train = ((total as f64) * config.train_ratio).round() as usize;
    let n_test = (((total as f64) * config.test_ratio).round() as usize).min(total - n_train);
    let n_validation = total - n_train - n_test;

    let path = dir.join(MANIFEST_NAME);
    let mut file = fs::File::create(&path)?;
    writeln!(file, "{}", MANIFEST_HEADER)?;
    for (index, stem) in stems.iter().enumerate() {
        let split = if index < n_train {
            "train"
        } else if index < n_train + n_test {
            "test"
        } else {
            "validation"
        };
        let duration = wav_duration(&dir.join(format!("{}.wav", stem)))?;
        writeln!(
            file,
            "{},{},{}.wav,{}.mid,{:.3}",
            stem, split, stem, stem, duration
        )?;
    }
    drop(file);

    verify_manifest(&path, config)?;

    info!(
        "Wrote manifest {} ({} train / {} test / {} validation)",
        path.display(),
        n_train,
        n_test,
        n_validation
    );
    Ok(ManifestSummary {
        path,
        total,
        train: n_train,
        test: n_test,
        validation: n_validation,
    })
}

/// Re-read a manifest and check the observed split ratios against the
/// configured ones, within a tolerance that shrinks with dataset size.
pub fn verify_manifest(path: &Path, config: &DatasetConfig) -> Result<()> {
    let data = fs::read_to_string(path)?;
    let mut counts = (0usize, 0usize, 0usize);
    let mut total = 0usize;

    for line in data.lines().skip(1) {
        let mut fields = line.split(',');
        let split = fields.nth(1).unwrap_or("");
        match split {
            "train" => counts.0 += 1,
            "test" => counts.1 += 1,
            "validation" => counts.2 += 1,
            other => {
                return Err(AugmentError::InvalidConfig {
                    reason: format!("manifest contains unknown split '{}'", other),
                })
            }
        }
        total += 1;
    }
    if total == 0 {
        return Err(AugmentError::EmptyAnnotation {
            path: path.to_path_buf(),
        });
    }

    // Integer split counts cannot hit the exact ratios on small sets
    let tolerance = (1.0 / total as f64).max(0.02) + 1e-9;
    let observed = [
        (counts.0 as f64 / total as f64, config.train_ratio, "train"),
        (counts.1 as f64 / total as f64, config.test_ratio, "test"),
        (
            counts.2 as f64 / total as f64,
            config.validation_ratio,
            "validation",
        ),
    ];
    for (actual, expected, name) in observed {
        if (actual - expected).abs() > tolerance {
            return Err(AugmentError::InvalidSplitRatios {
                sum: actual - expected,
            });
        }
        info!("Split {}: {:.3} (target {:.3})", name, actual, expected);
    }
    Ok(())
}

fn wav_duration(path: &Path) -> Result<f64> {
    let reader = WavReader::open(path).map_err(|e| AugmentError::InvalidAudio {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let spec = reader.spec();
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}
