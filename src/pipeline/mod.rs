//! Run orchestration.
//!
//! One invocation is a stateless batch over one input directory: discover
//! audio/MIDI pairs, standardize and decode each pair, fan the effect
//! families out, re-encode every produced annotation to MIDI and clean up
//! the pipeline-local intermediates.

pub mod executor;
pub mod naming;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::annotation::{annotation_to_midi, midi_to_annotation, read_annotation, NoteEvent};
use crate::audio::{standardize_audio, AudioAsset};
use crate::config::Config;
use crate::effects::{EffectKind, FamilyContext, MergeCandidate};
use crate::error::Result;

/// Audio container extensions eligible as pipeline input
pub const AUDIO_EXTENSIONS: [&str; 5] = ["wav", "flac", "mp3", "m4a", "aiff"];

/// One discovered source pair
#[derive(Debug, Clone)]
pub struct SourcePair {
    pub audio: PathBuf,
    pub midi: PathBuf,
}

/// A pair after standardization and annotation decoding
struct PreparedPair {
    asset: AudioAsset,
    events: Arc<Vec<NoteEvent>>,
    temp_ann: PathBuf,
    standardized_copy: Option<PathBuf>,
}

/// What one run accomplished
#[derive(Debug, Default)]
pub struct RunSummary {
    pub pairs_attempted: usize,
    pub pairs_processed: usize,
    pub variants_written: usize,
    /// Pair- and family-level failure descriptions, in occurrence order
    pub failures: Vec<String>,
}

/// Discover unprocessed audio files in `input_dir` that have a matching
/// `.mid` pair by stem.
///
/// Files whose names already carry an effect tag are filtered out, so
/// re-running over a partially processed directory does not re-augment
/// already-augmented output.
pub fn find_source_pairs(input_dir: &Path) -> Result<Vec<SourcePair>> {
    let mut pairs = Vec::new();

    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !AUDIO_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if naming::is_augmented_name(file_name) {
            debug!("Skipping already-augmented file: {}", file_name);
            continue;
        }

        let midi = path.with_extension("mid");
        if midi.exists() {
            pairs.push(SourcePair {
                audio: path.to_path_buf(),
                midi,
            });
        } else {
            warn!("No matching MIDI file for: {}", path.display());
        }
    }

    pairs.sort_by(|a, b| a.audio.cmp(&b.audio));
    Ok(pairs)
}

/// Process every pair in `input_dir` per the configuration snapshot.
pub fn run(input_dir: &Path, config: &Config) -> Result<RunSummary> {
    let output_dir = config
        .processing
        .output_dir
        .clone()
        .unwrap_or_else(|| input_dir.to_path_buf());
    fs::create_dir_all(&output_dir)?;

    let pairs = find_source_pairs(input_dir)?;
    let mut summary = RunSummary {
        pairs_attempted: pairs.len(),
        ..RunSummary::default()
    };
    if pairs.is_empty() {
        warn!("No unprocessed audio/MIDI pairs found in {}", input_dir.display());
        return Ok(summary);
    }
    info!("Found {} audio files with matching MIDI files", pairs.len());

    let config = Arc::new(config.clone());

    // Phase 1: standardize and decode every pair up front, so the merge
    // family can draw on every other pair's annotation.
    let mut prepared: Vec<PreparedPair> = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        match prepare_pair(pair, &output_dir) {
            Ok(p) => prepared.push(p),
            Err(err) => {
                error!("Failed to prepare {}: {}", pair.audio.display(), err);
                summary
                    .failures
                    .push(format!("{}: {}", pair.audio.display(), err));
            }
        }
    }

    // Phase 2: dispatch the effect families per pair and re-encode every
    // produced annotation back to MIDI.
    for (index, pair) in prepared.iter().enumerate() {
        info!("Processing {}", pair.asset.base_name);

        let merge_candidates: Vec<MergeCandidate> = prepared
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .map(|(_, other)| MergeCandidate {
                audio_path: other.asset.path.clone(),
                events: other.events.as_ref().clone(),
            })
            .collect();

        let ctx = FamilyContext {
            asset: pair.asset.clone(),
            events: Arc::clone(&pair.events),
            config: Arc::clone(&config),
            output_dir: output_dir.clone(),
            merge_candidates: Arc::new(merge_candidates),
        };

        let outcomes = executor::run_all_families(&ctx, config.processing.num_workers);

        let mut pair_failed = false;
        let mut ann_files: Vec<PathBuf> = Vec::new();
        for (kind, outcome) in outcomes {
            ann_files.extend(outcome.annotation_files);
            for failure in outcome.variant_failures {
                summary
                    .failures
                    .push(format!("{}/{}: {}", pair.asset.base_name, kind.name(), failure));
            }
            if let Some(reason) = outcome.family_error {
                summary
                    .failures
                    .push(format!("{}/{}: {}", pair.asset.base_name, kind.name(), reason));
                if kind != EffectKind::Merge {
                    pair_failed = true;
                }
            }
        }

        info!("Converting {} annotation files to MIDI", ann_files.len());
        for ann_file in &ann_files {
            match finalize_annotation(ann_file) {
                Ok(()) => summary.variants_written += 1,
                Err(err) => {
                    error!("Error converting {} to MIDI: {}", ann_file.display(), err);
                    summary
                        .failures
                        .push(format!("{}: {}", ann_file.display(), err));
                }
            }
        }

        if !pair_failed {
            summary.pairs_processed += 1;
        }
    }

    // Phase 3: pipeline-local intermediates never survive the invocation
    for pair in &prepared {
        delete_file(&pair.temp_ann);
        if let Some(copy) = &pair.standardized_copy {
            delete_file(copy);
        }
    }

    info!(
        "Successfully processed {} out of {} audio/MIDI pairs ({} variants)",
        summary.pairs_processed, summary.pairs_attempted, summary.variants_written
    );
    Ok(summary)
}

/// Standardize the audio, decode the MIDI annotation and park it as the
/// pair's temporary `.ann` file.
fn prepare_pair(pair: &SourcePair, output_dir: &Path) -> Result<PreparedPair> {
    info!("Standardizing audio: {}", pair.audio.display());
    let (asset, was_converted) = standardize_audio(&pair.audio, output_dir)?;
    if was_converted {
        info!("Converted audio format to: {}", asset.path.display());
    }

    info!("Converting MIDI to annotation: {}", pair.midi.display());
    let events = midi_to_annotation(&pair.midi)?;

    let temp_ann = output_dir.join(format!("{}_temp.ann", asset.base_name));
    crate::annotation::write_annotation(&events, &temp_ann)?;

    Ok(PreparedPair {
        standardized_copy: was_converted.then(|| asset.path.clone()),
        asset,
        events: Arc::new(events),
        temp_ann,
    })
}

/// Re-encode one produced `.ann` to `.mid` and delete the text intermediate.
fn finalize_annotation(ann_file: &Path) -> Result<()> {
    let events = read_annotation(ann_file)?;
    annotation_to_midi(&events, &ann_file.with_extension("mid"))?;
    delete_file(ann_file);
    Ok(())
}

fn delete_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Deleted file: {}", path.display()),
        Err(err) => warn!("Error deleting file {}: {}", path.display(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{write_wav_mono, STANDARD_SAMPLE_RATE};
    use tempfile::tempdir;

    fn write_pair(dir: &Path, stem: &str) {
        let samples: Vec<f32> = (0..STANDARD_SAMPLE_RATE / 4)
            .map(|i| ((i as f32 * 0.05).sin()) * 0.4)
            .collect();
        write_wav_mono(&samples, STANDARD_SAMPLE_RATE, &dir.join(format!("{}.wav", stem))).unwrap();
        annotation_to_midi(
            &[NoteEvent::new(0.05, 0.2, 60, 80)],
            &dir.join(format!("{}.mid", stem)),
        )
        .unwrap();
    }

    #[test]
    fn test_find_source_pairs_filters_augmented_and_unmatched() {
        let dir = tempdir().unwrap();
        write_pair(dir.path(), "one");
        write_pair(dir.path(), "two_timestretch_1.5_abcde");
        // Audio without a MIDI pair
        write_wav_mono(
            &vec![0.1f32; 100],
            STANDARD_SAMPLE_RATE,
            &dir.path().join("orphan.wav"),
        )
        .unwrap();

        let pairs = find_source_pairs(dir.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].audio.ends_with("one.wav"));
    }

    #[test]
    fn test_run_empty_directory() {
        let dir = tempdir().unwrap();
        let summary = run(dir.path(), &Config::default()).unwrap();
        assert_eq!(summary.pairs_attempted, 0);
        assert_eq!(summary.variants_written, 0);
    }

    #[test]
    fn test_prepare_pair_writes_temp_annotation() {
        let dir = tempdir().unwrap();
        write_pair(dir.path(), "song");

        let pair = SourcePair {
            audio: dir.path().join("song.wav"),
            midi: dir.path().join("song.mid"),
        };
        let prepared = prepare_pair(&pair, dir.path()).unwrap();

        assert_eq!(prepared.asset.base_name, "song");
        assert!(prepared.temp_ann.exists());
        assert_eq!(prepared.events.len(), 1);
        // Canonical input needs no converted copy
        assert!(prepared.standardized_copy.is_none());
    }
}
