//! End-to-end pipeline tests over a temporary dataset directory.

use std::path::Path;

use tempfile::tempdir;
use walkdir::WalkDir;

use amt_augment::annotation::{annotation_to_midi, NoteEvent};
use amt_augment::audio::{write_wav_mono, STANDARD_SAMPLE_RATE};
use amt_augment::config::Config;
use amt_augment::pipeline;

/// A half-second tone with one annotated note, already in canonical format.
fn write_pair(dir: &Path, stem: &str, pitch: u8) {
    let samples: Vec<f32> = (0..STANDARD_SAMPLE_RATE / 2)
        .map(|i| ((i as f32 * 0.06).sin()) * 0.4)
        .collect();
    write_wav_mono(
        &samples,
        STANDARD_SAMPLE_RATE,
        &dir.join(format!("{}.wav", stem)),
    )
    .unwrap();
    annotation_to_midi(
        &[
            NoteEvent::new(0.05, 0.2, pitch, 80),
            NoteEvent::new(0.25, 0.45, pitch + 4, 90),
        ],
        &dir.join(format!("{}.mid", stem)),
    )
    .unwrap();
}

fn list_files(dir: &Path, extension: &str) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .map(|x| x == extension)
                .unwrap_or(false)
        })
        .filter_map(|e| e.file_name().to_str().map(String::from))
        .collect()
}

/// Small deterministic configuration: grid sampling, no random suffixes,
/// one variation per family.
fn test_config() -> Config {
    let mut config = Config::default();
    config.enable_random_suffix = false;
    config.time_stretch.variations = 1;
    config.time_stretch.randomized = false;
    config.pitch_shift.variations = 1;
    config.pitch_shift.randomized = false;
    config.reverb_filter.variations = 1;
    config.gain_chorus.variations = 1;
    config.add_noise.variations = 1;
    config.add_noise.randomized = false;
    config.merge_audio.merge_num = 2;
    config
}

#[test]
fn full_run_produces_paired_variants() {
    let dir = tempdir().unwrap();
    write_pair(dir.path(), "alpha", 60);
    write_pair(dir.path(), "bravo", 48);
    write_pair(dir.path(), "charlie", 72);

    let config = test_config();
    let summary = pipeline::run(dir.path(), &config).unwrap();

    assert_eq!(summary.pairs_attempted, 3);
    assert_eq!(summary.pairs_processed, 3);
    assert!(summary.variants_written > 0);

    // Every produced wav has a MIDI counterpart, no text annotation survives
    let wavs = list_files(dir.path(), "wav");
    let mids = list_files(dir.path(), "mid");
    let anns = list_files(dir.path(), "ann");
    assert!(anns.is_empty(), "leftover annotation files: {:?}", anns);

    let augmented: Vec<&String> = wavs
        .iter()
        .filter(|name| !matches!(name.as_str(), "alpha.wav" | "bravo.wav" | "charlie.wav"))
        .collect();
    assert!(!augmented.is_empty());
    for wav in &augmented {
        let mid = wav.replace(".wav", ".mid");
        assert!(mids.contains(&mid), "no MIDI pair for {}", wav);
    }

    // Three sources, merge enabled: at least one merged mix exists
    assert!(wavs.iter().any(|name| name.contains("merged")));
}

#[test]
fn rerun_skips_augmented_output() {
    let dir = tempdir().unwrap();
    write_pair(dir.path(), "solo", 64);
    write_pair(dir.path(), "duet", 55);

    let mut config = test_config();
    // Two pairs only, the merge pool cannot cover merge_num = 2
    config.merge_audio.enabled = false;

    let first = pipeline::run(dir.path(), &config).unwrap();
    assert_eq!(first.pairs_attempted, 2);
    assert!(first.variants_written > 0);

    // The second pass must only see the two original pairs
    let pairs = pipeline::find_source_pairs(dir.path()).unwrap();
    assert_eq!(pairs.len(), 2);

    let second = pipeline::run(dir.path(), &config).unwrap();
    assert_eq!(second.pairs_attempted, 2);
}

#[test]
fn output_directory_override_keeps_input_clean() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_pair(input.path(), "clean", 62);

    let mut config = test_config();
    config.processing.output_dir = Some(output.path().to_path_buf());
    config.merge_audio.enabled = false;

    let summary = pipeline::run(input.path(), &config).unwrap();
    assert!(summary.variants_written > 0);

    // Input directory still holds exactly the source pair
    assert_eq!(list_files(input.path(), "wav"), vec!["clean.wav"]);
    assert_eq!(list_files(input.path(), "mid"), vec!["clean.mid"]);

    // Augmented output landed in the override directory
    assert!(!list_files(output.path(), "wav").is_empty());
}

#[test]
fn parallel_run_matches_family_coverage() {
    let dir = tempdir().unwrap();
    write_pair(dir.path(), "left", 60);
    write_pair(dir.path(), "right", 67);

    let mut config = test_config();
    config.merge_audio.enabled = false;
    config.processing.num_workers = 4;

    let summary = pipeline::run(dir.path(), &config).unwrap();
    assert_eq!(summary.pairs_processed, 2);

    let wavs = list_files(dir.path(), "wav");
    for tag in ["timestretch", "pitchshift", "reverb_filters", "gain_chorus", "noise"] {
        assert!(
            wavs.iter().any(|name| name.contains(tag)),
            "missing {} output in {:?}",
            tag,
            wavs
        );
    }
}
