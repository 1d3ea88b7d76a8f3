//! Pause insertion effect.
//!
//! Detects silence gaps in the standardized audio that exceed a threshold
//! and inserts synthetic pause segments inside them. Every annotation event
//! after an insertion point is shifted forward by the inserted duration, and
//! the shift accumulates across multiple insertions applied in time order.

use std::path::{Path, PathBuf};

use log::info;
use rand::Rng;

use crate::annotation::{write_annotation, NoteEvent};
use crate::audio::{read_wav_mono, write_wav_mono, AudioAsset};
use crate::error::Result;

/// RMS analysis window in seconds
const WINDOW_SECS: f64 = 0.01;

/// RMS level under which a window counts as silent
const SILENCE_RMS: f32 = 0.005;

/// One pause insertion site: sample index in the source timeline plus the
/// inserted duration in samples.
#[derive(Debug, Clone, Copy)]
struct Insertion {
    at_sample: usize,
    length: usize,
}

/// Insert pauses into qualifying silence gaps and write the audio plus its
/// time-shifted annotation.
///
/// Returns `None` when the audio contains no gap longer than
/// `pause_threshold` seconds (the family then yields no variant).
pub fn apply_pauses<R: Rng>(
    rng: &mut R,
    asset: &AudioAsset,
    events: &[NoteEvent],
    pause_threshold: f64,
    min_pause_duration: f64,
    max_pause_duration: f64,
    output_audio: &Path,
) -> Result<Option<PathBuf>> {
    let (samples, rate) = read_wav_mono(&asset.path)?;

    let gaps = find_silence_gaps(&samples, rate, pause_threshold);
    if gaps.is_empty() {
        info!(
            "No silence gap over {:.1}s in {}; skipping pause insertion",
            pause_threshold,
            asset.path.display()
        );
        return Ok(None);
    }

    // One insertion at the middle of each qualifying gap, in time order
    let insertions: Vec<Insertion> = gaps
        .iter()
        .map(|&(start, end)| {
            let duration = rng.gen_range(min_pause_duration..=max_pause_duration);
            Insertion {
                at_sample: (start + end) / 2,
                length: (duration * rate as f64) as usize,
            }
        })
        .collect();

    let padded = insert_silence(&samples, &insertions);
    write_wav_mono(&padded, rate, output_audio)?;

    let shifted = shift_events(events, &insertions, rate);
    let ann_path = output_audio.with_extension("ann");
    write_annotation(&shifted, &ann_path)?;
    Ok(Some(ann_path))
}

/// Silence runs of at least `threshold_secs`, as (start, end) sample ranges.
fn find_silence_gaps(samples: &[f32], rate: u32, threshold_secs: f64) -> Vec<(usize, usize)> {
    let window = ((rate as f64 * WINDOW_SECS) as usize).max(1);
    let min_windows = (threshold_secs / WINDOW_SECS).ceil() as usize;

    let mut gaps = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, chunk) in samples.chunks(window).enumerate() {
        let rms = (chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32).sqrt();
        if rms < SILENCE_RMS {
            run_start.get_or_insert(i);
        } else if let Some(start) = run_start.take() {
            if i - start >= min_windows {
                gaps.push((start * window, i * window));
            }
        }
    }
    if let Some(start) = run_start {
        let end = samples.len() / window;
        if end - start >= min_windows {
            gaps.push((start * window, end * window));
        }
    }

    gaps
}

/// Copy `samples` with zero blocks spliced in at each insertion point.
/// Insertions must be in ascending source order.
fn insert_silence(samples: &[f32], insertions: &[Insertion]) -> Vec<f32> {
    let total: usize = samples.len() + insertions.iter().map(|i| i.length).sum::<usize>();
    let mut output = Vec::with_capacity(total);

    let mut cursor = 0;
    for insertion in insertions {
        output.extend_from_slice(&samples[cursor..insertion.at_sample]);
        output.extend(std::iter::repeat(0.0f32).take(insertion.length));
        cursor = insertion.at_sample;
    }
    output.extend_from_slice(&samples[cursor..]);

    output
}

/// Shift every event at or after each insertion point by the cumulative
/// inserted duration.
fn shift_events(events: &[NoteEvent], insertions: &[Insertion], rate: u32) -> Vec<NoteEvent> {
    events
        .iter()
        .map(|event| {
            let mut shift = 0.0;
            for insertion in insertions {
                let at_secs = insertion.at_sample as f64 / rate as f64;
                if event.onset >= at_secs {
                    shift += insertion.length as f64 / rate as f64;
                }
            }
            event.shifted(shift)
        })
        .collect()
}
