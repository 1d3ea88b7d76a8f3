//! Merge effect.
//!
//! Selects other recordings from the input pool, resamples everything to the
//! standard rate, zero-pads to the longest signal and sums sample-wise. The
//! combined annotation is the concatenation of each selected recording's
//! events plus the current recording's, in selection order. Events are never
//! time-shifted: the sources genuinely play simultaneously in the summed
//! audio. Sorting by onset is available as a config switch.

use std::path::{Path, PathBuf};

use log::info;
use rand::Rng;

use crate::annotation::{write_annotation, NoteEvent};
use crate::audio::{
    normalize_peak, read_wav_mono, resample_linear, write_wav_mono, AudioAsset,
    STANDARD_SAMPLE_RATE,
};
use crate::error::{AugmentError, Result};

/// Peak level of the summed mix before the 16-bit write
const MIX_PEAK: f32 = 0.9;

/// One recording eligible for merging: its audio file and the decoded
/// annotation events of its pair.
#[derive(Debug, Clone)]
pub struct MergeCandidate {
    pub audio_path: PathBuf,
    pub events: Vec<NoteEvent>,
}

impl MergeCandidate {
    pub fn stem(&self) -> &str {
        self.audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
    }
}

/// Merge `merge_num` randomly selected candidates with the current recording.
///
/// Fails with [`AugmentError::MergePoolTooSmall`] when the pool cannot cover
/// `merge_num`; the caller skips the family in that case. Returns the written
/// annotation path.
#[allow(clippy::too_many_arguments)]
pub fn apply_merge<R: Rng>(
    rng: &mut R,
    asset: &AudioAsset,
    events: &[NoteEvent],
    candidates: &[MergeCandidate],
    merge_num: usize,
    sort_events: bool,
    output_dir: &Path,
) -> Result<PathBuf> {
    if candidates.len() < merge_num {
        return Err(AugmentError::MergePoolTooSmall {
            needed: merge_num,
            available: candidates.len(),
        });
    }

    // Uniform selection without replacement
    let mut pool: Vec<&MergeCandidate> = candidates.iter().collect();
    let mut selected: Vec<&MergeCandidate> = Vec::with_capacity(merge_num);
    while selected.len() < merge_num {
        selected.push(pool.swap_remove(rng.gen_range(0..pool.len())));
    }

    // Resample every signal (selected plus current) to the target rate
    let mut signals: Vec<Vec<f32>> = Vec::with_capacity(merge_num + 1);
    for candidate in &selected {
        signals.push(load_resampled(&candidate.audio_path)?);
    }
    signals.push(load_resampled(&asset.path)?);

    // Zero-pad to the longest signal and sum sample-wise
    let max_len = signals.iter().map(Vec::len).max().unwrap_or(0);
    let mut mixed = vec![0.0f32; max_len];
    for signal in &signals {
        for (out, &sample) in mixed.iter_mut().zip(signal.iter()) {
            *out += sample;
        }
    }
    normalize_peak(&mut mixed, MIX_PEAK);

    let mut stems: Vec<&str> = selected.iter().map(|c| c.stem()).collect();
    stems.push(&asset.base_name);
    let output_stem = format!("{}_merged", stems.join("_"));

    let audio_path = output_dir.join(format!("{}.wav", output_stem));
    write_wav_mono(&mixed, STANDARD_SAMPLE_RATE, &audio_path)?;

    // Concatenate annotations in selection order, current recording last
    let mut combined: Vec<NoteEvent> = Vec::new();
    for candidate in &selected {
        combined.extend_from_slice(&candidate.events);
    }
    combined.extend_from_slice(events);
    if sort_events {
        combined.sort_by(|a, b| a.onset.total_cmp(&b.onset));
    }

    let ann_path = output_dir.join(format!("{}.ann", output_stem));
    write_annotation(&combined, &ann_path)?;

    info!(
        "Merged {} recordings into {}",
        merge_num + 1,
        audio_path.display()
    );
    Ok(ann_path)
}

fn load_resampled(path: &Path) -> Result<Vec<f32>> {
    let (samples, rate) = read_wav_mono(path)?;
    if rate == STANDARD_SAMPLE_RATE {
        Ok(samples)
    } else {
        Ok(resample_linear(
            &samples,
            STANDARD_SAMPLE_RATE as f64 / rate as f64,
        ))
    }
}
