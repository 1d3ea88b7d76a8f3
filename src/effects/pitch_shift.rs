//! Pitch shift effect.
//!
//! Granular duration-preserving pitch shift: overlapping Hann-windowed
//! grains are individually resampled by the pitch ratio and overlap-added
//! back at their original positions, so the output length matches the input.
//! The annotation keeps its timing and velocity; only the pitch field moves,
//! clamped to the valid 0..=127 range.

use std::path::{Path, PathBuf};

use crate::annotation::{write_annotation, NoteEvent};
use crate::audio::{read_wav_mono, resample_linear, write_wav_mono, AudioAsset};
use crate::error::Result;

/// Grain length in samples (~93 ms at 44.1 kHz)
const GRAIN_SIZE: usize = 4096;

/// Grain hop (50% overlap)
const HOP: usize = GRAIN_SIZE / 2;

/// Apply a pitch shift of `semitones` and write the audio plus annotation.
pub fn apply_pitch_shift(
    asset: &AudioAsset,
    events: &[NoteEvent],
    semitones: i64,
    output_audio: &Path,
) -> Result<PathBuf> {
    let (samples, rate) = read_wav_mono(&asset.path)?;
    let ratio = 2f64.powf(semitones as f64 / 12.0);
    let shifted = granular_shift(&samples, ratio);
    write_wav_mono(&shifted, rate, output_audio)?;

    let transposed: Vec<NoteEvent> = events.iter().map(|e| e.transposed(semitones)).collect();
    let ann_path = output_audio.with_extension("ann");
    write_annotation(&transposed, &ann_path)?;
    Ok(ann_path)
}

/// Resample each grain by `1/ratio` (raising pitch by `ratio`) and
/// overlap-add at the grain's original position.
fn granular_shift(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mut output = vec![0.0f32; samples.len()];
    let mut weight = vec![0.0f32; samples.len()];

    let mut pos = 0;
    while pos < samples.len() {
        // Read enough source material that the resampled grain fills GRAIN_SIZE
        let take = ((GRAIN_SIZE as f64 * ratio).ceil() as usize).min(samples.len() - pos);
        let grain = resample_linear(&samples[pos..pos + take], 1.0 / ratio);

        for (i, &value) in grain.iter().take(GRAIN_SIZE).enumerate() {
            let out_idx = pos + i;
            if out_idx >= output.len() {
                break;
            }
            let w = hann(i, GRAIN_SIZE);
            output[out_idx] += value * w;
            weight[out_idx] += w;
        }

        pos += HOP;
    }

    for (sample, &w) in output.iter_mut().zip(weight.iter()) {
        if w > 1e-6 {
            *sample /= w;
        }
    }

    output
}

fn hann(index: usize, size: usize) -> f32 {
    let phase = std::f32::consts::PI * index as f32 / size as f32;
    phase.sin() * phase.sin()
}
