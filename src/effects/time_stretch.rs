//! Time stretch effect.
//!
//! Factor `f` multiplies duration: the output waveform has `len * f` samples
//! and every annotation onset/offset is multiplied by `f`. Pitch and velocity
//! are unchanged in the annotation (the waveform itself is resampled, which
//! is the quality trade-off this pipeline accepts).

use std::path::{Path, PathBuf};

use crate::annotation::{write_annotation, NoteEvent};
use crate::audio::{read_wav_mono, resample_linear, write_wav_mono, AudioAsset};
use crate::error::Result;

/// Apply a time stretch and write the audio plus its annotation.
///
/// Returns the written annotation path.
pub fn apply_time_stretch(
    asset: &AudioAsset,
    events: &[NoteEvent],
    factor: f64,
    output_audio: &Path,
) -> Result<PathBuf> {
    let (samples, rate) = read_wav_mono(&asset.path)?;
    let stretched = resample_linear(&samples, factor);
    write_wav_mono(&stretched, rate, output_audio)?;

    let scaled: Vec<NoteEvent> = events.iter().map(|e| e.scaled(factor)).collect();
    let ann_path = output_audio.with_extension("ann");
    write_annotation(&scaled, &ann_path)?;
    Ok(ann_path)
}
