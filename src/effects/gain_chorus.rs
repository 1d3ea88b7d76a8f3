//! Gain and chorus effect.
//!
//! Applies a dB gain followed by a single-voice chorus: the signal is mixed
//! with a copy read through a sinusoidally modulated delay line. Purely an
//! amplitude/modulation effect, so the annotation is an unmodified copy.

use std::path::{Path, PathBuf};

use crate::annotation::{write_annotation, NoteEvent};
use crate::audio::{read_wav_mono, write_wav_mono, AudioAsset};
use crate::error::Result;

/// Center delay of the chorus voice in milliseconds
const BASE_DELAY_MS: f32 = 20.0;

/// Maximum modulation swing around the center delay in milliseconds
const MAX_SWING_MS: f32 = 10.0;

/// Chorus voice level relative to the dry signal
const VOICE_LEVEL: f32 = 0.5;

/// Apply gain (dB) and chorus (depth 0..1, LFO rate in Hz) and write the
/// audio plus its unchanged annotation.
pub fn apply_gain_and_chorus(
    asset: &AudioAsset,
    events: &[NoteEvent],
    gain_db: i64,
    depth: f64,
    rate_hz: f64,
    output_audio: &Path,
) -> Result<PathBuf> {
    let (samples, sample_rate) = read_wav_mono(&asset.path)?;

    let gain = db_to_linear(gain_db as f32);
    let gained: Vec<f32> = samples.iter().map(|s| s * gain).collect();
    let mut processed = chorus(&gained, depth as f32, rate_hz as f32, sample_rate);
    for sample in processed.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }

    write_wav_mono(&processed, sample_rate, output_audio)?;

    let ann_path = output_audio.with_extension("ann");
    write_annotation(events, &ann_path)?;
    Ok(ann_path)
}

/// Convert decibels to linear amplitude
#[inline]
fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Mix the input with a copy read through an LFO-modulated delay line.
fn chorus(samples: &[f32], depth: f32, rate_hz: f32, sample_rate: u32) -> Vec<f32> {
    let base_delay = BASE_DELAY_MS / 1000.0 * sample_rate as f32;
    let swing = depth.clamp(0.0, 1.0) * MAX_SWING_MS / 1000.0 * sample_rate as f32;
    let angular = 2.0 * std::f32::consts::PI * rate_hz / sample_rate as f32;

    let mut output = Vec::with_capacity(samples.len());
    for (i, &dry) in samples.iter().enumerate() {
        let delay = base_delay + swing * (angular * i as f32).sin();
        let read_pos = i as f32 - delay;

        let voice = if read_pos >= 0.0 {
            let idx = read_pos.floor() as usize;
            let frac = read_pos - idx as f32;
            let a = samples.get(idx).copied().unwrap_or(0.0);
            let b = samples.get(idx + 1).copied().unwrap_or(a);
            a * (1.0 - frac) + b * frac
        } else {
            0.0
        };

        output.push(dry + voice * VOICE_LEVEL);
    }

    output
}
