//! Reverb and filter effect.
//!
//! Freeverb-style mono reverb (parallel comb filters into series allpass
//! filters) followed by a one-pole low-pass / high-pass pair. The output is
//! extended by a decay tail; the annotation is copied verbatim since it
//! describes the dry performance, not the wet tail.

use std::path::{Path, PathBuf};

use crate::annotation::{write_annotation, NoteEvent};
use crate::audio::{read_wav_mono, write_wav_mono, AudioAsset};
use crate::error::Result;

/// Comb filter delays at 44100 Hz (standard Freeverb tunings)
const COMB_DELAYS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass filter delays at 44100 Hz
const ALLPASS_DELAYS: [usize; 4] = [556, 441, 341, 225];

/// Fixed gain for allpass filters
const ALLPASS_GAIN: f32 = 0.5;

/// Scale and offset mapping room size to comb feedback
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;

/// Fixed comb damping
const DAMPING: f32 = 0.2;

/// Input attenuation into the comb bank
const FIXED_GAIN: f32 = 0.015;

/// Dry/wet mix
const DRY_LEVEL: f32 = 0.6;
const WET_LEVEL: f32 = 0.9;

/// Apply reverb (room scale in percent) plus a low-pass/high-pass cutoff
/// pair, and write the audio plus its unchanged annotation.
pub fn apply_reverb_and_filters(
    asset: &AudioAsset,
    events: &[NoteEvent],
    room_scale: i64,
    low_pass_cutoff: f64,
    high_pass_cutoff: f64,
    output_audio: &Path,
) -> Result<PathBuf> {
    let (samples, rate) = read_wav_mono(&asset.path)?;

    let room = (room_scale as f32 / 100.0).clamp(0.0, 1.0);
    let mut wet = reverb(&samples, room, rate);
    low_pass(&mut wet, low_pass_cutoff, rate);
    high_pass(&mut wet, high_pass_cutoff, rate);

    // Dry signal padded with silence under the tail
    let mut mixed = vec![0.0f32; wet.len()];
    for (i, out) in mixed.iter_mut().enumerate() {
        let dry = samples.get(i).copied().unwrap_or(0.0);
        *out = (dry * DRY_LEVEL + wet[i] * WET_LEVEL).clamp(-1.0, 1.0);
    }

    write_wav_mono(&mixed, rate, output_audio)?;

    let ann_path = output_audio.with_extension("ann");
    write_annotation(events, &ann_path)?;
    Ok(ann_path)
}

/// Freeverb comb/allpass network; output includes a decay tail proportional
/// to the room size.
fn reverb(samples: &[f32], room: f32, rate: u32) -> Vec<f32> {
    let feedback = ROOM_OFFSET + ROOM_SCALE * room;
    let tail_len = ((0.5 + 2.0 * room) * rate as f32) as usize;
    let total_len = samples.len() + tail_len;

    let mut combs: Vec<(Vec<f32>, usize, f32)> = COMB_DELAYS
        .iter()
        .map(|&d| (vec![0.0f32; d], 0usize, 0.0f32))
        .collect();
    let mut allpasses: Vec<(Vec<f32>, usize)> = ALLPASS_DELAYS
        .iter()
        .map(|&d| (vec![0.0f32; d], 0usize))
        .collect();

    let mut output = Vec::with_capacity(total_len);
    for i in 0..total_len {
        let input = samples.get(i).copied().unwrap_or(0.0) * FIXED_GAIN;

        let mut acc = 0.0f32;
        for (buffer, index, filter_store) in combs.iter_mut() {
            let delayed = buffer[*index];
            acc += delayed;
            *filter_store = delayed * (1.0 - DAMPING) + *filter_store * DAMPING;
            buffer[*index] = input + *filter_store * feedback;
            *index = (*index + 1) % buffer.len();
        }

        for (buffer, index) in allpasses.iter_mut() {
            let delayed = buffer[*index];
            let out = -acc + delayed;
            buffer[*index] = acc + delayed * ALLPASS_GAIN;
            *index = (*index + 1) % buffer.len();
            acc = out;
        }

        output.push(acc);
    }

    output
}

/// One-pole low-pass in place
fn low_pass(samples: &mut [f32], cutoff_hz: f64, rate: u32) {
    let dt = 1.0 / rate as f64;
    let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff_hz);
    let alpha = (dt / (rc + dt)) as f32;

    let mut state = 0.0f32;
    for sample in samples.iter_mut() {
        state += alpha * (*sample - state);
        *sample = state;
    }
}

/// One-pole high-pass in place
fn high_pass(samples: &mut [f32], cutoff_hz: f64, rate: u32) {
    let dt = 1.0 / rate as f64;
    let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff_hz);
    let alpha = (rc / (rc + dt)) as f32;

    let mut prev_input = 0.0f32;
    let mut state = 0.0f32;
    for sample in samples.iter_mut() {
        state = alpha * (state + *sample - prev_input);
        prev_input = *sample;
        *sample = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::read_annotation;
    use crate::audio::STANDARD_SAMPLE_RATE;
    use tempfile::tempdir;

    fn impulse(duration_secs: f32) -> Vec<f32> {
        let n = (duration_secs * STANDARD_SAMPLE_RATE as f32) as usize;
        let mut samples = vec![0.0f32; n];
        samples[0] = 0.9;
        samples
    }

    #[test]
    fn test_reverb_extends_audio_but_not_annotation() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("src.wav");
        let output = dir.path().join("src_reverb_filters_50.wav");

        let samples = impulse(0.5);
        write_wav_mono(&samples, STANDARD_SAMPLE_RATE, &source).unwrap();
        let asset = AudioAsset::from_path(&source).unwrap();

        let events = vec![NoteEvent::new(0.0, 0.4, 60, 80)];
        let ann_path =
            apply_reverb_and_filters(&asset, &events, 50, 8000.0, 100.0, &output).unwrap();

        let (wet, _) = read_wav_mono(&output).unwrap();
        assert!(wet.len() > samples.len());

        let copied = read_annotation(&ann_path).unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0], events[0]);
    }

    #[test]
    fn test_reverb_produces_tail_energy() {
        let samples = impulse(0.2);
        let wet = reverb(&samples, 0.5, STANDARD_SAMPLE_RATE);

        // Energy well after the impulse
        let tail_start = samples.len();
        let tail_energy: f32 = wet[tail_start..].iter().map(|s| s * s).sum();
        assert!(tail_energy > 0.0);
    }

    #[test]
    fn test_low_pass_attenuates_alternating_signal() {
        // Nyquist-rate alternation is the worst case for a low-pass
        let mut samples: Vec<f32> = (0..1000)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        low_pass(&mut samples, 500.0, STANDARD_SAMPLE_RATE);

        let peak = samples[100..].iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert!(peak < 0.05);
    }
}
