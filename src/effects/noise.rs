//! Additive noise effect.
//!
//! Adds uniform white noise scaled by the intensity parameter. Purely
//! additive, so the annotation is an unmodified copy.

use std::path::{Path, PathBuf};

use rand::Rng;

use crate::annotation::{write_annotation, NoteEvent};
use crate::audio::{read_wav_mono, write_wav_mono, AudioAsset};
use crate::error::Result;

/// Noise floor amplitude at intensity 1.0
const BASE_AMPLITUDE: f32 = 0.01;

/// Apply additive white noise at `intensity` and write the audio plus its
/// unchanged annotation.
pub fn apply_noise<R: Rng>(
    rng: &mut R,
    asset: &AudioAsset,
    events: &[NoteEvent],
    intensity: f64,
    output_audio: &Path,
) -> Result<PathBuf> {
    let (samples, rate) = read_wav_mono(&asset.path)?;

    let amplitude = BASE_AMPLITUDE * intensity as f32;
    let noisy: Vec<f32> = samples
        .iter()
        .map(|s| (s + rng.gen_range(-amplitude..=amplitude)).clamp(-1.0, 1.0))
        .collect();

    write_wav_mono(&noisy, rate, output_audio)?;

    let ann_path = output_audio.with_extension("ann");
    write_annotation(events, &ann_path)?;
    Ok(ann_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::read_annotation;
    use crate::audio::STANDARD_SAMPLE_RATE;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn test_noise_added_annotation_untouched() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("src.wav");
        let output = dir.path().join("src_noise_2.0.wav");

        let samples = vec![0.0f32; STANDARD_SAMPLE_RATE as usize / 10];
        write_wav_mono(&samples, STANDARD_SAMPLE_RATE, &source).unwrap();
        let asset = AudioAsset::from_path(&source).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let events = vec![NoteEvent::new(0.0, 0.05, 60, 80)];
        let ann_path = apply_noise(&mut rng, &asset, &events, 2.0, &output).unwrap();

        let (noisy, _) = read_wav_mono(&output).unwrap();
        assert_eq!(noisy.len(), samples.len());

        // Silence in, noise out
        let energy: f32 = noisy.iter().map(|s| s * s).sum();
        assert!(energy > 0.0);
        let peak = noisy.iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert!(peak <= 0.021);

        let copied = read_annotation(&ann_path).unwrap();
        assert_eq!(copied, events);
    }
}
