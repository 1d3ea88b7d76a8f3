//! WAV reading, writing and resampling.
//!
//! Reads any bit depth hound supports, converts to mono f32, and writes
//! 16-bit PCM. Sample rate conversion uses linear interpolation; the
//! pipeline makes no fidelity guarantees, so a windowed-sinc resampler is
//! deliberately out of scope.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{AugmentError, Result};

/// Canonical sample rate for standardized audio
pub const STANDARD_SAMPLE_RATE: u32 = 44_100;

/// Read a WAV file as mono f32 samples, returning `(samples, sample_rate)`.
///
/// Multi-channel input is downmixed by channel mean.
pub fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    if !path.exists() {
        return Err(AugmentError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| AugmentError::InvalidAudio {
        path: path.to_path_buf(),
        reason: format!("failed to open WAV file: {}", e),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    let sample_rate = spec.sample_rate;

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format, path)?;
    if interleaved.is_empty() {
        return Err(AugmentError::EmptyAudio {
            path: path.to_path_buf(),
        });
    }

    let mono = downmix(&interleaved, channels);
    Ok((mono, sample_rate))
}

/// Write mono f32 samples as a 16-bit PCM WAV file.
pub fn write_wav_mono(samples: &[f32], sample_rate: u32, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| {
        AugmentError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))
    })?;

    for &sample in samples {
        let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(scaled).map_err(|e| {
            AugmentError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                e.to_string(),
            ))
        })?;
    }

    writer.finalize().map_err(|e| {
        AugmentError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))
    })?;

    Ok(())
}

/// Linear interpolation resampling by `ratio` (output length = input × ratio).
pub fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() || ratio <= 0.0 {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

/// Scale samples so the peak magnitude is `target` (no-op for silent input).
pub fn normalize_peak(samples: &mut [f32], target: f32) {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        let scale = target / peak;
        for sample in samples.iter_mut() {
            *sample *= scale;
        }
    }
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
    path: &Path,
) -> Result<Vec<f32>> {
    let invalid = |reason: String| AugmentError::InvalidAudio {
        path: path.to_path_buf(),
        reason,
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| invalid(format!("failed to read float samples: {}", e))),
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid(format!("failed to read 8-bit samples: {}", e))),
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid(format!("failed to read 16-bit samples: {}", e))),
            24 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8_388_608.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid(format!("failed to read 24-bit samples: {}", e))),
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2_147_483_648.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid(format!("failed to read 32-bit int samples: {}", e))),
            other => Err(AugmentError::UnsupportedFormat {
                format: format!("{}-bit integer audio", other),
            }),
        },
    }
}

/// Downmix interleaved samples to mono by channel mean
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    pub(crate) fn sine(frequency: f32, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let angular = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
        (0..num_samples)
            .map(|i| (angular * i as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_round_trip_mono() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mono.wav");

        let original = sine(440.0, 0.5, STANDARD_SAMPLE_RATE);
        write_wav_mono(&original, STANDARD_SAMPLE_RATE, &path).unwrap();
        let (imported, rate) = read_wav_mono(&path).unwrap();

        assert_eq!(rate, STANDARD_SAMPLE_RATE);
        assert_eq!(imported.len(), original.len());
        for (orig, imp) in original.iter().zip(imported.iter()) {
            // 16-bit quantization error
            assert!((orig - imp).abs() < 0.001, "{} vs {}", orig, imp);
        }
    }

    #[test]
    fn test_downmix_stereo() {
        let interleaved = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mono = downmix(&interleaved, 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_resample_linear_upsample() {
        let samples = vec![0.0, 1.0, 0.0];
        let resampled = resample_linear(&samples, 2.0);

        assert!(resampled.len() >= 5);
        // At index 1 (source position 0.5), interpolation gives 0.5
        assert!((resampled[1] - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_resample_linear_downsample() {
        let samples = vec![0.0, 0.5, 1.0, 0.5, 0.0, -0.5, -1.0, -0.5];
        let resampled = resample_linear(&samples, 0.5);
        assert_eq!(resampled.len(), 4);
    }

    #[test]
    fn test_normalize_peak() {
        let mut samples = vec![0.1, -0.4, 0.2];
        normalize_peak(&mut samples, 0.8);
        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_read_nonexistent_file() {
        let result = read_wav_mono(Path::new("/nonexistent/audio.wav"));
        assert!(matches!(result, Err(AugmentError::FileNotFound { .. })));
    }
}
