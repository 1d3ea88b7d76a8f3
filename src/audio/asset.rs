//! Standardized audio assets.
//!
//! Every effect runs against the standardized form of a recording: mono,
//! 44.1 kHz, 16-bit PCM WAV. Assets are never mutated in place; each effect
//! writes a new file.

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};
use log::info;

use crate::audio::io::{read_wav_mono, resample_linear, write_wav_mono, STANDARD_SAMPLE_RATE};
use crate::error::{AugmentError, Result};

/// A standardized waveform file plus its naming components.
///
/// `base_name` is the stem of the original recording (not of the
/// standardized copy), so output names stay tied to the source pair.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub base_name: String,
    pub extension: String,
}

impl AudioAsset {
    /// Describe an existing file without standardizing it.
    pub fn from_path(path: &Path) -> Result<Self> {
        let base_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AugmentError::InvalidAudio {
                path: path.to_path_buf(),
                reason: "file has no stem".to_string(),
            })?
            .to_string();
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            base_name,
            extension,
        })
    }
}

/// Standardize a recording into the canonical container/encoding.
///
/// WAV files already in canonical form pass through untouched. Other WAV
/// files are downmixed/resampled and written to `work_dir` with a
/// `_standardized` marker. Non-WAV containers are rejected (container
/// conversion is an external concern).
///
/// Returns the asset plus whether a conversion happened.
pub fn standardize_audio(input: &Path, work_dir: &Path) -> Result<(AudioAsset, bool)> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if extension != "wav" {
        return Err(AugmentError::UnsupportedFormat {
            format: format!(".{} (convert to WAV before augmenting)", extension),
        });
    }

    if is_canonical(input)? {
        return Ok((AudioAsset::from_path(input)?, false));
    }

    let (samples, rate) = read_wav_mono(input)?;
    let samples = if rate != STANDARD_SAMPLE_RATE {
        resample_linear(&samples, STANDARD_SAMPLE_RATE as f64 / rate as f64)
    } else {
        samples
    };

    let base = AudioAsset::from_path(input)?;
    let standardized_path = work_dir.join(format!("{}_standardized.wav", base.base_name));
    write_wav_mono(&samples, STANDARD_SAMPLE_RATE, &standardized_path)?;
    info!(
        "Standardized {} -> {}",
        input.display(),
        standardized_path.display()
    );

    Ok((
        AudioAsset {
            path: standardized_path,
            base_name: base.base_name,
            extension: ".wav".to_string(),
        },
        true,
    ))
}

fn is_canonical(path: &Path) -> Result<bool> {
    let reader = WavReader::open(path).map_err(|e| AugmentError::InvalidAudio {
        path: path.to_path_buf(),
        reason: format!("failed to open WAV file: {}", e),
    })?;
    let spec = reader.spec();
    Ok(spec.channels == 1
        && spec.sample_rate == STANDARD_SAMPLE_RATE
        && spec.bits_per_sample == 16
        && spec.sample_format == SampleFormat::Int)
}
