//! Run configuration.
//!
//! One sub-struct per effect family plus global processing options. The
//! configuration is loaded once per run, cloned into an immutable snapshot,
//! and shared read-only with every family worker.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AugmentError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub add_pause: PauseConfig,
    pub time_stretch: TimeStretchConfig,
    pub pitch_shift: PitchShiftConfig,
    pub reverb_filter: ReverbFilterConfig,
    pub gain_chorus: GainChorusConfig,
    pub add_noise: NoiseConfig,
    pub merge_audio: MergeConfig,
    pub processing: ProcessingConfig,
    pub dataset: DatasetConfig,
    /// Append a random 5-letter suffix to output names. When disabled,
    /// re-runs with identical parameters overwrite prior output.
    pub enable_random_suffix: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            add_pause: PauseConfig::default(),
            time_stretch: TimeStretchConfig::default(),
            pitch_shift: PitchShiftConfig::default(),
            reverb_filter: ReverbFilterConfig::default(),
            gain_chorus: GainChorusConfig::default(),
            add_noise: NoiseConfig::default(),
            merge_audio: MergeConfig::default(),
            processing: ProcessingConfig::default(),
            dataset: DatasetConfig::default(),
            enable_random_suffix: true,
        }
    }
}

/// Pause insertion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseConfig {
    pub enabled: bool,
    /// Minimum silence gap (seconds) that qualifies for pause insertion
    pub pause_threshold: f64,
    /// Bounds for the inserted pause duration (seconds)
    pub min_pause_duration: f64,
    pub max_pause_duration: f64,
}

impl Default for PauseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pause_threshold: 2.0,
            min_pause_duration: 1.0,
            max_pause_duration: 5.0,
        }
    }
}

/// Time stretch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeStretchConfig {
    pub enabled: bool,
    pub variations: usize,
    pub min_factor: f64,
    pub max_factor: f64,
    /// Randomized rejection sampling when true, deterministic grid otherwise
    pub randomized: bool,
}

impl Default for TimeStretchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            variations: 3,
            min_factor: 0.6,
            max_factor: 1.6,
            randomized: true,
        }
    }
}

/// Pitch shift configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchShiftConfig {
    pub enabled: bool,
    pub variations: usize,
    pub min_semitones: i64,
    pub max_semitones: i64,
    pub randomized: bool,
}

impl Default for PitchShiftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            variations: 3,
            min_semitones: -5,
            max_semitones: 5,
            randomized: true,
        }
    }
}

/// Reverb and filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbFilterConfig {
    pub enabled: bool,
    pub variations: usize,
    /// Room scale in percent (0 is the identity / dry value)
    pub min_room_scale: i64,
    pub max_room_scale: i64,
    /// (low-pass cutoff, high-pass cutoff) pairs in Hz, one chosen per variant
    pub cutoff_pairs: Vec<(f64, f64)>,
}

impl Default for ReverbFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            variations: 3,
            min_room_scale: 10,
            max_room_scale: 100,
            cutoff_pairs: vec![(8000.0, 60.0), (10000.0, 100.0), (12000.0, 150.0)],
        }
    }
}

/// Gain and chorus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GainChorusConfig {
    pub enabled: bool,
    pub variations: usize,
    /// Gain bounds in dB (0 is the identity value)
    pub min_gain: i64,
    pub max_gain: i64,
    /// Chorus depth bounds (0.0 is the identity value)
    pub min_depth: f64,
    pub max_depth: f64,
    /// Chorus LFO rates in Hz, one chosen per variant
    pub rates: Vec<f64>,
}

impl Default for GainChorusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            variations: 3,
            min_gain: 1,
            max_gain: 10,
            min_depth: 0.1,
            max_depth: 0.9,
            rates: vec![0.5, 1.0, 1.5, 2.0],
        }
    }
}

/// Additive noise configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub enabled: bool,
    pub variations: usize,
    /// Noise intensity bounds (1.0 is the identity value)
    pub min_intensity: f64,
    pub max_intensity: f64,
    pub randomized: bool,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            variations: 3,
            min_intensity: 0.1,
            max_intensity: 2.0,
            randomized: true,
        }
    }
}

/// Audio merging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub enabled: bool,
    /// Number of other recordings summed into the current one
    pub merge_num: usize,
    /// Sort the concatenated annotation by onset instead of preserving
    /// selection order. Events are never time-shifted either way: the merged
    /// sources genuinely play simultaneously in the summed audio.
    pub sort_events: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            merge_num: 2,
            sort_events: false,
        }
    }
}

/// Global processing options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker count for the family fan-out; 0 or 1 runs sequentially
    pub num_workers: usize,
    /// Output directory override; defaults to the input directory
    pub output_dir: Option<PathBuf>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            num_workers: 1,
            output_dir: None,
        }
    }
}

/// Dataset manifest options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub train_ratio: f64,
    pub test_ratio: f64,
    pub validation_ratio: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.7,
            test_ratio: 0.15,
            validation_ratio: 0.15,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let data = fs::read_to_string(path).map_err(|_| AugmentError::FileNotFound {
                    path: path.to_path_buf(),
                })?;
                serde_json::from_str(&data)?
            }
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Write the default configuration to a JSON file.
    pub fn save_default(path: &Path) -> Result<()> {
        let config = Config::default();
        let data = serde_json::to_string_pretty(&config)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.time_stretch.min_factor > self.time_stretch.max_factor {
            return Err(AugmentError::InvalidConfig {
                reason: "time_stretch: min_factor > max_factor".to_string(),
            });
        }
        if self.pitch_shift.min_semitones > self.pitch_shift.max_semitones {
            return Err(AugmentError::InvalidConfig {
                reason: "pitch_shift: min_semitones > max_semitones".to_string(),
            });
        }
        if self.add_pause.min_pause_duration > self.add_pause.max_pause_duration {
            return Err(AugmentError::InvalidConfig {
                reason: "add_pause: min_pause_duration > max_pause_duration".to_string(),
            });
        }
        if self.add_noise.min_intensity > self.add_noise.max_intensity {
            return Err(AugmentError::InvalidConfig {
                reason: "add_noise: min_intensity > max_intensity".to_string(),
            });
        }
        if self.gain_chorus.min_gain > self.gain_chorus.max_gain {
            return Err(AugmentError::InvalidConfig {
                reason: "gain_chorus: min_gain > max_gain".to_string(),
            });
        }
        if self.gain_chorus.min_depth > self.gain_chorus.max_depth {
            return Err(AugmentError::InvalidConfig {
                reason: "gain_chorus: min_depth > max_depth".to_string(),
            });
        }
        if self.reverb_filter.min_room_scale > self.reverb_filter.max_room_scale {
            return Err(AugmentError::InvalidConfig {
                reason: "reverb_filter: min_room_scale > max_room_scale".to_string(),
            });
        }
        if self.reverb_filter.enabled && self.reverb_filter.cutoff_pairs.is_empty() {
            return Err(AugmentError::InvalidConfig {
                reason: "reverb_filter: cutoff_pairs must not be empty".to_string(),
            });
        }
        if self.gain_chorus.enabled && self.gain_chorus.rates.is_empty() {
            return Err(AugmentError::InvalidConfig {
                reason: "gain_chorus: rates must not be empty".to_string(),
            });
        }
        let ratio_sum =
            self.dataset.train_ratio + self.dataset.test_ratio + self.dataset.validation_ratio;
        if (ratio_sum - 1.0).abs() > 1e-6 {
            return Err(AugmentError::InvalidSplitRatios { sum: ratio_sum });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        Config::save_default(&path).unwrap();
        let loaded = Config::load(Some(&path)).unwrap();

        assert_eq!(loaded.time_stretch.variations, 3);
        assert!(loaded.merge_audio.enabled);
        assert_eq!(loaded.merge_audio.merge_num, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/config.json")));
        assert!(matches!(
            result,
            Err(AugmentError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut config = Config::default();
        config.time_stretch.min_factor = 2.0;
        config.time_stretch.max_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_bounds_rejected_for_every_family() {
        // Each family's sampling range gets the same up-front gate; an
        // inverted range must never reach the samplers.
        let mut config = Config::default();
        config.add_noise.min_intensity = 2.0;
        config.add_noise.max_intensity = 0.1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.gain_chorus.min_gain = 10;
        config.gain_chorus.max_gain = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.gain_chorus.min_depth = 0.9;
        config.gain_chorus.max_depth = 0.1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reverb_filter.min_room_scale = 100;
        config.reverb_filter.max_room_scale = 10;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pitch_shift.min_semitones = 5;
        config.pitch_shift.max_semitones = -5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.add_pause.min_pause_duration = 5.0;
        config.add_pause.max_pause_duration = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_split_ratios_rejected() {
        let mut config = Config::default();
        config.dataset.train_ratio = 0.9;
        assert!(matches!(
            config.validate(),
            Err(AugmentError::InvalidSplitRatios { .. })
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "time_stretch": { "variations": 5 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.time_stretch.variations, 5);
        // Untouched sections fall back to defaults
        assert!(config.add_noise.enabled);
        assert_eq!(config.processing.num_workers, 1);
    }
}
