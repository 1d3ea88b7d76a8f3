//! Error handling for the augmentation pipeline.
//!
//! Errors are split along the recovery taxonomy the pipeline uses: pair-fatal
//! input errors, locally-recovered annotation errors, and per-variant or
//! per-family failures that never abort the run.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for augmentation operations
pub type Result<T> = std::result::Result<T, AugmentError>;

/// Main error type for augmentation operations
#[derive(Error, Debug)]
pub enum AugmentError {
    // File errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid audio file {path}: {reason}")]
    InvalidAudio { path: PathBuf, reason: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples: {path}")]
    EmptyAudio { path: PathBuf },

    // Annotation errors
    #[error("Invalid MIDI file {path}: {reason}")]
    InvalidMidi { path: PathBuf, reason: String },

    #[error("Annotation file {path} contains no parseable events")]
    EmptyAnnotation { path: PathBuf },

    // Effect errors
    #[error("Effect {family} failed: {reason}")]
    EffectFailed { family: String, reason: String },

    #[error("Merge needs {needed} candidate files but only {available} available")]
    MergePoolTooSmall { needed: usize, available: usize },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Dataset split ratios must sum to 1.0, got {sum}")]
    InvalidSplitRatios { sum: f64 },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AugmentError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AugmentError::FileNotFound { .. } => "FILE_NOT_FOUND",
            AugmentError::InvalidAudio { .. } => "INVALID_AUDIO",
            AugmentError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AugmentError::EmptyAudio { .. } => "EMPTY_AUDIO",
            AugmentError::InvalidMidi { .. } => "INVALID_MIDI",
            AugmentError::EmptyAnnotation { .. } => "EMPTY_ANNOTATION",
            AugmentError::EffectFailed { .. } => "EFFECT_FAILED",
            AugmentError::MergePoolTooSmall { .. } => "MERGE_POOL_TOO_SMALL",
            AugmentError::InvalidConfig { .. } => "INVALID_CONFIG",
            AugmentError::InvalidSplitRatios { .. } => "INVALID_SPLIT_RATIOS",
            AugmentError::Io(_) => "IO_ERROR",
            AugmentError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the run can continue past this error.
    ///
    /// Pair-level and family-level failures are recoverable: the pipeline
    /// logs them and keeps going. Configuration errors are not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AugmentError::InvalidConfig { .. } | AugmentError::InvalidSplitRatios { .. }
        )
    }
}
