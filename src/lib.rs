//! AMT Augment - Annotation-Synchronized Audio Augmentation
//!
//! Expands a directory of paired audio recordings and MIDI transcriptions
//! into many augmented training variants while keeping every annotation
//! aligned to its transformed audio.
//!
//! # Pipeline
//!
//! 1. Discover audio/MIDI pairs by stem, skipping already-augmented files
//! 2. Standardize audio (mono, 16-bit, 44.1 kHz) and decode MIDI to note events
//! 3. Fan seven effect families out per pair, each sampling unique
//!    non-identity parameters and writing audio plus a matching annotation
//! 4. Re-encode every produced annotation back to MIDI
//! 5. Audit the output directory and write the dataset split manifest

pub mod annotation;
pub mod audio;
pub mod config;
pub mod dataset;
pub mod effects;
pub mod error;
pub mod pipeline;

pub use config::Config;
pub use error::{AugmentError, Result};
