//! Audio assets and WAV I/O.
//!
//! All processing happens on a standardized form: mono 32-bit float samples
//! at 44.1 kHz, written back out as 16-bit PCM WAV.

pub mod asset;
pub mod io;

pub use asset::{standardize_audio, AudioAsset};
pub use io::{normalize_peak, read_wav_mono, resample_linear, write_wav_mono, STANDARD_SAMPLE_RATE};
