//! Note-event annotations and their codecs.
//!
//! An annotation is the ordered list of (onset, offset, pitch, velocity)
//! events describing a performance aligned to an audio recording. Two
//! representations exist: the line-oriented `.ann` text form used while
//! effects run, and the binary MIDI form used at the pipeline boundaries.

pub mod codec;
pub mod event;
pub mod midi;

pub use codec::{read_annotation, write_annotation};
pub use event::NoteEvent;
pub use midi::{annotation_to_midi, midi_to_annotation};
