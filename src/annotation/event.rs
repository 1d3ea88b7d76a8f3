//! Note event value type.

use serde::{Deserialize, Serialize};

/// One note event: onset/offset in seconds, MIDI pitch and velocity.
///
/// Immutable once created; effects build new events rather than mutating.
/// Ordering within an annotation is insertion order from the source, not
/// guaranteed sorted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub onset: f64,
    pub offset: f64,
    pub pitch: u8,
    pub velocity: u8,
}

impl NoteEvent {
    pub fn new(onset: f64, offset: f64, pitch: u8, velocity: u8) -> Self {
        Self {
            onset,
            offset,
            pitch,
            velocity,
        }
    }

    /// A copy with both times multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            onset: self.onset * factor,
            offset: self.offset * factor,
            ..*self
        }
    }

    /// A copy with both times moved forward by `shift` seconds
    pub fn shifted(&self, shift: f64) -> Self {
        Self {
            onset: self.onset + shift,
            offset: self.offset + shift,
            ..*self
        }
    }

    /// A copy with the pitch transposed by `semitones`, clamped to 0..=127.
    ///
    /// Clamping (rather than dropping) keeps the event count invariant under
    /// pitch shift.
    pub fn transposed(&self, semitones: i64) -> Self {
        let pitch = (self.pitch as i64 + semitones).clamp(0, 127) as u8;
        Self { pitch, ..*self }
    }
}
