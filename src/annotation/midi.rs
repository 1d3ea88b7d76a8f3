//! MIDI note-sequence codec.
//!
//! Bridges the binary MIDI form at the pipeline boundaries to the in-memory
//! event list: decode seeds a pair's processing, encode finalizes each
//! produced variant.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::warn;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

use crate::annotation::NoteEvent;
use crate::error::{AugmentError, Result};

/// Pulses per quarter note used when encoding
const ENCODE_PPQ: u16 = 480;

/// Microseconds per quarter note used when encoding (120 BPM)
const ENCODE_TEMPO: u32 = 500_000;

/// Default tempo assumed for files without a SetTempo event
const DEFAULT_TEMPO: u32 = 500_000;

/// Decode a MIDI file into an ordered note-event list.
///
/// Tick times are converted to seconds through the file's tempo map (all
/// SetTempo events, any track). Note-ons with velocity 0 are treated as
/// note-offs. Dangling note-ons at end of track are discarded with a warning.
pub fn midi_to_annotation(path: &Path) -> Result<Vec<NoteEvent>> {
    let bytes = fs::read(path).map_err(|_| AugmentError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let smf = Smf::parse(&bytes).map_err(|e| AugmentError::InvalidMidi {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let ppq = match smf.header.timing {
        Timing::Metrical(t) => t.as_int() as u32,
        // SMPTE timing is rare in transcription datasets; fall back to the
        // conventional resolution rather than rejecting the file.
        _ => 480,
    };

    let tempo_map = build_tempo_map(&smf);

    let mut events = Vec::new();
    for track in &smf.tracks {
        decode_track(track, ppq, &tempo_map, &mut events, path);
    }

    Ok(events)
}

/// Encode a note-event list as a single-track MIDI file (piano, channel 0).
///
/// Events are sorted by onset; at equal ticks note-offs are written before
/// note-ons so re-struck notes do not cancel themselves.
pub fn annotation_to_midi(events: &[NoteEvent], path: &Path) -> Result<()> {
    // (tick, is_note_on, pitch, velocity)
    let mut midi_events: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(events.len() * 2);
    for event in events {
        midi_events.push((seconds_to_ticks(event.onset), true, event.pitch, event.velocity));
        midi_events.push((seconds_to_ticks(event.offset), false, event.pitch, 0));
    }
    midi_events.sort_by_key(|&(tick, is_on, pitch, _)| (tick, is_on, pitch));

    let mut track = Track::new();
    track.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::from(ENCODE_TEMPO))),
    });

    let mut last_tick = 0u32;
    for (tick, is_on, pitch, velocity) in midi_events {
        let delta = tick - last_tick;
        last_tick = tick;

        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::from(pitch.min(127)),
                vel: u7::from(velocity.min(127)),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::from(pitch.min(127)),
                vel: u7::from(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::from(delta),
            kind: TrackEventKind::Midi {
                channel: u4::from(0),
                message,
            },
        });
    }

    track.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header {
            format: Format::SingleTrack,
            timing: Timing::Metrical(u15::from(ENCODE_PPQ)),
        },
        tracks: vec![track],
    };
    smf.save(path).map_err(|e| AugmentError::InvalidMidi {
        path: path.to_path_buf(),
        reason: format!("write failed: {}", e),
    })?;
    Ok(())
}

/// Collect all SetTempo events as (absolute tick, us per quarter), sorted.
fn build_tempo_map(smf: &Smf) -> Vec<(u32, u32)> {
    let mut map = vec![(0u32, DEFAULT_TEMPO)];
    for track in &smf.tracks {
        let mut tick = 0u32;
        for event in track {
            tick = tick.wrapping_add(event.delta.as_int());
            if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
                map.push((tick, tempo.as_int()));
            }
        }
    }
    map.sort_by_key(|&(tick, _)| tick);
    map
}

/// Convert an absolute tick to seconds by accumulating over tempo segments.
fn ticks_to_seconds(tick: u32, ppq: u32, tempo_map: &[(u32, u32)]) -> f64 {
    let mut seconds = 0.0;
    let mut segment_start = 0u32;
    let mut tempo = DEFAULT_TEMPO;

    for &(change_tick, change_tempo) in tempo_map {
        if change_tick >= tick {
            break;
        }
        seconds += (change_tick - segment_start) as f64 * tempo as f64 / (ppq as f64 * 1e6);
        segment_start = change_tick;
        tempo = change_tempo;
    }
    seconds += (tick - segment_start) as f64 * tempo as f64 / (ppq as f64 * 1e6);
    seconds
}

fn seconds_to_ticks(seconds: f64) -> u32 {
    (seconds * ENCODE_PPQ as f64 * 1e6 / ENCODE_TEMPO as f64).round() as u32
}

fn decode_track(
    track: &[TrackEvent],
    ppq: u32,
    tempo_map: &[(u32, u32)],
    events: &mut Vec<NoteEvent>,
    path: &Path,
) {
    // (channel, key) -> stack of (onset tick, velocity)
    let mut active: HashMap<(u8, u8), Vec<(u32, u8)>> = HashMap::new();
    let mut tick = 0u32;

    for event in track {
        tick = tick.wrapping_add(event.delta.as_int());
        let TrackEventKind::Midi { channel, message } = event.kind else {
            continue;
        };
        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                active
                    .entry((channel.as_int(), key.as_int()))
                    .or_default()
                    .push((tick, vel.as_int()));
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let slot = active.get_mut(&(channel.as_int(), key.as_int()));
                match slot.and_then(|stack| stack.pop()) {
                    Some((onset_tick, velocity)) => {
                        events.push(NoteEvent::new(
                            ticks_to_seconds(onset_tick, ppq, tempo_map),
                            ticks_to_seconds(tick, ppq, tempo_map),
                            key.as_int(),
                            velocity,
                        ));
                    }
                    None => warn!(
                        "Unmatched note-off (key {}) in {}",
                        key.as_int(),
                        path.display()
                    ),
                }
            }
            _ => {}
        }
    }

    let dangling: usize = active.values().map(Vec::len).sum();
    if dangling > 0 {
        warn!(
            "Discarding {} unterminated notes in {}",
            dangling,
            path.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    #[test]
    fn test_encode_decode_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.mid");

        let events = vec![
            NoteEvent::new(0.0, 0.5, 60, 80),
            NoteEvent::new(0.25, 1.0, 64, 100),
            NoteEvent::new(1.5, 2.0, 67, 64),
        ];
        annotation_to_midi(&events, &path).unwrap();
        let mut decoded = midi_to_annotation(&path).unwrap();
        decoded.sort_by(|a, b| a.onset.partial_cmp(&b.onset).unwrap());

        assert_eq!(decoded.len(), events.len());
        for (orig, dec) in events.iter().zip(decoded.iter()) {
            // Tick quantization at 480 PPQ / 120 BPM is ~1 ms
            assert_relative_eq!(orig.onset, dec.onset, epsilon = 2e-3);
            assert_relative_eq!(orig.offset, dec.offset, epsilon = 2e-3);
            assert_eq!(orig.pitch, dec.pitch);
            assert_eq!(orig.velocity, dec.velocity);
        }
    }

    #[test]
    fn test_restruck_note_keeps_both_events() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("restruck.mid");

        // Second strike begins exactly when the first ends
        let events = vec![
            NoteEvent::new(0.0, 0.5, 60, 80),
            NoteEvent::new(0.5, 1.0, 60, 90),
        ];
        annotation_to_midi(&events, &path).unwrap();
        let decoded = midi_to_annotation(&path).unwrap();
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = midi_to_annotation(Path::new("/nonexistent/x.mid"));
        assert!(matches!(result, Err(AugmentError::FileNotFound { .. })));
    }

    #[test]
    fn test_tempo_map_conversion() {
        // 480 PPQ, default 120 BPM: 960 ticks = 1 second
        let map = vec![(0u32, 500_000u32)];
        assert_relative_eq!(ticks_to_seconds(960, 480, &map), 1.0);

        // Tempo doubles to 60 BPM at tick 960: next 960 ticks take 2 seconds
        let map = vec![(0u32, 500_000u32), (960, 1_000_000)];
        assert_relative_eq!(ticks_to_seconds(1920, 480, &map), 3.0);
    }
}
