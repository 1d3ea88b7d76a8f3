//! Line-oriented annotation text codec.
//!
//! Format: one `onset\toffset\tpitch\tvelocity` line per event, no header,
//! onset/offset with 6 decimal digits. Malformed lines are skipped with a
//! warning rather than failing the file.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::warn;

use crate::annotation::NoteEvent;
use crate::error::{AugmentError, Result};

/// Read an annotation file, skipping malformed lines.
pub fn read_annotation(path: &Path) -> Result<Vec<NoteEvent>> {
    let data = fs::read_to_string(path).map_err(|_| AugmentError::FileNotFound {
        path: path.to_path_buf(),
    })?;

    let mut events = Vec::new();
    for (line_no, line) in data.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(event) => events.push(event),
            None => warn!(
                "Skipping malformed line {} in {}: {:?}",
                line_no + 1,
                path.display(),
                line
            ),
        }
    }

    Ok(events)
}

/// Write an annotation file with the fixed 6-decimal time formatting.
pub fn write_annotation(events: &[NoteEvent], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut out = fs::File::create(path)?;
    for event in events {
        writeln!(
            out,
            "{:.6}\t{:.6}\t{}\t{}",
            event.onset, event.offset, event.pitch, event.velocity
        )?;
    }
    Ok(())
}

fn parse_line(line: &str) -> Option<NoteEvent> {
    let mut fields = line.split('\t');
    let onset: f64 = fields.next()?.trim().parse().ok()?;
    let offset: f64 = fields.next()?.trim().parse().ok()?;
    let pitch: u8 = fields.next()?.trim().parse().ok()?;
    let velocity: u8 = fields.next()?.trim().parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(NoteEvent::new(onset, offset, pitch, velocity))
}
