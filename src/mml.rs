//! Encoder for the game's macro-language song format.
//!
//! Notes are quantized to sixteenth-note units at the effective tempo and
//! packed onto monophonic lines; overlapping notes open new lines, and
//! silence inside a line becomes explicit rests.

use crate::converter::Conversion;
use crate::note::{octave, pitch_name};

/// Sixteenth counts with a direct length suffix. A quarter note is the
/// game's default length and needs no suffix. Anything not listed here
/// decomposes greedily into these units, tied together.
const LENGTH_SUFFIXES: [(u32, &str); 9] = [
    (1, "16"),
    (2, "8"),
    (3, "8."),
    (4, ""),
    (6, "4."),
    (8, "2"),
    (12, "2."),
    (16, "1"),
    (24, "1."),
];

/// Volume the game assumes when a note carries no velocity marker.
const DEFAULT_VELOCITY: u8 = 12;

/// Map a 0-127 velocity onto the game's 0-15 volume scale.
fn scale_velocity(velocity: u8) -> u8 {
    ((velocity as f64 * 16.0 / 128.0).round() as u8).min(15)
}

/// Length suffix for `sixteenths` sixteenth-note units. Unknown counts
/// are split into the largest known unit and the remainder, tied onto the
/// same pitch with `&`.
fn length_suffix(pitch: &str, sixteenths: u32) -> String {
    let mut out = String::new();
    let mut remaining = sixteenths;

    while remaining > 0 {
        if let Some((_, suffix)) = LENGTH_SUFFIXES.iter().find(|(units, _)| *units == remaining) {
            out.push_str(suffix);
            break;
        }

        let (units, suffix) = LENGTH_SUFFIXES
            .iter()
            .rev()
            .find(|(units, _)| *units < remaining)
            .copied()
            .unwrap_or(LENGTH_SUFFIXES[0]);
        out.push_str(suffix);
        out.push('&');
        out.push_str(pitch);
        remaining -= units;
    }

    out
}

/// One note, quantized to sixteenth units.
struct MmlNote {
    pitch: &'static str,
    octave: i32,
    /// Already on the 0-15 scale; `None` leaves the game's default volume.
    velocity: Option<u8>,
    start: u32,
    len: u32,
}

impl MmlNote {
    fn encode(&self) -> String {
        let mut out = String::new();
        if let Some(velocity) = self.velocity {
            if velocity != DEFAULT_VELOCITY {
                out.push('V');
                out.push_str(&velocity.to_string());
            }
        }
        out.push('O');
        out.push_str(&self.octave.to_string());
        out.push_str(self.pitch);
        out.push_str(&length_suffix(self.pitch, self.len));
        out
    }
}

/// A monophonic run of notes and rests. `end` is the next free sixteenth.
struct MmlLine {
    body: String,
    end: u32,
}

impl MmlLine {
    /// A line whose first note starts at `start`; the lead-in from time
    /// zero becomes a rest.
    fn new(start: u32) -> Self {
        let mut line = MmlLine {
            body: String::new(),
            end: 0,
        };
        if start > 0 {
            line.push_rest(start);
        }
        line
    }

    fn push_rest(&mut self, len: u32) {
        self.body.push('R');
        self.body.push_str(&length_suffix("R", len));
        self.end += len;
    }

    fn push(&mut self, note: MmlNote) {
        if note.start > self.end {
            self.push_rest(note.start - self.end);
        }
        self.end = note.start + note.len;
        self.body.push_str(&note.encode());
    }
}

/// Encode a conversion as one game song string.
pub fn encode_song(conversion: &Conversion) -> String {
    let sixteenth_len = 60.0 / conversion.tempo_bpm / 4.0;
    let mut lines: Vec<MmlLine> = Vec::new();

    for event in &conversion.events {
        let start = (event.start_time / sixteenth_len).round() as u32;
        let len = (event.duration / sixteenth_len).round() as u32;
        if len == 0 {
            // Shorter than half a sixteenth; the game cannot voice it.
            continue;
        }

        let note = MmlNote {
            pitch: pitch_name(event.pitch),
            octave: octave(event.pitch),
            velocity: event.velocity.map(scale_velocity),
            start,
            len,
        };

        // Most recently opened line that is already free at this onset;
        // otherwise the note opens a new line.
        let line_idx = match lines.iter().rposition(|line| line.end <= note.start) {
            Some(idx) => idx,
            None => {
                lines.push(MmlLine::new(note.start));
                lines.len() - 1
            }
        };
        lines[line_idx].push(note);
    }

    let mut out = String::from("7ML@");
    let bpm = conversion.tempo_bpm.round() as i64;
    if bpm != 120 {
        out.push('T');
        out.push_str(&bpm.to_string());
    }
    let bodies: Vec<&str> = lines.iter().map(|line| line.body.as_str()).collect();
    out.push_str(&bodies.join(","));
    out.push(';');
    out
}
