//! Serialize converted notes as delimited text lines or JSON.

use crate::converter::{Conversion, NoteEvent};

/// Field separator in line output.
pub const FIELD_DELIMITER: char = ',';

/// One event as a delimited line: pitch, start, duration, and velocity
/// when present. Times carry exactly three decimal places.
pub fn format_event(event: &NoteEvent) -> String {
    let mut line = format!(
        "{}{}{:.3}{}{:.3}",
        event.pitch, FIELD_DELIMITER, event.start_time, FIELD_DELIMITER, event.duration
    );
    if let Some(velocity) = event.velocity {
        line.push(FIELD_DELIMITER);
        line.push_str(&velocity.to_string());
    }
    line
}

/// One event per line, in the order given, with a trailing newline.
pub fn to_lines(events: &[NoteEvent]) -> String {
    let mut output = String::new();
    for event in events {
        output.push_str(&format_event(event));
        output.push('\n');
    }
    output
}

/// JSON rendering of the whole conversion.
pub fn to_json(conversion: &Conversion) -> serde_json::Result<String> {
    #[derive(serde::Serialize)]
    struct JsonOutput<'a> {
        tempo_bpm: f64,
        events: &'a [NoteEvent],
    }

    serde_json::to_string_pretty(&JsonOutput {
        tempo_bpm: conversion.tempo_bpm,
        events: &conversion.events,
    })
}
