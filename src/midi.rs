use std::fs;
use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::error::{ConvertError, Result};
use crate::event::{EventSource, RawEvent, RawKind};

/// Note event stream pulled out of a standard MIDI file with `midly`.
#[derive(Debug)]
pub struct MidiSource {
    ticks_per_beat: u32,
    embedded_tempo: Option<f64>,
    events: Vec<RawEvent>,
}

impl MidiSource {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| ConvertError::io(path, e))?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data).map_err(|e| ConvertError::Parse(e.to_string()))?;

        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int() as u32,
            Timing::Timecode(fps, subframe) => {
                // Convert timecode to ticks per beat approximation
                (fps.as_f32() * subframe as f32 * 4.0) as u32
            }
        };

        let embedded_tempo =
            extract_tempo(&smf).map(|us_per_beat| 60_000_000.0 / us_per_beat as f64);
        let events = merge_tracks(&smf);

        Ok(MidiSource {
            ticks_per_beat,
            embedded_tempo,
            events,
        })
    }
}

impl EventSource for MidiSource {
    fn ticks_per_beat(&self) -> u32 {
        self.ticks_per_beat
    }

    fn embedded_tempo(&self) -> Option<f64> {
        self.embedded_tempo
    }

    fn events(&self) -> &[RawEvent] {
        &self.events
    }
}

/// First tempo meta-event in the file, in microseconds per beat. Later
/// tempo changes are ignored.
fn extract_tempo(smf: &Smf) -> Option<u32> {
    for track in &smf.tracks {
        for event in track {
            if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
                return Some(tempo.as_int());
            }
        }
    }
    None
}

/// Flatten all tracks into one stream ordered by absolute tick. Events on
/// the same tick keep track order, then in-track order.
fn merge_tracks(smf: &Smf) -> Vec<RawEvent> {
    let mut merged = Vec::new();

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut tick = 0u64;

        for event in track {
            tick += event.delta.as_int() as u64;

            if let TrackEventKind::Midi { channel, message } = event.kind {
                let kind = match message {
                    MidiMessage::NoteOn { key, vel } => RawKind::NoteOn {
                        key: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    MidiMessage::NoteOff { key, .. } => RawKind::NoteOff { key: key.as_int() },
                    _ => continue,
                };

                merged.push(RawEvent {
                    tick,
                    track: track_idx,
                    channel: channel.as_int(),
                    kind,
                });
            }
        }
    }

    // Stable, so same-tick events stay in push order.
    merged.sort_by_key(|event| event.tick);
    merged
}
