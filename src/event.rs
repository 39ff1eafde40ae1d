//! Raw timed events and note-on/note-off pairing.

use std::collections::{HashMap, VecDeque};

/// Payload of a raw container event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    NoteOn { key: u8, velocity: u8 },
    NoteOff { key: u8 },
}

/// One container event with its absolute tick timestamp.
#[derive(Debug, Clone, Copy)]
pub struct RawEvent {
    pub tick: u64,
    pub track: usize,
    pub channel: u8,
    pub kind: RawKind,
}

/// A parsed container seen as a flat, time-ordered note event stream.
///
/// Implemented by the `midly` adapter and by in-memory fakes in tests, so
/// the pairing and scaling logic never needs a real file on disk.
pub trait EventSource {
    /// Resolution of the container's tick timestamps.
    fn ticks_per_beat(&self) -> u32;
    /// Tempo from the container's first tempo meta-event, in BPM.
    fn embedded_tempo(&self) -> Option<f64>;
    /// All note events, merged across tracks, ascending by tick.
    fn events(&self) -> &[RawEvent];
}

/// A paired note, still in tick units.
#[derive(Debug, Clone, Copy)]
pub struct PairedNote {
    pub pitch: u8,
    pub velocity: u8,
    pub channel: u8,
    pub start_tick: u64,
    pub end_tick: u64,
    /// Position of the note-on in the merged stream; tie-breaker when
    /// several notes share a start tick.
    pub order: usize,
}

/// Outcome of pairing: the completed notes plus how many note-ons never
/// saw a matching note-off.
#[derive(Debug, Clone, Default)]
pub struct Pairing {
    pub notes: Vec<PairedNote>,
    pub unmatched: usize,
}

/// Pair each note-on with the next note-off on the same channel and pitch.
///
/// A note-on with velocity 0 counts as a note-off. Note-offs with no
/// pending note-on are ignored, as are pairs that close on the tick they
/// opened. Note-ons still pending at end of stream are counted in
/// `unmatched` and dropped. The returned notes are sorted by start tick,
/// ties in note-on order.
pub fn pair_notes(events: &[RawEvent]) -> Pairing {
    let mut pending: HashMap<(u8, u8), VecDeque<PairedNote>> = HashMap::new();
    let mut notes = Vec::new();

    for (order, event) in events.iter().enumerate() {
        match event.kind {
            RawKind::NoteOn { key, velocity } if velocity > 0 => {
                pending
                    .entry((event.channel, key))
                    .or_default()
                    .push_back(PairedNote {
                        pitch: key,
                        velocity,
                        channel: event.channel,
                        start_tick: event.tick,
                        end_tick: event.tick,
                        order,
                    });
            }
            RawKind::NoteOn { key, .. } | RawKind::NoteOff { key } => {
                if let Some(queue) = pending.get_mut(&(event.channel, key)) {
                    if let Some(mut note) = queue.pop_front() {
                        note.end_tick = event.tick;
                        if note.end_tick > note.start_tick {
                            notes.push(note);
                        }
                    }
                }
            }
        }
    }

    let unmatched = pending.values().map(|queue| queue.len()).sum();

    // Completed notes arrive in note-off order; re-sort by onset.
    notes.sort_by_key(|note| (note.start_tick, note.order));

    Pairing { notes, unmatched }
}
