//! The conversion core: tick timestamps to seconds, speed scaling,
//! velocity stripping.

use serde::Serialize;

use crate::config::ConversionConfig;
use crate::event::{pair_notes, EventSource};

/// One converted note, ready to serialize. Times are in seconds with the
/// speed multiplier already applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteEvent {
    pub pitch: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<u8>,
    pub start_time: f64,
    pub duration: f64,
}

/// Result of one conversion run.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Tempo the tick conversion actually used, in BPM.
    pub tempo_bpm: f64,
    /// Paired notes, ascending by start time, ties in stream order.
    pub events: Vec<NoteEvent>,
    /// Note-ons that never saw a matching note-off and were dropped.
    pub unmatched: usize,
}

pub struct Converter {
    config: ConversionConfig,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, source: &dyn EventSource) -> Conversion {
        let tempo_bpm = self.config.effective_bpm(source.embedded_tempo());
        let seconds_per_tick = 60.0 / tempo_bpm / source.ticks_per_beat() as f64;
        let scale = seconds_per_tick * self.config.speed_multiplier;

        let pairing = pair_notes(source.events());

        let events = pairing
            .notes
            .iter()
            .map(|note| NoteEvent {
                pitch: note.pitch,
                velocity: self.config.velocity_enabled.then_some(note.velocity),
                start_time: note.start_tick as f64 * scale,
                duration: (note.end_tick - note.start_tick) as f64 * scale,
            })
            .collect();

        Conversion {
            tempo_bpm,
            events,
            unmatched: pairing.unmatched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{RawEvent, RawKind};
    use proptest::prelude::*;

    /// In-memory stand-in for a parsed MIDI file.
    struct FakeSource {
        ticks_per_beat: u32,
        tempo: Option<f64>,
        events: Vec<RawEvent>,
    }

    impl EventSource for FakeSource {
        fn ticks_per_beat(&self) -> u32 {
            self.ticks_per_beat
        }

        fn embedded_tempo(&self) -> Option<f64> {
            self.tempo
        }

        fn events(&self) -> &[RawEvent] {
            &self.events
        }
    }

    fn on(tick: u64, track: usize, key: u8, velocity: u8) -> RawEvent {
        RawEvent {
            tick,
            track,
            channel: 0,
            kind: RawKind::NoteOn { key, velocity },
        }
    }

    fn off(tick: u64, track: usize, key: u8) -> RawEvent {
        RawEvent {
            tick,
            track,
            channel: 0,
            kind: RawKind::NoteOff { key },
        }
    }

    /// Two tracks, one note each: pitch 60, velocity 100, one beat long.
    fn two_track_source() -> FakeSource {
        FakeSource {
            ticks_per_beat: 480,
            tempo: Some(120.0),
            events: vec![
                on(0, 0, 60, 100),
                on(0, 1, 60, 100),
                off(480, 0, 60),
                off(480, 1, 60),
            ],
        }
    }

    #[test]
    fn test_one_beat_at_120_bpm_is_half_a_second() {
        let conversion = Converter::new(ConversionConfig::default()).convert(&two_track_source());

        assert_eq!(conversion.tempo_bpm, 120.0);
        assert_eq!(conversion.events.len(), 2);
        assert_eq!(conversion.unmatched, 0);

        for event in &conversion.events {
            assert_eq!(event.pitch, 60);
            assert_eq!(event.velocity, Some(100));
            assert!(event.start_time.abs() < 1e-9);
            assert!((event.duration - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_velocity_disabled_strips_velocity_only() {
        let config = ConversionConfig {
            velocity_enabled: false,
            ..Default::default()
        };
        let with = Converter::new(ConversionConfig::default()).convert(&two_track_source());
        let without = Converter::new(config).convert(&two_track_source());

        assert_eq!(with.events.len(), without.events.len());
        for (a, b) in with.events.iter().zip(&without.events) {
            assert_eq!(b.velocity, None);
            assert_eq!(a.pitch, b.pitch);
            assert_eq!(a.start_time, b.start_time);
            assert_eq!(a.duration, b.duration);
        }
    }

    #[test]
    fn test_tempo_override_beats_embedded_tempo() {
        let config = ConversionConfig {
            tempo_bpm: Some(60.0),
            ..Default::default()
        };
        let conversion = Converter::new(config).convert(&two_track_source());

        assert_eq!(conversion.tempo_bpm, 60.0);
        // One beat at 60 BPM lasts a full second.
        assert!((conversion.events[0].duration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_tempo_when_file_has_none() {
        let source = FakeSource {
            tempo: None,
            ..two_track_source()
        };
        let conversion = Converter::new(ConversionConfig::default()).convert(&source);
        assert_eq!(conversion.tempo_bpm, 120.0);
    }

    #[test]
    fn test_output_is_sorted_by_start_time() {
        let source = FakeSource {
            ticks_per_beat: 480,
            tempo: None,
            events: vec![
                on(960, 0, 64, 80),
                off(1440, 0, 64),
                on(0, 1, 60, 100),
                off(480, 1, 60),
            ],
        };
        let conversion = Converter::new(ConversionConfig::default()).convert(&source);

        let starts: Vec<f64> = conversion.events.iter().map(|e| e.start_time).collect();
        let mut sorted = starts.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(starts, sorted);
        assert_eq!(conversion.events[0].pitch, 60);
    }

    proptest! {
        #[test]
        fn doubling_speed_doubles_every_time(
            notes in proptest::collection::vec((0u64..4000, 1u64..500, 0u8..128), 1..24),
            speed in 0.05f64..8.0,
        ) {
            let mut events = Vec::new();
            for &(start, len, key) in &notes {
                events.push(on(start, 0, key, 100));
                events.push(off(start + len, 0, key));
            }
            events.sort_by_key(|e| e.tick);

            let source = FakeSource { ticks_per_beat: 480, tempo: None, events };

            let base = Converter::new(ConversionConfig {
                speed_multiplier: speed,
                ..Default::default()
            })
            .convert(&source);
            let doubled = Converter::new(ConversionConfig {
                speed_multiplier: speed * 2.0,
                ..Default::default()
            })
            .convert(&source);

            prop_assert_eq!(base.events.len(), doubled.events.len());
            for (a, b) in base.events.iter().zip(&doubled.events) {
                prop_assert!((b.start_time - 2.0 * a.start_time).abs() <= 1e-9 * b.start_time.abs().max(1.0));
                prop_assert!((b.duration - 2.0 * a.duration).abs() <= 1e-9 * b.duration.abs().max(1.0));
            }
        }

        #[test]
        fn line_order_is_non_decreasing(
            notes in proptest::collection::vec((0u64..4000, 1u64..500, 0u8..128), 0..24),
        ) {
            let mut events = Vec::new();
            for &(start, len, key) in &notes {
                events.push(on(start, 0, key, 64));
                events.push(off(start + len, 0, key));
            }
            events.sort_by_key(|e| e.tick);

            let source = FakeSource { ticks_per_beat: 480, tempo: None, events };
            let conversion = Converter::new(ConversionConfig::default()).convert(&source);

            for pair in conversion.events.windows(2) {
                prop_assert!(pair[0].start_time <= pair[1].start_time);
            }
        }
    }
}
