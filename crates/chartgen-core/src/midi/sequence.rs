//! Decoding of the binary container into absolute-time events

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::error::{Error, Result};

/// One decoded event with its absolute tick in the source resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
    pub tick: u32,
    pub kind: EventKind,
}

/// The subset of sequence events the converter cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    TrackName(String),
    Text(String),
    Marker(String),
    /// Microseconds per quarter note
    Tempo(u32),
    TimeSignature { numerator: u8, denominator: u32 },
    NoteOn { pitch: u8 },
    NoteOff { pitch: u8 },
}

impl EventKind {
    /// Pitch of a note-on or note-off
    pub fn pitch(&self) -> Option<u8> {
        match self {
            Self::NoteOn { pitch } | Self::NoteOff { pitch } => Some(*pitch),
            _ => None,
        }
    }
}

/// A decoded multi-track sequence
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    pub ticks_per_beat: u16,
    pub tracks: Vec<Vec<TimedEvent>>,
}

impl Sequence {
    /// Decode a standard MIDI file
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let smf = Smf::parse(bytes)?;
        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(ticks) => ticks.as_int(),
            Timing::Timecode(..) => {
                return Err(Error::Midi(
                    "timecode-based timing is not supported".to_string(),
                ))
            }
        };
        if ticks_per_beat == 0 {
            return Err(Error::Midi("header declares 0 ticks per beat".to_string()));
        }

        let tracks = smf
            .tracks
            .iter()
            .map(|track| {
                let mut tick = 0u32;
                let mut events = Vec::new();
                for event in track {
                    tick = tick.saturating_add(event.delta.as_int());
                    if let Some(kind) = decode_kind(&event.kind) {
                        events.push(TimedEvent { tick, kind });
                    }
                }
                events
            })
            .collect();

        Ok(Self {
            ticks_per_beat,
            tracks,
        })
    }

    /// Name of a track: its first `TrackName` event
    pub fn track_name(&self, index: usize) -> Option<&str> {
        self.tracks.get(index)?.iter().find_map(|e| match &e.kind {
            EventKind::TrackName(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

fn decode_kind(kind: &TrackEventKind<'_>) -> Option<EventKind> {
    match kind {
        TrackEventKind::Midi { message, .. } => match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => Some(EventKind::NoteOn {
                pitch: key.as_int(),
            }),
            // Velocity 0 note-ons are note-offs
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                Some(EventKind::NoteOff {
                    pitch: key.as_int(),
                })
            }
            _ => None,
        },
        TrackEventKind::Meta(meta) => match meta {
            MetaMessage::TrackName(raw) => Some(EventKind::TrackName(text(raw))),
            MetaMessage::Text(raw) => Some(EventKind::Text(text(raw))),
            MetaMessage::Marker(raw) => Some(EventKind::Marker(text(raw))),
            MetaMessage::Tempo(mpq) => Some(EventKind::Tempo(mpq.as_int())),
            MetaMessage::TimeSignature(numerator, denominator_pow, _, _) => {
                Some(EventKind::TimeSignature {
                    numerator: *numerator,
                    denominator: 1u32.checked_shl(u32::from(*denominator_pow)).unwrap_or(0),
                })
            }
            _ => None,
        },
        _ => None,
    }
}

/// Decode meta text, folding line breaks so one event stays one chart line
fn text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}
