//! Section-based chart text format
//!
//! A chart is a sequence of named sections:
//!
//! ```text
//! [Song]
//! {
//!   Resolution = 192
//! }
//! [ExpertSingle]
//! {
//!   0 = N 0 0
//! }
//! ```
//!
//! Lines inside a section are either timed data lines (`tick = TYPE payload`)
//! or opaque key/value lines. The document keeps both in their original order
//! so that anything the generator does not touch round-trips unchanged.

mod parser;
mod tempo;
mod track;

pub use parser::{parse, serialize};
pub use tempo::{BpmEvent, TempoMap, TimeSignatureEvent};
pub use track::{Difficulty, Instrument, NoteEvent, SpecialEvent};

use std::fmt;

/// Name of the metadata section
pub const SONG_SECTION: &str = "Song";
/// Name of the tempo/time-signature section
pub const SYNC_TRACK_SECTION: &str = "SyncTrack";
/// Name of the global events section
pub const EVENTS_SECTION: &str = "Events";

/// A single line inside a section body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// `tick = payload`, where payload starts with the event type (`N`, `S`, `B`, ...)
    Data { tick: u32, payload: String },
    /// Anything else, kept verbatim (e.g. `Resolution = 192`)
    Opaque(String),
}

impl Line {
    /// Classify a trimmed line
    pub fn parse(text: &str) -> Self {
        if let Some((lhs, rhs)) = text.split_once('=') {
            let lhs = lhs.trim();
            if !lhs.is_empty() && lhs.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(tick) = lhs.parse::<u32>() {
                    return Self::Data {
                        tick,
                        payload: rhs.trim().to_string(),
                    };
                }
            }
        }
        Self::Opaque(text.to_string())
    }

    /// Build a data line from its parts
    pub fn data(tick: u32, payload: impl Into<String>) -> Self {
        Self::Data {
            tick,
            payload: payload.into(),
        }
    }

    /// Tick of a data line
    pub fn tick(&self) -> Option<u32> {
        match self {
            Self::Data { tick, .. } => Some(*tick),
            Self::Opaque(_) => None,
        }
    }

    /// Event type token of a data line (`N`, `S`, `B`, `TS`, `E`, ...)
    pub fn event_type(&self) -> Option<&str> {
        match self {
            Self::Data { payload, .. } => payload.split_whitespace().next(),
            Self::Opaque(_) => None,
        }
    }

    /// Decode an `N <lane> <sustain>` line
    pub fn note(&self) -> Option<NoteEvent> {
        self.lane_event("N")
            .map(|(tick, lane, sustain)| NoteEvent { tick, lane, sustain })
    }

    /// Decode an `S <lane> <sustain>` line
    pub fn special(&self) -> Option<SpecialEvent> {
        self.lane_event("S")
            .map(|(tick, lane, sustain)| SpecialEvent { tick, lane, sustain })
    }

    fn lane_event(&self, kind: &str) -> Option<(u32, u32, u32)> {
        let Self::Data { tick, payload } = self else {
            return None;
        };
        let mut parts = payload.split_whitespace();
        if parts.next()? != kind {
            return None;
        }
        let lane = parts.next()?.parse().ok()?;
        let sustain = parts.next().map_or(Some(0), |s| s.parse().ok())?;
        Some((*tick, lane, sustain))
    }

    /// Key of a `key = value` opaque line
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Opaque(text) => text.split_once('=').map(|(k, _)| k.trim()),
            Self::Data { .. } => None,
        }
    }

    /// Value of a `key = value` opaque line
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Opaque(text) => text.split_once('=').map(|(_, v)| v.trim()),
            Self::Data { .. } => None,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data { tick, payload } => write!(f, "{} = {}", tick, payload),
            Self::Opaque(text) => f.write_str(text),
        }
    }
}

/// A parsed chart: named sections in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartDocument {
    sections: Vec<(String, Vec<Line>)>,
}

impl ChartDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Section names in document order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate over `(name, lines)` in document order
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[Line])> {
        self.sections
            .iter()
            .map(|(name, lines)| (name.as_str(), lines.as_slice()))
    }

    /// Lines of a section
    pub fn section(&self, name: &str) -> Option<&[Line]> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, lines)| lines.as_slice())
    }

    /// Check whether a section exists
    pub fn has_section(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|(n, _)| n == name)
    }

    /// Replace a section's lines in place, or append it if absent
    pub fn set_section(&mut self, name: impl Into<String>, lines: Vec<Line>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.sections[idx].1 = lines,
            None => self.sections.push((name, lines)),
        }
    }

    /// Replace a section in place, or insert it before `anchor` (appending if
    /// the anchor is missing)
    pub fn insert_section_before(&mut self, anchor: &str, name: impl Into<String>, lines: Vec<Line>) {
        let name = name.into();
        if let Some(idx) = self.position(&name) {
            self.sections[idx].1 = lines;
            return;
        }
        match self.position(anchor) {
            Some(idx) => self.sections.insert(idx, (name, lines)),
            None => self.sections.push((name, lines)),
        }
    }

    /// Look up `key = value` in a section, with surrounding quotes stripped
    pub fn header_value(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .iter()
            .find(|line| line.key() == Some(key))
            .and_then(Line::value)
            .map(|v| v.trim_matches('"'))
    }

    /// Ticks per beat declared in `[Song]`, 0 when absent or unreadable
    pub fn resolution(&self) -> u32 {
        self.header_value(SONG_SECTION, "Resolution")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if the document has no sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
