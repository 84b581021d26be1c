//! Conversion of rhythm-game MIDI files into chart text
//!
//! Track conventions follow the common rhythm-game layout: track 0 holds
//! tempo, meter and song markers; instrument tracks are named `PART ...`;
//! an optional `EVENTS` track carries global cues. Note pitches encode both
//! difficulty tier (one octave per tier from 60 upwards) and lane.

mod sequence;
mod vocabulary;

pub use sequence::{EventKind, Sequence, TimedEvent};

use tracing::debug;

use crate::chart::{
    self, ChartDocument, Difficulty, Instrument, Line, EVENTS_SECTION, SONG_SECTION,
    SYNC_TRACK_SECTION,
};
use crate::error::{Error, Result};

/// Resolution of every chart produced by the converter
pub const CHART_RESOLUTION: u32 = 192;

/// Sustains shorter than this (in chart ticks) are written as plain notes
pub const MIN_SUSTAIN: u32 = 96;

/// Track name that must be present for a conversion to proceed
pub const REQUIRED_TRACK: &str = "PART GUITAR";

/// Options for a conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Song name used when the file names no track
    pub placeholder_title: String,
    /// Drop sections with no lines
    pub omit_empty_sections: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            placeholder_title: "Untitled".to_string(),
            omit_empty_sections: true,
        }
    }
}

/// How a named track is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackRole {
    Notes(Instrument),
    Events,
}

fn classify(name: &str) -> Option<TrackRole> {
    let role = match name.trim() {
        "PART GUITAR" => TrackRole::Notes(Instrument::Guitar),
        "PART GUITAR COOP" => TrackRole::Notes(Instrument::GuitarCoop),
        "PART BASS" => TrackRole::Notes(Instrument::Bass),
        "PART RHYTHM" => TrackRole::Notes(Instrument::Rhythm),
        "PART DRUMS" => TrackRole::Notes(Instrument::Drums),
        "PART KEYS" => TrackRole::Notes(Instrument::Keys),
        "EVENTS" => TrackRole::Events,
        _ => return None,
    };
    Some(role)
}

/// Convert MIDI bytes into chart text
pub fn convert(bytes: &[u8], options: &ConversionOptions) -> Result<String> {
    convert_document(bytes, options).map(|doc| chart::serialize(&doc))
}

/// Convert MIDI bytes into a chart document
pub fn convert_document(bytes: &[u8], options: &ConversionOptions) -> Result<ChartDocument> {
    let sequence = Sequence::decode(bytes)?;
    Converter::new(&sequence).run(options)
}

/// Per-instrument note lines, one list per tier
#[derive(Debug, Default)]
struct TierLines {
    lines: [Vec<Line>; 4],
}

impl TierLines {
    fn push(&mut self, difficulty: Difficulty, line: Line) {
        self.lines[difficulty as usize].push(line);
    }

    fn get(&self, difficulty: Difficulty) -> &[Line] {
        &self.lines[difficulty as usize]
    }
}

/// Rescale a source tick to the chart resolution, saturating at `u32::MAX`
fn rescale(tick: u32, ticks_per_beat: u64) -> u32 {
    u32::try_from(u64::from(tick) * u64::from(CHART_RESOLUTION) / ticks_per_beat.max(1))
        .unwrap_or(u32::MAX)
}

struct Converter<'a> {
    sequence: &'a Sequence,
    ticks_per_beat: u64,
}

impl<'a> Converter<'a> {
    fn new(sequence: &'a Sequence) -> Self {
        Self {
            sequence,
            ticks_per_beat: u64::from(sequence.ticks_per_beat.max(1)),
        }
    }

    fn rescale(&self, tick: u32) -> u32 {
        rescale(tick, self.ticks_per_beat)
    }

    fn run(&self, options: &ConversionOptions) -> Result<ChartDocument> {
        let roles: Vec<Option<TrackRole>> = (0..self.sequence.tracks.len())
            .map(|idx| {
                if idx == 0 {
                    None
                } else {
                    self.sequence.track_name(idx).and_then(classify)
                }
            })
            .collect();

        let has_guitar = (0..self.sequence.tracks.len())
            .any(|idx| self.sequence.track_name(idx).map(str::trim) == Some(REQUIRED_TRACK));
        if !has_guitar {
            return Err(Error::Conversion(format!(
                "MIDI file has no \"{}\" track",
                REQUIRED_TRACK
            )));
        }

        let has_events_track = roles.contains(&Some(TrackRole::Events));
        let title = self
            .sequence
            .tracks
            .iter()
            .flatten()
            .find_map(|e| match &e.kind {
                EventKind::TrackName(name) if !name.trim().is_empty() => Some(name.clone()),
                _ => None,
            })
            .unwrap_or_else(|| options.placeholder_title.clone());

        let (sync_lines, marker_lines) = self.conductor_track();
        let mut event_lines = if has_events_track {
            Vec::new()
        } else {
            marker_lines
        };

        let mut notes: Vec<(Instrument, TierLines)> = Vec::new();
        for (idx, role) in roles.iter().enumerate() {
            match role {
                Some(TrackRole::Notes(instrument)) => {
                    debug!(track = idx, %instrument, "converting note track");
                    let tiers = self.note_track(&self.sequence.tracks[idx]);
                    match notes.iter_mut().find(|(i, _)| i == instrument) {
                        Some((_, existing)) => *existing = tiers,
                        None => notes.push((*instrument, tiers)),
                    }
                }
                Some(TrackRole::Events) => {
                    debug!(track = idx, "converting events track");
                    event_lines.extend(self.events_track(&self.sequence.tracks[idx]));
                }
                None => {
                    debug!(track = idx, name = ?self.sequence.track_name(idx), "skipping track");
                }
            }
        }

        let player2 = if notes.iter().any(|(i, _)| *i == Instrument::Rhythm) {
            "rhythm"
        } else {
            "bass"
        };

        let mut doc = ChartDocument::new();
        doc.set_section(SONG_SECTION, song_header(&title, player2));

        let mut push = |name: String, lines: Vec<Line>| {
            if !(options.omit_empty_sections && lines.is_empty()) {
                doc.set_section(name, lines);
            }
        };
        push(SYNC_TRACK_SECTION.to_string(), sync_lines);
        push(EVENTS_SECTION.to_string(), event_lines);
        for instrument in Instrument::ALL {
            let tiers = notes.iter().find(|(i, _)| *i == instrument).map(|(_, t)| t);
            for difficulty in Difficulty::ALL {
                let lines = tiers.map(|t| t.get(difficulty).to_vec()).unwrap_or_default();
                push(instrument.section_name(difficulty), lines);
            }
        }

        Ok(doc)
    }

    /// Tempo, time signatures and section markers from track 0
    fn conductor_track(&self) -> (Vec<Line>, Vec<Line>) {
        let mut sync = Vec::new();
        let mut markers = Vec::new();
        let Some(track) = self.sequence.tracks.first() else {
            return (sync, markers);
        };

        for event in track {
            let tick = self.rescale(event.tick);
            match &event.kind {
                EventKind::Tempo(mpq) if *mpq > 0 => {
                    let milli_bpm = 60_000_000_000u64 / u64::from(*mpq);
                    sync.push(Line::data(tick, format!("B {}", milli_bpm)));
                }
                EventKind::TimeSignature {
                    numerator,
                    denominator,
                } => {
                    let exponent = f64::from(*denominator).sqrt().floor() as u32;
                    sync.push(Line::data(tick, format!("TS {} {}", numerator, exponent)));
                }
                EventKind::Marker(text) => {
                    markers.push(Line::data(tick, format!("E \"section {}\"", text)));
                }
                _ => {}
            }
        }
        (sync, markers)
    }

    /// Notes of one instrument track, split by tier
    fn note_track(&self, events: &[TimedEvent]) -> TierLines {
        let mut tiers = TierLines::default();

        for (idx, event) in events.iter().enumerate() {
            let EventKind::NoteOn { pitch } = event.kind else {
                continue;
            };
            let Some(difficulty) = tier_for_pitch(pitch) else {
                continue;
            };
            let Some(payload_kind) = lane_for_pitch(pitch) else {
                continue;
            };

            let start = self.rescale(event.tick);
            let end = events[idx + 1..]
                .iter()
                .find(|e| e.kind.pitch() == Some(pitch))
                .map(|e| self.rescale(e.tick))
                .unwrap_or(start);
            let mut sustain = end.saturating_sub(start);
            if sustain < MIN_SUSTAIN {
                sustain = 0;
            }

            let payload = match payload_kind {
                LaneKind::Note(lane) => format!("N {} {}", lane, sustain),
                LaneKind::Special(lane) => format!("S {} {}", lane, sustain),
            };
            tiers.push(difficulty, Line::data(start, payload));
        }
        tiers
    }

    /// Whitelisted text cues from the EVENTS track
    fn events_track(&self, events: &[TimedEvent]) -> Vec<Line> {
        events
            .iter()
            .filter_map(|event| match &event.kind {
                EventKind::Text(text) | EventKind::Marker(text) => {
                    vocabulary::chart_event(text).map(|e| (event.tick, e))
                }
                _ => None,
            })
            .map(|(tick, text)| Line::data(self.rescale(tick), format!("E \"{}\"", text)))
            .collect()
    }
}

/// Where a pitch lands within its tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaneKind {
    Note(u32),
    Special(u32),
}

fn tier_for_pitch(pitch: u8) -> Option<Difficulty> {
    match pitch {
        60..=71 => Some(Difficulty::Easy),
        72..=83 => Some(Difficulty::Medium),
        84..=95 => Some(Difficulty::Hard),
        96..=u8::MAX => Some(Difficulty::Expert),
        _ => None,
    }
}

fn lane_for_pitch(pitch: u8) -> Option<LaneKind> {
    match pitch % 12 {
        lane @ 0..=4 => Some(LaneKind::Note(u32::from(lane))),
        7 => Some(LaneKind::Special(2)),
        9 => Some(LaneKind::Special(0)),
        10 => Some(LaneKind::Special(1)),
        _ => None,
    }
}

fn song_header(title: &str, player2: &str) -> Vec<Line> {
    [
        format!("Name = \"{}\"", title),
        "Offset = 0".to_string(),
        format!("Resolution = {}", CHART_RESOLUTION),
        format!("Player2 = {}", player2),
        "Difficulty = 0".to_string(),
        "PreviewStart = 0".to_string(),
        "PreviewEnd = 0".to_string(),
        "MediaType = \"cd\"".to_string(),
        "MusicStream = \"song.ogg\"".to_string(),
    ]
    .into_iter()
    .map(Line::Opaque)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

    fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Meta(message),
        }
    }

    fn note(delta: u32, key: u8, on: bool) -> TrackEvent<'static> {
        let message = if on {
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(100),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            }
        };
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message,
            },
        }
    }

    fn write(ticks_per_beat: u16, tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
        let smf = Smf {
            header: Header::new(Format::Parallel, Timing::Metrical(u15::new(ticks_per_beat))),
            tracks,
        };
        let mut bytes = Vec::new();
        smf.write_std(&mut bytes).unwrap();
        bytes
    }

    fn conductor() -> Vec<TrackEvent<'static>> {
        vec![
            meta(0, MetaMessage::TrackName(b"My Song")),
            meta(0, MetaMessage::Tempo(u24::new(500_000))),
            meta(0, MetaMessage::TimeSignature(4, 2, 24, 8)),
            meta(960, MetaMessage::Marker(b"Intro")),
            meta(0, MetaMessage::EndOfTrack),
        ]
    }

    fn guitar() -> Vec<TrackEvent<'static>> {
        vec![
            meta(0, MetaMessage::TrackName(b"PART GUITAR")),
            // Expert green, held for one beat at 480 tpb
            note(0, 96, true),
            note(480, 96, false),
            // Expert orange, short
            note(0, 100, true),
            note(60, 100, false),
            // Easy red + a dropped residue (pitch 65 -> 5)
            note(0, 61, true),
            note(0, 65, true),
            note(10, 61, false),
            note(0, 65, false),
            // Expert star power phrase (103 -> special 2)
            note(0, 103, true),
            note(960, 103, false),
            meta(0, MetaMessage::EndOfTrack),
        ]
    }

    #[test]
    fn test_rescale_saturates() {
        assert_eq!(rescale(960, 960), CHART_RESOLUTION);
        assert_eq!(rescale(480, 960), CHART_RESOLUTION / 2);
        assert_eq!(rescale(u32::MAX, 1), u32::MAX);
        assert_eq!(rescale(u32::MAX / 2, 96), u32::MAX - 1);
        assert_eq!(rescale(u32::MAX / 2, 64), u32::MAX);
        assert_eq!(rescale(7, 0), 7 * CHART_RESOLUTION);
    }

    #[test]
    fn test_missing_guitar_track_is_rejected() {
        let drums = vec![
            meta(0, MetaMessage::TrackName(b"PART DRUMS")),
            note(0, 96, true),
            note(10, 96, false),
            meta(0, MetaMessage::EndOfTrack),
        ];
        let bytes = write(480, vec![conductor(), drums]);
        let err = convert(&bytes, &ConversionOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    #[test]
    fn test_garbage_is_a_midi_error() {
        let err = convert(b"not a midi file", &ConversionOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Midi(_)));
    }

    #[test]
    fn test_sync_track_and_title() {
        let bytes = write(480, vec![conductor(), guitar()]);
        let doc = convert_document(&bytes, &ConversionOptions::default()).unwrap();

        assert_eq!(doc.header_value("Song", "Name"), Some("My Song"));
        assert_eq!(doc.resolution(), 192);
        assert_eq!(doc.header_value("Song", "Player2"), Some("bass"));
        assert_eq!(
            doc.section("SyncTrack").unwrap(),
            &[Line::data(0, "B 120000"), Line::data(0, "TS 4 2")]
        );
        // No EVENTS track: markers become sections, rescaled 960 -> 384
        assert_eq!(
            doc.section("Events").unwrap(),
            &[Line::data(384, "E \"section Intro\"")]
        );
    }

    #[test]
    fn test_notes_are_rescaled_and_split_by_tier() {
        let bytes = write(480, vec![conductor(), guitar()]);
        let doc = convert_document(&bytes, &ConversionOptions::default()).unwrap();

        assert_eq!(
            doc.section("ExpertSingle").unwrap(),
            &[
                Line::data(0, "N 0 192"),
                Line::data(192, "N 4 0"),
                Line::data(220, "S 2 384"),
            ]
        );
        assert_eq!(doc.section("EasySingle").unwrap(), &[Line::data(216, "N 1 0")]);
        // Empty tiers and instruments are omitted
        assert!(!doc.has_section("MediumSingle"));
        assert!(!doc.has_section("ExpertDrums"));
    }

    #[test]
    fn test_keep_empty_sections() {
        let bytes = write(480, vec![conductor(), guitar()]);
        let options = ConversionOptions {
            omit_empty_sections: false,
            ..Default::default()
        };
        let doc = convert_document(&bytes, &options).unwrap();
        assert!(doc.section("MediumSingle").unwrap().is_empty());
        assert!(doc.has_section("ExpertKeyboard"));
        let names: Vec<_> = doc.section_names().take(4).collect();
        assert_eq!(names, vec!["Song", "SyncTrack", "Events", "EasySingle"]);
    }

    #[test]
    fn test_events_track_filters_vocabulary() {
        let events = vec![
            meta(0, MetaMessage::TrackName(b"EVENTS")),
            meta(0, MetaMessage::Text(b"[music_start]")),
            meta(192, MetaMessage::Text(b"[section Verse 1]")),
            meta(0, MetaMessage::Text(b"[lighting (strobe)]")),
            meta(0, MetaMessage::Text(b"random chatter")),
            meta(0, MetaMessage::EndOfTrack),
        ];
        let rhythm = vec![
            meta(0, MetaMessage::TrackName(b"PART RHYTHM")),
            note(0, 97, true),
            note(10, 97, false),
            meta(0, MetaMessage::EndOfTrack),
        ];
        let bytes = write(192, vec![conductor(), guitar(), events, rhythm]);
        let doc = convert_document(&bytes, &ConversionOptions::default()).unwrap();

        // Markers in track 0 are ignored when an EVENTS track exists
        assert_eq!(
            doc.section("Events").unwrap(),
            &[
                Line::data(0, "E \"music_start\""),
                Line::data(192, "E \"section Verse 1\""),
                Line::data(192, "E \"lighting (strobe)\""),
            ]
        );
        assert_eq!(doc.header_value("Song", "Player2"), Some("rhythm"));
        assert_eq!(
            doc.section("ExpertDoubleRhythm").unwrap(),
            &[Line::data(0, "N 1 0")]
        );
    }

    #[test]
    fn test_title_falls_back_to_first_named_track() {
        let conductor = vec![
            meta(0, MetaMessage::Tempo(u24::new(400_000))),
            meta(0, MetaMessage::EndOfTrack),
        ];
        let bytes = write(480, vec![conductor, guitar()]);
        let options = ConversionOptions {
            placeholder_title: "Unknown Song".into(),
            ..Default::default()
        };
        let doc = convert_document(&bytes, &options).unwrap();
        // First track name anywhere wins
        assert_eq!(doc.header_value("Song", "Name"), Some("PART GUITAR"));
        assert_eq!(doc.section("SyncTrack").unwrap(), &[Line::data(0, "B 150000")]);
        assert!(!doc.has_section("Events"));
    }

    #[test]
    fn test_pitch_mapping() {
        assert_eq!(tier_for_pitch(59), None);
        assert_eq!(tier_for_pitch(71), Some(Difficulty::Easy));
        assert_eq!(tier_for_pitch(84), Some(Difficulty::Hard));
        assert_eq!(tier_for_pitch(127), Some(Difficulty::Expert));
        assert_eq!(lane_for_pitch(100), Some(LaneKind::Note(4)));
        assert_eq!(lane_for_pitch(105), Some(LaneKind::Special(0)));
        assert_eq!(lane_for_pitch(106), Some(LaneKind::Special(1)));
        assert_eq!(lane_for_pitch(101), None);
    }
}
