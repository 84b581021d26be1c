//! Synthesis of Easy/Medium/Hard note tracks from an Expert track
//!
//! Notes are grouped by tick and walked in order. Each group is placed
//! within its measure; groups on even beats are "on-beat", groups on odd
//! beats "off-beat". A long enough gap since the last kept group forces the
//! next group on-beat so sparse passages are not emptied. The per-tier
//! rules in [`rules`] then decide which notes of the group survive.
//!
//! The reduction is lossy by nature. Threshold comparisons are strict
//! (`gap > limit`) and must stay that way: shifting them by one tick changes
//! which notes are playable.

mod rules;

use std::collections::BTreeMap;

use tracing::debug;

use crate::chart::{Difficulty, Instrument, Line, NoteEvent, TempoMap};

/// Where a group of notes sits within its measure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatPosition {
    /// Beat within the measure, not rounded
    pub beat: f64,
    /// On an even beat, or forced there by a gap
    pub on_beat: bool,
    /// On an odd beat
    pub off_beat: bool,
}

impl BeatPosition {
    fn classify(beat: f64, forced: bool) -> Self {
        let whole = beat.fract() == 0.0;
        let even = whole && beat % 2.0 == 0.0;
        let odd = whole && beat % 2.0 == 1.0;
        Self {
            beat,
            on_beat: even || forced,
            off_beat: odd && !forced,
        }
    }

    /// Beat lands halfway between two whole beats
    fn is_half_beat(beat: f64) -> bool {
        beat.fract() != 0.0 && (beat * 2.0).fract() == 0.0
    }
}

/// A note in a tick group together with the line it came from
#[derive(Debug, Clone, Copy)]
pub(crate) struct GroupNote<'a> {
    pub line: &'a Line,
    pub note: NoteEvent,
}

impl GroupNote<'_> {
    fn is_kick(&self) -> bool {
        self.note.lane == 0
    }

    /// The original line, untouched
    fn keep(&self) -> Line {
        self.line.clone()
    }

    /// The same note moved to another lane
    fn moved_to(&self, lane: u32) -> Line {
        if lane == self.note.lane {
            return self.line.clone();
        }
        Line::data(self.note.tick, format!("N {} {}", lane, self.note.sustain))
    }
}

/// Gap after which a group is forced on-beat, in ticks
fn forced_gap(target: Difficulty, resolution: u32) -> u64 {
    let resolution = u64::from(resolution);
    match target {
        Difficulty::Easy => 3 * resolution,
        Difficulty::Medium => 2 * resolution,
        Difficulty::Hard | Difficulty::Expert => resolution,
    }
}

/// Build the `target` tier of `instrument` from its Expert lines.
///
/// Non-note lines (star power and other phrase markers) are copied through
/// for every group. Opaque lines keep their place at the start or end of the
/// section. Requesting Expert returns the input unchanged.
pub fn downgrade(
    expert: &[Line],
    instrument: Instrument,
    target: Difficulty,
    tempo: &TempoMap,
    resolution: u32,
) -> Vec<Line> {
    if target == Difficulty::Expert {
        return expert.to_vec();
    }

    let first_data = expert
        .iter()
        .position(|l| matches!(l, Line::Data { .. }))
        .unwrap_or(expert.len());
    let header = &expert[..first_data];
    let footer: Vec<Line> = expert[first_data..]
        .iter()
        .filter(|l| matches!(l, Line::Opaque(_)))
        .cloned()
        .collect();

    let mut groups: BTreeMap<u32, Vec<&Line>> = BTreeMap::new();
    for line in &expert[first_data..] {
        if let Some(tick) = line.tick() {
            groups.entry(tick).or_default().push(line);
        }
    }

    let limit = forced_gap(target, resolution);
    let mut last_kept_tick = 0u32;
    let mut body: Vec<Line> = Vec::new();

    for (tick, lines) in groups {
        let mut notes = Vec::new();
        let mut passthrough = Vec::new();
        for line in lines {
            match line.note() {
                Some(note) => notes.push(GroupNote { line, note }),
                None => passthrough.push(line.clone()),
            }
        }

        let gap = u64::from(tick.saturating_sub(last_kept_tick));
        let beat = tempo.beat_within_measure(tick, resolution);
        let mut forced = gap > limit;
        if target == Difficulty::Hard && !instrument.is_drums() && BeatPosition::is_half_beat(beat)
        {
            forced = true;
        }
        let position = BeatPosition::classify(beat, forced);

        let kept = if notes.is_empty() {
            Vec::new()
        } else if instrument.is_drums() {
            let bpm = tempo.bpm_at(tick).unwrap_or(0.0);
            rules::drums(target, &notes, position, bpm)
        } else {
            rules::fretted(target, &notes, position)
        };

        if !kept.is_empty() {
            last_kept_tick = tick;
        }
        body.extend(kept);
        body.extend(passthrough);
    }

    body.sort_by_key(|l| l.tick().unwrap_or(0));
    debug!(
        %instrument,
        %target,
        input = expert.len(),
        output = body.len(),
        "downgraded track"
    );

    let mut out = header.to_vec();
    out.extend(body);
    out.extend(footer);
    out
}
