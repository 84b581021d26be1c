//! Per-tier note selection for one tick group

use super::{BeatPosition, GroupNote};
use crate::chart::{Difficulty, Line};

/// Tempo above which Medium drums thin out on-beat hits
const MEDIUM_DRUMS_FAST_BPM: f64 = 150.0;

/// Open-note lane on fretted instruments
const OPEN: u32 = 7;

/// Guitar, bass, keys and friends
pub(super) fn fretted(target: Difficulty, notes: &[GroupNote<'_>], pos: BeatPosition) -> Vec<Line> {
    match target {
        Difficulty::Easy if pos.on_beat => notes
            .iter()
            .take(1)
            .map(|n| {
                n.moved_to(match n.note.lane {
                    4 | OPEN => 0,
                    3 => 1,
                    lane => lane,
                })
            })
            .collect(),
        Difficulty::Medium if pos.on_beat || pos.off_beat => notes
            .iter()
            .take(2)
            .map(|n| {
                n.moved_to(match n.note.lane {
                    4 | OPEN => 0,
                    lane => lane,
                })
            })
            .collect(),
        Difficulty::Hard if pos.on_beat || pos.off_beat => {
            notes.iter().map(GroupNote::keep).collect()
        }
        Difficulty::Expert => notes.iter().map(GroupNote::keep).collect(),
        _ => Vec::new(),
    }
}

/// Kick on the downbeat, otherwise the first cymbal/tom moved to `lane`
fn downbeat_or_cymbal(
    notes: &[GroupNote<'_>],
    pos: BeatPosition,
    cymbals: &[u32],
    lane: u32,
) -> Vec<Line> {
    if pos.beat == 0.0 {
        if let Some(kick) = notes.iter().find(|n| n.is_kick()) {
            return vec![kick.keep()];
        }
    }
    notes
        .iter()
        .find(|n| cymbals.contains(&n.note.lane))
        .map(|n| vec![n.moved_to(lane)])
        .unwrap_or_default()
}

/// Five-lane drums; lane 0 is the kick
pub(super) fn drums(
    target: Difficulty,
    notes: &[GroupNote<'_>],
    pos: BeatPosition,
    bpm: f64,
) -> Vec<Line> {
    match target {
        Difficulty::Easy if pos.on_beat => downbeat_or_cymbal(notes, pos, &[3, 4], 2),
        Difficulty::Medium if pos.on_beat => {
            if bpm > MEDIUM_DRUMS_FAST_BPM && pos.beat != 0.0 {
                return Vec::new();
            }
            downbeat_or_cymbal(notes, pos, &[4], 3)
        }
        Difficulty::Medium if pos.off_beat => notes
            .iter()
            .filter(|n| !n.is_kick())
            .take(2)
            .map(|n| n.moved_to(if n.note.lane == 4 { 3 } else { n.note.lane }))
            .collect(),
        Difficulty::Hard if pos.on_beat => {
            let kick = notes.iter().find(|n| n.is_kick());
            let hand = notes.iter().find(|n| !n.is_kick());
            kick.into_iter().chain(hand).map(GroupNote::keep).collect()
        }
        Difficulty::Hard if pos.off_beat => {
            let drop_kick = notes.len() > 2;
            notes
                .iter()
                .filter(|n| !(drop_kick && n.is_kick()))
                .take(2)
                .map(GroupNote::keep)
                .collect()
        }
        Difficulty::Expert => notes.iter().map(GroupNote::keep).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Instrument, TempoMap};
    use crate::downgrade::downgrade;

    const RES: u32 = 192;

    fn tempo(bpm: f64) -> TempoMap {
        let mut map = TempoMap::new();
        map.push_time_signature(0, 4);
        map.push_bpm(0, bpm);
        map
    }

    fn drums(target: Difficulty, bpm: f64, list: &[(u32, u32)]) -> Vec<Line> {
        let lines: Vec<Line> = list
            .iter()
            .map(|(tick, lane)| Line::data(*tick, format!("N {} 0", lane)))
            .collect();
        downgrade(&lines, Instrument::Drums, target, &tempo(bpm), RES)
    }

    #[test]
    fn test_easy_drums_kick_on_downbeat() {
        let out = drums(Difficulty::Easy, 120.0, &[(0, 1), (0, 0), (0, 4)]);
        assert_eq!(out, vec![Line::data(0, "N 0 0")]);
    }

    #[test]
    fn test_easy_drums_cymbal_elsewhere() {
        // beat 2: no kick rule, first lane 3/4 moves to lane 2
        let out = drums(Difficulty::Easy, 120.0, &[(0, 0), (384, 0), (384, 4), (384, 3)]);
        assert_eq!(out, vec![Line::data(0, "N 0 0"), Line::data(384, "N 2 0")]);
    }

    #[test]
    fn test_easy_drums_drop_groups_without_cymbals() {
        let out = drums(Difficulty::Easy, 120.0, &[(0, 0), (384, 1), (384, 2)]);
        assert_eq!(out, vec![Line::data(0, "N 0 0")]);
    }

    #[test]
    fn test_medium_drums_fast_tempo_drops_on_beat() {
        let list = [(0, 0), (192, 1), (192, 4), (192, 0), (384, 4)];
        let slow = drums(Difficulty::Medium, 150.0, &list);
        assert_eq!(
            slow,
            vec![
                Line::data(0, "N 0 0"),
                Line::data(192, "N 1 0"),
                Line::data(192, "N 3 0"),
                Line::data(384, "N 3 0"),
            ]
        );

        // Above 150 BPM only the downbeat survives on-beat
        let fast = drums(Difficulty::Medium, 150.5, &list);
        assert_eq!(
            fast,
            vec![
                Line::data(0, "N 0 0"),
                Line::data(192, "N 1 0"),
                Line::data(192, "N 3 0"),
            ]
        );
    }

    #[test]
    fn test_hard_drums_on_beat_kick_plus_hand() {
        let out = drums(Difficulty::Hard, 120.0, &[(0, 2), (0, 3), (0, 0)]);
        assert_eq!(out, vec![Line::data(0, "N 0 0"), Line::data(0, "N 2 0")]);
    }

    #[test]
    fn test_hard_drums_off_beat_drops_kick_from_big_chords() {
        let out = drums(
            Difficulty::Hard,
            120.0,
            &[(0, 0), (192, 0), (192, 1), (192, 2), (576, 0), (576, 4)],
        );
        assert_eq!(
            out,
            vec![
                Line::data(0, "N 0 0"),
                Line::data(192, "N 1 0"),
                Line::data(192, "N 2 0"),
                Line::data(576, "N 0 0"),
                Line::data(576, "N 4 0"),
            ]
        );
    }

    #[test]
    fn test_hard_drums_skip_half_beats() {
        // No half-beat forcing for drums
        let out = drums(Difficulty::Hard, 120.0, &[(0, 0), (96, 1)]);
        assert_eq!(out, vec![Line::data(0, "N 0 0")]);
    }
}
