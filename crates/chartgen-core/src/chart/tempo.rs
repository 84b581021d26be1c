//! Tempo and time-signature lookup over a chart's `[SyncTrack]`

use super::{ChartDocument, Line, SYNC_TRACK_SECTION};

/// A tempo change; `B` lines store beats-per-minute times 1000
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmEvent {
    pub tick: u32,
    pub beats_per_minute: f64,
}

/// A time-signature change; only the numerator matters for beat placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignatureEvent {
    pub tick: u32,
    pub numerator: u32,
}

/// Step-function view of tempo and meter.
///
/// Events are kept in the order they appear in the chart. Charts list them
/// in ascending tick order; input with decreasing ticks gives unspecified
/// lookups and is not reordered here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempoMap {
    bpms: Vec<BpmEvent>,
    time_signatures: Vec<TimeSignatureEvent>,
}

impl TempoMap {
    /// Create an empty tempo map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the document's `[SyncTrack]`; a missing section yields an
    /// empty map
    pub fn from_document(doc: &ChartDocument) -> Self {
        doc.section(SYNC_TRACK_SECTION)
            .map(Self::from_lines)
            .unwrap_or_default()
    }

    /// Build from raw sync-track lines, ignoring anything unrecognized
    pub fn from_lines(lines: &[Line]) -> Self {
        let mut map = Self::new();
        for line in lines {
            let Line::Data { tick, payload } = line else {
                continue;
            };
            let mut parts = payload.split_whitespace();
            let kind = parts.next();
            let value = parts.next().and_then(|v| v.parse::<u64>().ok());
            match (kind, value) {
                (Some("B"), Some(milli_bpm)) => map.push_bpm(*tick, milli_bpm as f64 / 1000.0),
                (Some("TS"), Some(numerator)) => {
                    // Numerators past u32 are not a usable meter
                    if let Ok(numerator) = u32::try_from(numerator) {
                        map.push_time_signature(*tick, numerator);
                    }
                }
                _ => {}
            }
        }
        map
    }

    /// Append a tempo change
    pub fn push_bpm(&mut self, tick: u32, beats_per_minute: f64) {
        self.bpms.push(BpmEvent {
            tick,
            beats_per_minute,
        });
    }

    /// Append a time-signature change
    pub fn push_time_signature(&mut self, tick: u32, numerator: u32) {
        self.time_signatures
            .push(TimeSignatureEvent { tick, numerator });
    }

    pub fn bpm_events(&self) -> &[BpmEvent] {
        &self.bpms
    }

    pub fn time_signature_events(&self) -> &[TimeSignatureEvent] {
        &self.time_signatures
    }

    /// Tempo in effect at `tick`: the last change not after it
    pub fn bpm_at(&self, tick: u32) -> Option<f64> {
        last_not_after(&self.bpms, tick, |e| e.tick).map(|e| e.beats_per_minute)
    }

    /// Time-signature numerator in effect at `tick`
    pub fn time_signature_numerator_at(&self, tick: u32) -> Option<u32> {
        self.time_signature_at(tick).map(|e| e.numerator)
    }

    fn time_signature_at(&self, tick: u32) -> Option<&TimeSignatureEvent> {
        last_not_after(&self.time_signatures, tick, |e| e.tick)
    }

    /// Position of `tick` within its measure, in beats (not rounded).
    ///
    /// Measured from the tick of the active time signature, modulo its
    /// numerator. Without a time signature (numerator 0) or with a zero
    /// resolution the result is 0.
    pub fn beat_within_measure(&self, tick: u32, resolution: u32) -> f64 {
        let (anchor, numerator) = self
            .time_signature_at(tick)
            .map_or((0, 0), |e| (e.tick, e.numerator));
        if numerator == 0 || resolution == 0 {
            return 0.0;
        }
        let beats = f64::from(tick - anchor) / f64::from(resolution);
        beats % f64::from(numerator)
    }
}

fn last_not_after<T>(events: &[T], tick: u32, tick_of: impl Fn(&T) -> u32) -> Option<&T> {
    let mut found = None;
    for event in events {
        if tick_of(event) <= tick {
            found = Some(event);
        } else {
            break;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TempoMap {
        TempoMap::from_lines(&[
            Line::data(0, "TS 4"),
            Line::data(0, "B 120000"),
            Line::data(768, "B 180500"),
            Line::data(1536, "TS 3 2"),
            Line::data(2000, "A 500000"),
        ])
    }

    #[test]
    fn test_step_lookup() {
        let map = sample();
        assert_eq!(map.bpm_at(0), Some(120.0));
        assert_eq!(map.bpm_at(767), Some(120.0));
        assert_eq!(map.bpm_at(768), Some(180.5));
        assert_eq!(map.bpm_at(100_000), Some(180.5));

        assert_eq!(map.time_signature_numerator_at(1535), Some(4));
        assert_eq!(map.time_signature_numerator_at(1536), Some(3));
    }

    #[test]
    fn test_oversized_numerator_is_ignored() {
        let map = TempoMap::from_lines(&[
            Line::data(0, "TS 4"),
            Line::data(768, "TS 4294967297"),
            Line::data(1536, "TS 4294967295"),
        ]);
        assert_eq!(map.time_signature_numerator_at(768), Some(4));
        assert_eq!(map.time_signature_numerator_at(1536), Some(u32::MAX));
    }

    #[test]
    fn test_lookup_before_first_event_is_none() {
        let mut map = TempoMap::new();
        map.push_bpm(192, 100.0);
        map.push_time_signature(192, 4);
        assert_eq!(map.bpm_at(191), None);
        assert_eq!(map.time_signature_numerator_at(0), None);
        assert_eq!(map.bpm_at(192), Some(100.0));
    }

    #[test]
    fn test_lookup_is_monotonic() {
        let map = sample();
        let ticks = [0u32, 100, 767, 768, 769, 1536, 5000];
        let mut last = None;
        for tick in ticks {
            let bpm = map.bpm_at(tick);
            if let (Some(prev), Some(cur)) = (last, bpm) {
                let prev_idx = map.bpm_events().iter().position(|e| e.beats_per_minute == prev);
                let cur_idx = map.bpm_events().iter().position(|e| e.beats_per_minute == cur);
                assert!(cur_idx >= prev_idx);
            }
            last = bpm;
        }
    }

    #[test]
    fn test_beat_within_measure() {
        let map = sample();
        assert_eq!(map.beat_within_measure(0, 192), 0.0);
        assert_eq!(map.beat_within_measure(192, 192), 1.0);
        assert_eq!(map.beat_within_measure(96, 192), 0.5);
        assert_eq!(map.beat_within_measure(768, 192), 0.0);
        assert_eq!(map.beat_within_measure(960, 192), 1.0);
        // 3/4 anchored at 1536
        assert_eq!(map.beat_within_measure(1536 + 192 * 3, 192), 0.0);
        assert_eq!(map.beat_within_measure(1536 + 192 * 5, 192), 2.0);
    }

    #[test]
    fn test_beat_without_time_signature_is_zero() {
        let map = TempoMap::new();
        assert_eq!(map.beat_within_measure(333, 192), 0.0);
        assert_eq!(sample().beat_within_measure(333, 0), 0.0);
    }
}
