//! Text cues kept when converting the EVENTS track

/// Venue cues: lighting, crowd and band directions
const VENUE_EVENTS: &[&str] = &[
    "lighting ()",
    "lighting (blackout)",
    "lighting (chase)",
    "lighting (color1)",
    "lighting (color2)",
    "lighting (flare)",
    "lighting (strobe)",
    "lighting (sweep)",
    "crowd_lighters_fast",
    "crowd_lighters_off",
    "crowd_lighters_slow",
    "crowd_half_tempo",
    "crowd_normal_tempo",
    "crowd_double_tempo",
    "band_jump",
    "sync_head_bang",
    "sync_wag",
];

/// Gameplay cues
const STANDARD_EVENTS: &[&str] = &[
    "idle",
    "play",
    "solo",
    "soloend",
    "wail_on",
    "wail_off",
    "ow_face_on",
    "ow_face_off",
    "half_tempo",
    "normal_tempo",
    "whammy_on",
    "whammy_off",
    "music_start",
    "music_end",
    "coda",
    "end",
];

/// Map a raw EVENTS-track text to the chart event text, or `None` if the
/// cue is not one the chart format carries
pub fn chart_event(raw: &str) -> Option<String> {
    let inner = raw
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(raw.trim())
        .trim();

    if inner.starts_with("section ") {
        return Some(inner.to_string());
    }
    if VENUE_EVENTS
        .iter()
        .chain(STANDARD_EVENTS)
        .any(|known| *known == inner)
    {
        return Some(inner.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_cues_pass() {
        assert_eq!(chart_event("[idle]").as_deref(), Some("idle"));
        assert_eq!(chart_event("crowd_lighters_fast").as_deref(), Some("crowd_lighters_fast"));
        assert_eq!(
            chart_event("[section Guitar Solo]").as_deref(),
            Some("section Guitar Solo")
        );
    }

    #[test]
    fn test_unknown_cues_are_dropped() {
        assert_eq!(chart_event("[prc_verse_1]"), None);
        assert_eq!(chart_event("hello"), None);
        assert_eq!(chart_event("[sectionless]"), None);
    }
}
