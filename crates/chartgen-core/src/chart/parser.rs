//! Character-level scanner and serializer for the chart text format

use super::{ChartDocument, Line};
use crate::error::{Error, Result};

/// Scanner state while walking the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between sections
    Outside,
    /// Between `[` and `]`
    SectionName { start: usize },
    /// After `{`, waiting for `}`
    Body { start: usize },
}

/// Parse chart text into a document.
///
/// Once an `=` is seen the rest of that line is skipped for structural
/// characters, so brackets and braces inside values (song names, lyrics,
/// text events) are never taken as section boundaries.
pub fn parse(text: &str) -> Result<ChartDocument> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut doc = ChartDocument::new();
    let mut state = State::Outside;
    let mut pending_name: Option<&str> = None;
    let mut in_value = false;

    for (idx, ch) in text.char_indices() {
        if in_value {
            if ch == '\n' {
                in_value = false;
            }
            continue;
        }

        match state {
            State::SectionName { start } => match ch {
                ']' => {
                    pending_name = Some(&text[start..idx]);
                    state = State::Outside;
                }
                '\n' => {
                    return Err(Error::format(format!(
                        "newline inside section name at byte {}",
                        idx
                    )));
                }
                _ => {}
            },
            State::Outside => match ch {
                '[' => state = State::SectionName { start: idx + 1 },
                '{' => {
                    if pending_name.is_none() {
                        return Err(Error::format(format!(
                            "'{{' without a section name at byte {}",
                            idx
                        )));
                    }
                    state = State::Body { start: idx + 1 };
                }
                '}' => {
                    return Err(Error::format(format!("unmatched '}}' at byte {}", idx)));
                }
                '=' => in_value = true,
                _ => {}
            },
            State::Body { start } => match ch {
                '}' => {
                    let name = pending_name.take().unwrap_or_default();
                    let lines = text[start..idx]
                        .split('\n')
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(Line::parse)
                        .collect();
                    doc.set_section(name.trim(), lines);
                    state = State::Outside;
                }
                '=' => in_value = true,
                _ => {}
            },
        }
    }

    match state {
        State::Outside => Ok(doc),
        State::SectionName { .. } => Err(Error::format("unterminated section name")),
        State::Body { .. } => Err(Error::format("unterminated section body")),
    }
}

/// Serialize a document back to chart text
pub fn serialize(doc: &ChartDocument) -> String {
    let mut out = String::new();
    for (name, lines) in doc.sections() {
        out.push('[');
        out.push_str(name);
        out.push_str("]\n{\n");
        for line in lines {
            out.push_str("  ");
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out.push_str("}\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "[Song]\n{\n  Name = \"Test [Live] {Remix}\"\n  Resolution = 192\n}\n[SyncTrack]\n{\n  0 = TS 4\n  0 = B 120000\n}\n[Events]\n{\n  0 = E \"section [Intro]\"\n}\n[ExpertSingle]\n{\n  0 = N 0 0\n  192 = N 4 96\n  192 = S 2 384\n}\n";

    #[test]
    fn test_round_trip_is_exact_for_normalized_text() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(serialize(&doc), SAMPLE);
    }

    #[test]
    fn test_round_trip_normalizes_whitespace_only() {
        let messy = "\u{feff}[Song]\r\n{\r\n\tResolution = 192\r\n\r\n}\r\n\r\n[ExpertSingle]\n{\n    0 = N 0 0   \n}";
        let doc = parse(messy).unwrap();
        assert_eq!(
            serialize(&doc),
            "[Song]\n{\n  Resolution = 192\n}\n[ExpertSingle]\n{\n  0 = N 0 0\n}\n"
        );
    }

    #[test]
    fn test_values_containing_structure_are_not_structure() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.len(), 4);
        assert_eq!(
            doc.header_value("Song", "Name"),
            Some("Test [Live] {Remix}")
        );
        assert_eq!(
            doc.section("Events").unwrap()[0],
            Line::data(0, "E \"section [Intro]\"")
        );
    }

    #[test]
    fn test_redeclared_section_overwrites() {
        let text = "[A]\n{\n  0 = N 0 0\n}\n[B]\n{\n}\n[A]\n{\n  1 = N 1 0\n}\n";
        let doc = parse(text).unwrap();
        let names: Vec<_> = doc.section_names().collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(doc.section("A").unwrap(), &[Line::data(1, "N 1 0")]);
        assert!(doc.section("B").unwrap().is_empty());
    }

    #[test]
    fn test_unmatched_close_brace_is_fatal() {
        let err = parse("}\n[Song]\n{\n}\n").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));

        let err = parse("[Song]\n{\n}\n}\n").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn test_newline_in_section_name_is_fatal() {
        let err = parse("[Son\ng]\n{\n}\n").unwrap_err();
        assert!(err.to_string().contains("newline inside section name"));
    }

    #[test]
    fn test_unterminated_section() {
        assert!(parse("[Song]\n{\n  Resolution = 192\n").is_err());
        assert!(parse("[Song").is_err());
    }

    #[test]
    fn test_empty_input() {
        let doc = parse("").unwrap();
        assert!(doc.is_empty());
        assert_eq!(serialize(&doc), "");
    }
}
