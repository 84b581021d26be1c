//! Instrument/difficulty identity of note tracks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A playable note: `tick = N lane sustain`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub tick: u32,
    pub lane: u32,
    pub sustain: u32,
}

/// A phrase marker: `tick = S lane sustain` (star power, battle phrases)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialEvent {
    pub tick: u32,
    pub lane: u32,
    pub sustain: u32,
}

/// Difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// All tiers, easiest first
    pub const ALL: [Difficulty; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Expert];

    /// Tiers that can be generated from Expert
    pub const GENERATED: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Prefix used in section names
    pub fn name(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Expert => "Expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" | "e" => Ok(Self::Easy),
            "medium" | "m" => Ok(Self::Medium),
            "hard" | "h" => Ok(Self::Hard),
            "expert" | "x" => Ok(Self::Expert),
            _ => Err(format!(
                "Invalid difficulty '{}'. Use: easy, medium, hard, or expert",
                s
            )),
        }
    }
}

/// Instrument whose tracks can be generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Guitar,
    GuitarCoop,
    Bass,
    Rhythm,
    Drums,
    Keys,
}

impl Instrument {
    /// Instruments in the order their sections are written
    pub const ALL: [Instrument; 6] = [
        Self::Guitar,
        Self::GuitarCoop,
        Self::Bass,
        Self::Rhythm,
        Self::Drums,
        Self::Keys,
    ];

    /// Suffix appended to the difficulty name to form the section name
    pub fn section_suffix(&self) -> &'static str {
        match self {
            Self::Guitar => "Single",
            Self::GuitarCoop => "DoubleGuitar",
            Self::Bass => "DoubleBass",
            Self::Rhythm => "DoubleRhythm",
            Self::Drums => "Drums",
            Self::Keys => "Keyboard",
        }
    }

    /// Section holding this instrument's notes at `difficulty`
    pub fn section_name(&self, difficulty: Difficulty) -> String {
        format!("{}{}", difficulty.name(), self.section_suffix())
    }

    /// Drums use their own reduction rules; everything else is fretted
    pub fn is_drums(&self) -> bool {
        matches!(self, Self::Drums)
    }

    /// Get user-friendly label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Guitar => "Guitar",
            Self::GuitarCoop => "Guitar (Co-op)",
            Self::Bass => "Bass",
            Self::Rhythm => "Rhythm",
            Self::Drums => "Drums",
            Self::Keys => "Keys",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "guitar" | "single" | "lead" => Ok(Self::Guitar),
            "coop" | "guitar-coop" | "doubleguitar" => Ok(Self::GuitarCoop),
            "bass" | "doublebass" => Ok(Self::Bass),
            "rhythm" | "doublerhythm" => Ok(Self::Rhythm),
            "drums" => Ok(Self::Drums),
            "keys" | "keyboard" => Ok(Self::Keys),
            _ => Err(format!(
                "Invalid instrument '{}'. Use: guitar, coop, bass, rhythm, drums, or keys",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_names() {
        assert_eq!(Instrument::Guitar.section_name(Difficulty::Expert), "ExpertSingle");
        assert_eq!(Instrument::Drums.section_name(Difficulty::Easy), "EasyDrums");
        assert_eq!(
            Instrument::Rhythm.section_name(Difficulty::Hard),
            "HardDoubleRhythm"
        );
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Guitar".parse::<Instrument>(), Ok(Instrument::Guitar));
        assert_eq!("keyboard".parse::<Instrument>(), Ok(Instrument::Keys));
        assert!("tuba".parse::<Instrument>().is_err());
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!(Difficulty::Easy < Difficulty::Expert);
    }
}
