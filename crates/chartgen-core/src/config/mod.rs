//! Configuration for chart generation

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::midi::ConversionOptions;

/// File extensions recognised as chart sources (lowercase, without dot)
pub const TEXT_CHART_EXTENSIONS: &[&str] = &["chart"];
/// File extensions decoded as binary sequences
pub const MIDI_CHART_EXTENSIONS: &[&str] = &["mid", "midi"];

/// Configuration for chartgen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File written into the chart folder after generation
    pub output_file_name: String,
    /// Appended to the source file name when it is backed up
    pub backup_suffix: String,
    /// Song name used when a MIDI file names no track
    pub placeholder_title: String,
    /// Drop empty sections when converting MIDI
    pub omit_empty_sections: bool,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_file_name: "notes.chart".to_string(),
            backup_suffix: ".original".to_string(),
            placeholder_title: "Untitled".to_string(),
            omit_empty_sections: true,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chartgen").join("config.json"))
    }

    /// Load config from disk, falling back to defaults if not found
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load config from a file; a missing or malformed file yields defaults
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Save config to disk
    pub fn save(&self) -> std::io::Result<()> {
        match Self::config_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    /// Save config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, content)
    }

    /// Options handed to each generation job
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            output_file_name: self.output_file_name.clone(),
            backup_suffix: self.backup_suffix.clone(),
            conversion: ConversionOptions {
                placeholder_title: self.placeholder_title.clone(),
                omit_empty_sections: self.omit_empty_sections,
            },
        }
    }
}

/// Immutable settings for a generation job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub output_file_name: String,
    pub backup_suffix: String,
    pub conversion: ConversionOptions,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Config::default().generation_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "backup_suffix": ".bak" }"#).unwrap();
        assert_eq!(config.backup_suffix, ".bak");
        assert_eq!(config.output_file_name, "notes.chart");
        assert!(config.omit_empty_sections);
    }

    #[test]
    fn test_generation_options() {
        let config = Config {
            placeholder_title: "Demo".into(),
            omit_empty_sections: false,
            ..Default::default()
        };
        let options = config.generation_options();
        assert_eq!(options.conversion.placeholder_title, "Demo");
        assert!(!options.conversion.omit_empty_sections);
        assert_eq!(options.backup_suffix, ".original");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chartgen").join("config.json");
        assert_eq!(Config::load_from(&path), Config::default());

        let config = Config {
            backup_suffix: ".bak".into(),
            log_level: "debug".into(),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }
}
