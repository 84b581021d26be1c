//! Activity log for tracking generation history
//!
//! Provides a persistent log of recent generations, conversions, errors and
//! cancellations.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::job::JobEvent;

/// Maximum number of log entries to keep
pub const MAX_LOG_ENTRIES: usize = 50;

/// Type of activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    /// A tier was generated and saved
    Generate,
    /// A MIDI file was converted on its own
    Convert,
    /// A job was canceled
    Canceled,
    /// Error occurred
    Error,
    /// Info message
    Info,
}

impl ActivityType {
    /// Get the display name for this activity type
    pub fn display_name(&self) -> &'static str {
        match self {
            ActivityType::Generate => "Generate",
            ActivityType::Convert => "Convert",
            ActivityType::Canceled => "Canceled",
            ActivityType::Error => "Error",
            ActivityType::Info => "Info",
        }
    }
}

/// A single activity log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Timestamp of the activity
    pub timestamp: DateTime<Local>,
    /// Type of activity
    pub activity_type: ActivityType,
    /// Description of what happened
    pub description: String,
    /// Additional details (optional)
    pub details: Option<String>,
}

impl ActivityEntry {
    /// Create a new activity entry with the current timestamp
    pub fn new(activity_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            activity_type,
            description: description.into(),
            details: None,
        }
    }

    /// Create a new activity entry with details
    pub fn with_details(
        activity_type: ActivityType,
        description: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(activity_type, description)
        }
    }

    /// Entry for a terminal job event; progress events have none
    pub fn from_event(event: &JobEvent) -> Option<Self> {
        let key = event.key();
        let entry = match event {
            JobEvent::Progress { .. } => return None,
            JobEvent::Done { output_path, .. } => Self::with_details(
                ActivityType::Generate,
                format!("Generated {}", key),
                output_path.display().to_string(),
            ),
            JobEvent::Error { error, .. } => Self::with_details(
                ActivityType::Error,
                format!("{} failed", key),
                error.to_string(),
            ),
            JobEvent::Canceled { .. } => {
                Self::new(ActivityType::Canceled, format!("Canceled {}", key))
            }
        };
        Some(entry)
    }

    /// Format the full timestamp with date
    pub fn formatted_datetime(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Activity log manager
#[derive(Debug, Default)]
pub struct ActivityLog {
    /// In-memory log entries (most recent first)
    entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    /// Create a new empty activity log
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the log file path
    pub fn log_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chartgen").join("activity.log"))
    }

    /// Load activity log from the default location
    pub fn load() -> Self {
        Self::log_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load activity log from a file; unreadable lines are skipped
    pub fn load_from(path: &Path) -> Self {
        let mut log = Self::new();
        if let Ok(file) = File::open(path) {
            let reader = BufReader::new(file);
            log.entries = reader
                .lines()
                .map_while(Result::ok)
                .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
                .take(MAX_LOG_ENTRIES)
                .collect();
        }
        log
    }

    /// Save activity log to the default location
    pub fn save(&self) -> std::io::Result<()> {
        match Self::log_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    /// Save activity log to a file, one JSON entry per line
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        for entry in self.entries.iter().take(MAX_LOG_ENTRIES) {
            let json = serde_json::to_string(entry).map_err(std::io::Error::other)?;
            writeln!(file, "{}", json)?;
        }
        Ok(())
    }

    /// Add a new entry to the log
    pub fn add(&mut self, entry: ActivityEntry) {
        // Most recent first
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_LOG_ENTRIES);
    }

    /// Add a simple log entry
    pub fn log(&mut self, activity_type: ActivityType, description: impl Into<String>) {
        self.add(ActivityEntry::new(activity_type, description));
    }

    /// Add a log entry with details
    pub fn log_with_details(
        &mut self,
        activity_type: ActivityType,
        description: impl Into<String>,
        details: impl Into<String>,
    ) {
        self.add(ActivityEntry::with_details(activity_type, description, details));
    }

    /// Record a job event if it ends a job
    pub fn record(&mut self, event: &JobEvent) {
        if let Some(entry) = ActivityEntry::from_event(event) {
            self.add(entry);
        }
    }

    /// Get all entries
    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    /// Get the most recent N entries
    pub fn recent(&self, count: usize) -> &[ActivityEntry] {
        &self.entries[..count.min(self.entries.len())]
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
