//! Error types for chartgen-core

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for chart generation operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed chart: {message}")]
    Format { message: String },

    #[error("{0}")]
    Conversion(String),

    #[error("Failed to decode MIDI file: {0}")]
    Midi(String),

    #[error("{0}")]
    FileSelection(String),

    #[error("Chart has no [{section}] section")]
    TrackNotFound { section: String },

    #[error("Chart has no Resolution in its [Song] section")]
    MissingResolution,

    #[error("Generation canceled")]
    Canceled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a chart format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }
}

impl From<midly::Error> for Error {
    fn from(e: midly::Error) -> Self {
        Self::Midi(e.to_string())
    }
}

/// Result type alias for chartgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// A user-facing error surfaced by a generation job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    /// Short title, e.g. "Chart File Error"
    pub header: String,
    /// Human-readable detail
    pub body: String,
}

impl JobError {
    pub fn new(header: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            body: body.into(),
        }
    }
}

impl From<&Error> for JobError {
    fn from(e: &Error) -> Self {
        let header = match e {
            Error::Format { .. } | Error::TrackNotFound { .. } | Error::MissingResolution => {
                "Chart Format Error"
            }
            Error::Conversion(_) | Error::Midi(_) => "MIDI Conversion Error",
            Error::FileSelection(_) => "Chart File Error",
            _ => "Unknown Error",
        };
        Self::new(header, e.to_string())
    }
}

impl From<Error> for JobError {
    fn from(e: Error) -> Self {
        Self::from(&e)
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.header, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_error_classification() {
        let err = JobError::from(Error::FileSelection("Multiple chart files found".into()));
        assert_eq!(err.header, "Chart File Error");
        assert_eq!(err.body, "Multiple chart files found");

        let err = JobError::from(Error::format("unmatched '}'"));
        assert_eq!(err.header, "Chart Format Error");

        let err = JobError::from(Error::Conversion("no guitar".into()));
        assert_eq!(err.header, "MIDI Conversion Error");

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = JobError::from(Error::from(io));
        assert_eq!(err.header, "Unknown Error");
        assert!(err.body.contains("denied"));
    }
}
