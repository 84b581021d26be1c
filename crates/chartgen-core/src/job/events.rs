//! Notifications and cancellation shared between jobs and their owner

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chart::{Difficulty, Instrument};
use crate::error::JobError;

/// Identity of a generation request; two requests with the same key are the
/// same job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub folder: PathBuf,
    pub instrument: Instrument,
    pub difficulty: Difficulty,
}

impl JobKey {
    pub fn new(folder: impl Into<PathBuf>, instrument: Instrument, difficulty: Difficulty) -> Self {
        Self {
            folder: folder.into(),
            instrument,
            difficulty,
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.difficulty,
            self.instrument,
            self.folder.display()
        )
    }
}

/// Event emitted while jobs run
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// Step started; `percent` is `None` when progress is indeterminate
    Progress {
        key: JobKey,
        header: String,
        body: String,
        percent: Option<f32>,
    },
    /// Job failed and was moved to the error list
    Error { key: JobKey, error: JobError },
    /// Job finished and wrote `output_path`
    Done { key: JobKey, output_path: PathBuf },
    /// Job was removed from the queue
    Canceled { key: JobKey },
}

impl JobEvent {
    /// The job this event belongs to
    pub fn key(&self) -> &JobKey {
        match self {
            Self::Progress { key, .. }
            | Self::Error { key, .. }
            | Self::Done { key, .. }
            | Self::Canceled { key } => key,
        }
    }
}

/// Channel end that receives [`JobEvent`]s
pub type EventSender = Sender<JobEvent>;

/// Cooperative cancellation flag, checked at step boundaries
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_canceled());
        token.cancel();
        assert!(clone.is_canceled());
    }

    #[test]
    fn test_key_equality() {
        let a = JobKey::new("/songs/a", Instrument::Guitar, Difficulty::Easy);
        let b = JobKey::new("/songs/a", Instrument::Guitar, Difficulty::Easy);
        let c = JobKey::new("/songs/a", Instrument::Guitar, Difficulty::Hard);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(JobEvent::Canceled { key: a.clone() }.key(), &b);
    }
}
