//! # chartgen-core
//!
//! Core library for generating lower difficulty tiers of rhythm-game charts.
//!
//! This crate provides the foundational functionality for:
//! - Parsing and serializing section-based `.chart` text files
//! - Converting MIDI chart files into `.chart` text
//! - Deriving Easy, Medium and Hard note tracks from an Expert track
//! - Running per-folder generation jobs with backup and cancellation
//! - Queueing jobs with deduplication and operator-driven retry
//!
//! ## Modules
//!
//! - [`activity`] - Persistent history of finished jobs
//! - [`chart`] - Chart document model, parser and tempo map
//! - [`config`] - Configuration and generation options
//! - [`downgrade`] - Expert-to-lower-tier note reduction
//! - [`error`] - Error types and Result alias
//! - [`job`] - Generation job state machine
//! - [`midi`] - MIDI to chart conversion
//! - [`queue`] - Job queue and background worker
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::{mpsc, Arc};
//! use chartgen_core::{Config, Difficulty, Instrument, JobKey, LocalFs, QueueWorker};
//!
//! let config = Config::load();
//! let (tx, rx) = mpsc::channel();
//! let worker = QueueWorker::spawn(Arc::new(LocalFs), config.generation_options(), tx);
//!
//! worker.add(JobKey::new("Songs/My Song", Instrument::Guitar, Difficulty::Easy));
//! while let Ok(event) = rx.recv() {
//!     println!("{:?}", event);
//!     if worker.is_idle() {
//!         break;
//!     }
//! }
//! worker.shutdown();
//! ```

// Module declarations
pub mod activity;
pub mod chart;
pub mod config;
pub mod downgrade;
pub mod error;
pub mod job;
pub mod midi;
pub mod queue;

// Re-export key types for convenience

// Error types
pub use error::{Error, JobError, Result};

// Chart model
pub use chart::{ChartDocument, Difficulty, Instrument, Line, TempoMap};

// Configuration
pub use config::{Config, GenerationOptions};

// Conversion and downgrade
pub use downgrade::downgrade;
pub use midi::{convert, ConversionOptions};

// Jobs
pub use job::{
    CancelToken, ChartFs, EventSender, GenerationJob, JobEvent, JobKey, JobOutcome, JobStep,
    LocalFs,
};

// Queue
pub use queue::{JobQueue, QueueEntry, QueueList, QueueWorker};

// Activity log
pub use activity::{ActivityEntry, ActivityLog, ActivityType};
