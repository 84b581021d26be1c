//! Per-chart generation job
//!
//! A job walks four steps: find the chart file in its folder, generate the
//! new tier, back up the original file, then save the result. The step
//! counter survives failures, so retrying an errored job resumes at the
//! step that failed. Cancellation is observed only between steps.
//!
//! A job reports progress itself. How it ended is reported by whoever owns
//! it, once that owner has recorded the outcome; see [`JobOutcome::event`].

mod events;
mod fs;

pub use events::{CancelToken, EventSender, JobEvent, JobKey};
pub use fs::{ChartFs, LocalFs};

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chart::{self, Difficulty, TempoMap};
use crate::config::{GenerationOptions, MIDI_CHART_EXTENSIONS, TEXT_CHART_EXTENSIONS};
use crate::downgrade::downgrade;
use crate::error::{Error, JobError, Result};
use crate::midi;

/// Step a job will run next
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum JobStep {
    FindFile,
    Generate,
    Backup,
    Save,
    Done,
}

impl JobStep {
    /// Number of working steps
    pub const COUNT: u8 = 4;

    /// Position in the pipeline, 0 through 4
    pub fn index(&self) -> u8 {
        *self as u8
    }

    fn next(self) -> Self {
        match self {
            Self::FindFile => Self::Generate,
            Self::Generate => Self::Backup,
            Self::Backup => Self::Save,
            Self::Save | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for JobStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindFile => write!(f, "Finding chart file"),
            Self::Generate => write!(f, "Generating track"),
            Self::Backup => write!(f, "Backing up original chart"),
            Self::Save => write!(f, "Saving chart"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// All steps finished; the chart was written here
    Done(PathBuf),
    /// Cancellation was observed at a step boundary
    Canceled,
    /// A step failed; the job stays at that step
    Failed(JobError),
}

impl JobOutcome {
    /// The terminal event announcing this outcome for `key`
    pub fn event(&self, key: &JobKey) -> JobEvent {
        let key = key.clone();
        match self {
            Self::Done(output_path) => JobEvent::Done {
                key,
                output_path: output_path.clone(),
            },
            Self::Canceled => JobEvent::Canceled { key },
            Self::Failed(error) => JobEvent::Error {
                key,
                error: error.clone(),
            },
        }
    }
}

/// What kind of file a job is working from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Text,
    Midi,
}

impl SourceKind {
    /// Classify a path by extension; `None` if it is not a chart source
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if TEXT_CHART_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Text)
        } else if MIDI_CHART_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Midi)
        } else {
            None
        }
    }
}

/// A queued request to generate one tier of one instrument in one folder
#[derive(Debug, Clone)]
pub struct GenerationJob {
    key: JobKey,
    step: JobStep,
    cancel: CancelToken,
    source: Option<PathBuf>,
    content: Option<String>,
}

impl GenerationJob {
    /// Create a job that has not started yet
    pub fn new(key: JobKey) -> Self {
        Self {
            key,
            step: JobStep::FindFile,
            cancel: CancelToken::new(),
            source: None,
            content: None,
        }
    }

    pub fn key(&self) -> &JobKey {
        &self.key
    }

    /// The step that will run next
    pub fn step(&self) -> JobStep {
        self.step
    }

    /// Chart file found by the first step
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Generated chart text, once the Generate step has run
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// Request cancellation and drop anything loaded so far
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.discard();
    }

    fn discard(&mut self) {
        self.content = None;
    }

    /// Run the remaining steps.
    ///
    /// Each step runs only if the job was not canceled before it began, and
    /// cancellation is checked again right after it. Only progress is sent
    /// on `events`; errors come back as [`JobOutcome::Failed`].
    pub fn run(
        &mut self,
        fs: &dyn ChartFs,
        options: &GenerationOptions,
        events: &EventSender,
    ) -> JobOutcome {
        info!(job = %self.key, step = ?self.step, "starting generation job");

        while self.step != JobStep::Done {
            if self.is_canceled() {
                return self.canceled();
            }

            let step = self.step;
            self.emit_progress(events, step);
            debug!(job = %self.key, ?step, "running step");

            let result = match step {
                JobStep::FindFile => self.find_file(fs),
                JobStep::Generate => self.generate(fs, options),
                JobStep::Backup => self.backup(fs, options),
                JobStep::Save => self.save(fs, options),
                JobStep::Done => Ok(()),
            };

            if let Err(e) = result {
                if matches!(e, Error::Canceled) {
                    return self.canceled();
                }
                let error = JobError::from(&e);
                warn!(job = %self.key, ?step, "generation failed: {}", error);
                return JobOutcome::Failed(error);
            }

            self.step = step.next();
            if self.step != JobStep::Done && self.is_canceled() {
                return self.canceled();
            }
        }

        let output_path = self.output_path(options);
        info!(job = %self.key, path = %output_path.display(), "generation complete");
        JobOutcome::Done(output_path)
    }

    fn canceled(&mut self) -> JobOutcome {
        info!(job = %self.key, step = ?self.step, "generation canceled");
        self.discard();
        JobOutcome::Canceled
    }

    fn emit_progress(&self, events: &EventSender, step: JobStep) {
        let percent = match step {
            JobStep::FindFile => None,
            _ => Some(f32::from(step.index()) / f32::from(JobStep::COUNT) * 100.0),
        };
        let _ = events.send(JobEvent::Progress {
            key: self.key.clone(),
            header: format!(
                "Generating {} {}",
                self.key.difficulty, self.key.instrument
            ),
            body: step.to_string(),
            percent,
        });
    }

    fn output_path(&self, options: &GenerationOptions) -> PathBuf {
        self.key.folder.join(&options.output_file_name)
    }

    fn backup_path(source: &Path, options: &GenerationOptions) -> PathBuf {
        let mut name: OsString = source.file_name().unwrap_or_default().to_os_string();
        name.push(&options.backup_suffix);
        source.with_file_name(name)
    }

    fn find_file(&mut self, fs: &dyn ChartFs) -> Result<()> {
        let mut candidates: Vec<PathBuf> = fs
            .list_files(&self.key.folder)?
            .into_iter()
            .filter(|p| SourceKind::from_path(p).is_some())
            .collect();

        match candidates.len() {
            0 => Err(Error::FileSelection("No chart file found".to_string())),
            1 => {
                self.source = candidates.pop();
                Ok(())
            }
            _ => Err(Error::FileSelection(
                "Multiple chart files found".to_string(),
            )),
        }
    }

    fn generate(&mut self, fs: &dyn ChartFs, options: &GenerationOptions) -> Result<()> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| Error::Other("no chart file selected".to_string()))?;
        let bytes = fs.read(&source)?;

        let text = match SourceKind::from_path(&source) {
            Some(SourceKind::Midi) => midi::convert(&bytes, &options.conversion)?,
            _ => String::from_utf8(bytes)
                .map_err(|e| Error::format(format!("chart file is not valid UTF-8: {}", e)))?,
        };

        let mut doc = chart::parse(&text)?;
        let resolution = doc.resolution();
        if resolution == 0 {
            return Err(Error::MissingResolution);
        }
        let tempo = TempoMap::from_document(&doc);

        let instrument = self.key.instrument;
        let target = self.key.difficulty;
        let expert_name = instrument.section_name(Difficulty::Expert);
        let expert = doc.section(&expert_name).ok_or_else(|| Error::TrackNotFound {
            section: expert_name.clone(),
        })?;

        let lines = downgrade(expert, instrument, target, &tempo, resolution);
        let anchor = Difficulty::ALL
            .into_iter()
            .filter(|d| *d > target)
            .map(|d| instrument.section_name(d))
            .find(|name| doc.has_section(name))
            .unwrap_or(expert_name);
        doc.insert_section_before(&anchor, instrument.section_name(target), lines);

        self.content = Some(chart::serialize(&doc));
        Ok(())
    }

    fn backup(&mut self, fs: &dyn ChartFs, options: &GenerationOptions) -> Result<()> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| Error::Other("no chart file selected".to_string()))?;
        let backup = Self::backup_path(source, options);

        if fs.exists(&backup) {
            debug!(path = %backup.display(), "backup already exists, keeping it");
            return Ok(());
        }
        fs.rename(source, &backup)
    }

    fn save(&mut self, fs: &dyn ChartFs, options: &GenerationOptions) -> Result<()> {
        let content = self
            .content
            .as_deref()
            .ok_or_else(|| Error::Other("nothing was generated".to_string()))?;
        fs.write(&self.output_path(options), content.as_bytes())
    }
}
