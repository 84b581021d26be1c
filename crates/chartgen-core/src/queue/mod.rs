//! Job queue
//!
//! Three lists hold admitted jobs: pending (FIFO), retry (operator-requested
//! retries, always scheduled first) and errored. A running job stays at the
//! head of its list; the executor works on a snapshot and hands the result
//! back through [`JobQueue::finish`], matched by admission id.

mod worker;

pub use worker::{QueueWorker, WorkerMessage};

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::JobError;
use crate::job::{EventSender, GenerationJob, JobEvent, JobKey, JobOutcome, JobStep};

/// Admission number assigned by the queue
pub type JobId = u64;

#[derive(Debug, Clone)]
struct QueuedJob {
    id: JobId,
    job: GenerationJob,
    error: Option<JobError>,
}

/// Which list a job is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueList {
    Pending,
    Retry,
    Errored,
}

/// Read-only view of one queued job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    pub key: JobKey,
    pub list: QueueList,
    pub step: JobStep,
    pub active: bool,
    pub error: Option<JobError>,
}

/// Pending, retry and errored jobs
#[derive(Debug, Default)]
pub struct JobQueue {
    pending: VecDeque<QueuedJob>,
    retry: VecDeque<QueuedJob>,
    errored: Vec<QueuedJob>,
    active: Option<JobId>,
    next_id: JobId,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn all(&self) -> impl Iterator<Item = (QueueList, &QueuedJob)> {
        self.retry
            .iter()
            .map(|j| (QueueList::Retry, j))
            .chain(self.pending.iter().map(|j| (QueueList::Pending, j)))
            .chain(self.errored.iter().map(|j| (QueueList::Errored, j)))
    }

    /// Check whether a job with this key is pending, retrying or errored
    pub fn contains(&self, key: &JobKey) -> bool {
        self.all().any(|(_, j)| j.job.key() == key)
    }

    /// Admit a new job. Returns `false` if one with the same key already exists.
    pub fn add(&mut self, key: JobKey) -> bool {
        if self.contains(&key) {
            debug!(job = %key, "job already queued, ignoring");
            return false;
        }
        let id = self.next_id;
        self.next_id += 1;
        info!(job = %key, id, "job queued");
        self.pending.push_back(QueuedJob {
            id,
            job: GenerationJob::new(key),
            error: None,
        });
        true
    }

    /// Move an errored job to the retry list
    pub fn retry(&mut self, key: &JobKey) -> bool {
        let Some(idx) = self.errored.iter().position(|j| j.job.key() == key) else {
            return false;
        };
        let mut queued = self.errored.remove(idx);
        queued.error = None;
        info!(job = %key, step = ?queued.job.step(), "job scheduled for retry");
        self.retry.push_back(queued);
        true
    }

    /// Remove a job from whichever list holds it, canceling it if it is
    /// running. Emits [`JobEvent::Canceled`].
    pub fn remove(&mut self, key: &JobKey, events: &EventSender) -> bool {
        let removed = take_by_key(&mut self.retry, key)
            .or_else(|| take_by_key(&mut self.pending, key))
            .or_else(|| {
                let idx = self.errored.iter().position(|j| j.job.key() == key)?;
                Some(self.errored.remove(idx))
            });
        let Some(mut queued) = removed else {
            return false;
        };

        if self.active == Some(queued.id) {
            info!(job = %key, "canceling running job");
            self.active = None;
        } else {
            info!(job = %key, "job removed");
        }
        queued.job.cancel();
        let _ = events.send(JobEvent::Canceled { key: key.clone() });
        true
    }

    /// Pick the next job to run: the head of the retry list, else the head
    /// of the pending list. Returns `None` while a job is running.
    pub fn next_job(&mut self) -> Option<(JobId, GenerationJob)> {
        if self.active.is_some() {
            return None;
        }
        let head = self.retry.front().or_else(|| self.pending.front())?;
        let next = (head.id, head.job.clone());
        self.active = Some(next.0);
        Some(next)
    }

    /// Record the outcome of a job handed out by [`next_job`](Self::next_job).
    ///
    /// Finished jobs leave the queue. Failed jobs move to the errored list,
    /// keeping the step they stopped at. The terminal event is sent once the
    /// lists reflect the outcome, so a listener that sees it also sees the
    /// new state. Results for jobs that were removed meanwhile are dropped;
    /// their `Canceled` event was already sent by [`remove`](Self::remove).
    pub fn finish(
        &mut self,
        id: JobId,
        job: GenerationJob,
        outcome: &JobOutcome,
        events: &EventSender,
    ) {
        if self.active == Some(id) {
            self.active = None;
        }
        let Some(mut queued) =
            take_by_id(&mut self.retry, id).or_else(|| take_by_id(&mut self.pending, id))
        else {
            debug!(id, "job left the queue while running");
            return;
        };
        queued.job = job;
        let event = outcome.event(queued.job.key());

        match outcome {
            JobOutcome::Done(_) | JobOutcome::Canceled => {
                debug!(job = %queued.job.key(), "job left the queue");
            }
            JobOutcome::Failed(error) => {
                info!(job = %queued.job.key(), step = ?queued.job.step(), "job moved to errored");
                queued.error = Some(error.clone());
                self.errored.push(queued);
            }
        }
        let _ = events.send(event);
    }

    /// Check whether nothing is running or waiting to run
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.pending.is_empty() && self.retry.is_empty()
    }

    /// Key of the running job
    pub fn active(&self) -> Option<&JobKey> {
        let id = self.active?;
        self.all()
            .find(|(_, j)| j.id == id)
            .map(|(_, j)| j.job.key())
    }

    pub fn pending(&self) -> impl Iterator<Item = &JobKey> {
        self.pending.iter().map(|j| j.job.key())
    }

    pub fn retrying(&self) -> impl Iterator<Item = &JobKey> {
        self.retry.iter().map(|j| j.job.key())
    }

    /// Errored jobs together with the error that stopped them
    pub fn errored(&self) -> impl Iterator<Item = (&JobKey, Option<&JobError>)> {
        self.errored
            .iter()
            .map(|j| (j.job.key(), j.error.as_ref()))
    }

    /// Every job, retry list first
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.all()
            .map(|(list, j)| QueueEntry {
                key: j.job.key().clone(),
                list,
                step: j.job.step(),
                active: self.active == Some(j.id),
                error: j.error.clone(),
            })
            .collect()
    }

    /// Total number of jobs
    pub fn len(&self) -> usize {
        self.pending.len() + self.retry.len() + self.errored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn take_by_key(list: &mut VecDeque<QueuedJob>, key: &JobKey) -> Option<QueuedJob> {
    let idx = list.iter().position(|j| j.job.key() == key)?;
    list.remove(idx)
}

fn take_by_id(list: &mut VecDeque<QueuedJob>, id: JobId) -> Option<QueuedJob> {
    let idx = list.iter().position(|j| j.id == id)?;
    list.remove(idx)
}
