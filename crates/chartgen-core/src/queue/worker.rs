//! Background thread that drains a [`JobQueue`]

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use super::{JobQueue, QueueEntry};
use crate::config::GenerationOptions;
use crate::job::{ChartFs, EventSender, JobKey};

/// Messages understood by the worker thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Something was queued; look for work
    Wake,
    /// Stop after the running job
    Shutdown,
}

/// Owns the queue and the single thread that runs its jobs
pub struct QueueWorker {
    queue: Arc<Mutex<JobQueue>>,
    events: EventSender,
    handle: Option<JoinHandle<()>>,
    tx: Sender<WorkerMessage>,
}

impl QueueWorker {
    /// Spawn the worker thread. Job events are sent to `events`.
    pub fn spawn(fs: Arc<dyn ChartFs>, options: GenerationOptions, events: EventSender) -> Self {
        let queue = Arc::new(Mutex::new(JobQueue::new()));
        let (tx, rx) = mpsc::channel::<WorkerMessage>();

        let handle = {
            let queue = Arc::clone(&queue);
            let events = events.clone();
            thread::spawn(move || run_worker(rx, queue, fs, options, events))
        };

        Self {
            queue,
            events,
            handle: Some(handle),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobQueue> {
        lock_queue(&self.queue)
    }

    fn wake(&self) {
        let _ = self.tx.send(WorkerMessage::Wake);
    }

    /// Admit a job; `false` if one with the same key is already queued
    pub fn add(&self, key: JobKey) -> bool {
        let added = self.lock().add(key);
        if added {
            self.wake();
        }
        added
    }

    /// Move an errored job to the retry list and schedule it
    pub fn retry(&self, key: &JobKey) -> bool {
        let moved = self.lock().retry(key);
        if moved {
            self.wake();
        }
        moved
    }

    /// Remove a job, canceling it if it is running
    pub fn remove(&self, key: &JobKey) -> bool {
        self.lock().remove(key, &self.events)
    }

    /// Current contents of the queue
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.lock().entries()
    }

    /// Check whether every admitted job has finished or errored
    pub fn is_idle(&self) -> bool {
        self.lock().is_idle()
    }

    /// Stop the worker and wait for it to finish
    pub fn shutdown(mut self) {
        let _ = self.tx.send(WorkerMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn lock_queue(queue: &Mutex<JobQueue>) -> MutexGuard<'_, JobQueue> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run_worker(
    rx: Receiver<WorkerMessage>,
    queue: Arc<Mutex<JobQueue>>,
    fs: Arc<dyn ChartFs>,
    options: GenerationOptions,
    events: EventSender,
) {
    info!("queue worker started");
    loop {
        loop {
            if let Ok(WorkerMessage::Shutdown) = rx.try_recv() {
                info!("queue worker stopping");
                return;
            }
            let Some((id, mut job)) = lock_queue(&queue).next_job() else {
                break;
            };
            // Runs without the lock so the queue stays editable
            let outcome = job.run(fs.as_ref(), &options, &events);
            debug!(id, ?outcome, "job returned");
            lock_queue(&queue).finish(id, job, &outcome, &events);
        }

        match rx.recv() {
            Ok(WorkerMessage::Wake) => continue,
            Ok(WorkerMessage::Shutdown) | Err(_) => break,
        }
    }
    info!("queue worker stopping");
}
