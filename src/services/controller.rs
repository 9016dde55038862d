//! Background execution of one scan or one backup at a time.
//!
//! A [`Controller`] owns the cancellation token of its current run and the
//! state machine `Idle -> Running -> {Completed, Cancelled, Failed}`. The
//! state is updated before the run's terminal event is sent, so a consumer
//! that sees `Done`/`Cancelled`/`Failed` also sees the final state.
//!
//! [`Controller::wait`] waits on the state change rather than on the worker
//! thread, so it returns even when nobody drains the progress stream.

use crate::models::{BackupReport, ScanResult};
use crate::services::backup::{self, BackupPlan};
use crate::services::cancel::CancelToken;
use crate::services::progress::{self, Outcome, ProgressEvent, ProgressReceiver, ProgressSender};
use crate::services::traverse::{self, DirectoryReader, TraversalDispatcher};
use crate::{Error, Result, ScanConfig};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Kind of unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Scan,
    Backup,
}

/// Lifecycle state of the most recent unit of work.
#[derive(Debug, Clone, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running(RunKind),
    Completed(Outcome),
    Cancelled(Outcome),
    Failed(String),
}

impl RunState {
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running(_))
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            RunState::Completed(outcome) | RunState::Cancelled(outcome) => Some(outcome),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: RunState,
    cancel: Option<CancelToken>,
    last_scan: Option<Arc<ScanResult>>,
    last_backup: Option<Arc<BackupReport>>,
}

/// Run state plus the condition signalled whenever a run leaves `Running`.
#[derive(Debug, Default)]
struct Inner {
    shared: Mutex<Shared>,
    finished: Condvar,
}

/// Starts, cancels, and awaits scans and backups on a worker thread.
pub struct Controller {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
    reader: Option<Arc<dyn DirectoryReader>>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Controller {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::default()),
            worker: Mutex::new(None),
            reader: None,
        }
    }

    /// Use `reader` for every scan instead of the platform default.
    #[must_use]
    pub fn with_reader(mut self, reader: Arc<dyn DirectoryReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        lock(&self.inner.shared).state.clone()
    }

    #[must_use]
    pub fn last_scan(&self) -> Option<Arc<ScanResult>> {
        lock(&self.inner.shared).last_scan.clone()
    }

    #[must_use]
    pub fn last_backup(&self) -> Option<Arc<BackupReport>> {
        lock(&self.inner.shared).last_backup.clone()
    }

    /// Start a scan on a worker thread and return its progress stream.
    pub fn start_scan(&self, config: ScanConfig) -> Result<ProgressReceiver> {
        let capacity = config.channel_capacity;
        let reader = self.reader.clone();
        self.start(RunKind::Scan, capacity, move |sender, cancel| {
            let result = match &reader {
                Some(reader) => traverse::run_scan(&config, reader.as_ref(), sender, cancel),
                None => {
                    let reader = TraversalDispatcher::for_config(&config).reader();
                    traverse::run_scan(&config, reader.as_ref(), sender, cancel)
                }
            };
            result.map(|result| Outcome::Scan(Arc::new(result)))
        })
    }

    /// Start a backup on a worker thread and return its progress stream.
    pub fn start_backup(&self, plan: BackupPlan) -> Result<ProgressReceiver> {
        self.start(
            RunKind::Backup,
            DEFAULT_CHANNEL_CAPACITY,
            move |sender, cancel| {
                let report = backup::run_backup(&plan, sender, cancel);
                Ok(Outcome::Backup(Arc::new(report)))
            },
        )
    }

    /// Request cancellation of the running unit. No effect otherwise.
    pub fn cancel(&self) {
        let shared = lock(&self.inner.shared);
        if shared.state.is_running()
            && let Some(token) = &shared.cancel
        {
            log::debug!("Cancellation requested");
            token.cancel();
        }
    }

    /// True once cancellation of the running unit has been requested.
    #[must_use]
    pub fn cancel_requested(&self) -> bool {
        let shared = lock(&self.inner.shared);
        shared.state.is_running()
            && shared.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Block until the current run, if any, leaves `Running` and return the
    /// final state. Undrained progress events do not hold this up.
    pub fn wait(&self) -> RunState {
        let state = {
            let mut shared = lock(&self.inner.shared);
            while shared.state.is_running() {
                shared = self
                    .inner
                    .finished
                    .wait(shared)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            shared.state.clone()
        };

        let mut worker = lock(&self.worker);
        if worker.as_ref().is_some_and(JoinHandle::is_finished)
            && let Some(handle) = worker.take()
            && handle.join().is_err()
        {
            log::warn!("Worker thread panicked after finishing its run");
        }
        state
    }

    fn start<F>(&self, kind: RunKind, capacity: usize, work: F) -> Result<ProgressReceiver>
    where
        F: FnOnce(&ProgressSender, &CancelToken) -> Result<Outcome> + Send + 'static,
    {
        let cancel = CancelToken::new();
        {
            let mut shared = lock(&self.inner.shared);
            if shared.state.is_running() {
                return Err(Error::Busy);
            }
            shared.state = RunState::Running(kind);
            shared.cancel = Some(cancel.clone());
        }

        let (sender, receiver) = progress::channel(capacity);
        let inner = Arc::clone(&self.inner);

        let spawned = thread::Builder::new()
            .name(format!("fscrape-{kind:?}").to_lowercase())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&sender, &cancel)))
                    .unwrap_or_else(|_| {
                        log::warn!("Worker thread panicked");
                        Err(Error::System("worker thread panicked".to_string()))
                    });
                let event = finish(&inner, outcome);
                sender.send(event);
            });

        match spawned {
            Ok(handle) => {
                *lock(&self.worker) = Some(handle);
                Ok(receiver)
            }
            Err(err) => {
                let mut shared = lock(&self.inner.shared);
                shared.state = RunState::Failed(format!("could not start worker: {err}"));
                shared.cancel = None;
                self.inner.finished.notify_all();
                Err(Error::System(format!("could not start worker thread: {err}")))
            }
        }
    }
}

/// Record the final state and build the matching terminal event.
/// Waiters on `finished` are woken before the event is sent.
fn finish(inner: &Inner, outcome: Result<Outcome>) -> ProgressEvent {
    let mut shared = lock(&inner.shared);
    shared.cancel = None;

    let event = match outcome {
        Ok(outcome) => {
            let partial = match &outcome {
                Outcome::Scan(result) => {
                    shared.last_scan = Some(Arc::clone(result));
                    result.partial
                }
                Outcome::Backup(report) => {
                    shared.last_backup = Some(Arc::clone(report));
                    report.partial
                }
            };

            if partial {
                shared.state = RunState::Cancelled(outcome.clone());
                ProgressEvent::Cancelled(outcome)
            } else {
                shared.state = RunState::Completed(outcome.clone());
                ProgressEvent::Done(outcome)
            }
        }
        Err(err) => {
            let message = err.to_string();
            log::warn!("Run failed: {message}");
            shared.state = RunState::Failed(message.clone());
            ProgressEvent::Failed(message)
        }
    };

    inner.finished.notify_all();
    event
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
