//! Progress events and the bounded channel that carries them to a consumer.
//!
//! Running counters (`Visiting`, `Counts`, `Elapsed`, `Transferred`) are
//! best-effort: they are coalesced by [`ProgressThrottler`] and dropped when
//! the buffer is full. `Error` and terminal events wait for buffer space, but
//! only for [`CRITICAL_SEND_TIMEOUT`]. A consumer that lets that grace period
//! run out is marked stalled, and later events are dropped without waiting
//! until the consumer makes room again, so the producer is never pinned.

pub mod throttle;

pub use throttle::ProgressThrottler;

use crate::models::{BackupReport, CategoryCounts, ErrorKind, ScanResult};
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// How long an `Error` or terminal event waits for buffer space.
pub const CRITICAL_SEND_TIMEOUT: Duration = Duration::from_millis(500);

/// Result attached to a terminal event.
#[derive(Debug, Clone)]
pub enum Outcome {
    Scan(Arc<ScanResult>),
    Backup(Arc<BackupReport>),
}

impl Outcome {
    #[must_use]
    pub fn as_scan(&self) -> Option<&ScanResult> {
        match self {
            Outcome::Scan(result) => Some(result),
            Outcome::Backup(_) => None,
        }
    }

    #[must_use]
    pub fn as_backup(&self) -> Option<&BackupReport> {
        match self {
            Outcome::Backup(report) => Some(report),
            Outcome::Scan(_) => None,
        }
    }
}

/// Events published by a scan or backup run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Path currently being visited (scan) or copied (backup).
    Visiting(PathBuf),
    /// Running number of matched records per category.
    Counts(CategoryCounts),
    /// Time since the run started.
    Elapsed(Duration),
    /// Running totals of a backup.
    Transferred { files: u64, bytes: u64 },
    /// A per-item failure; the run continues.
    Error { path: PathBuf, kind: ErrorKind },
    Done(Outcome),
    Cancelled(Outcome),
    /// The run could not start, e.g. because of an invalid configuration.
    Failed(String),
}

impl ProgressEvent {
    /// Whether the event may be coalesced or dropped under backpressure.
    #[must_use]
    pub fn is_droppable(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Visiting(_)
                | ProgressEvent::Counts(_)
                | ProgressEvent::Elapsed(_)
                | ProgressEvent::Transferred { .. }
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Done(_) | ProgressEvent::Cancelled(_) | ProgressEvent::Failed(_)
        )
    }
}

/// Create a bounded progress channel. A capacity of zero is raised to one.
#[must_use]
pub fn channel(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    (
        ProgressSender {
            tx: Some(tx),
            dropped: Arc::new(AtomicU64::new(0)),
            stalled: Arc::new(AtomicBool::new(false)),
        },
        ProgressReceiver { rx },
    )
}

/// Producer half of the progress channel.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Option<Sender<ProgressEvent>>,
    dropped: Arc<AtomicU64>,
    stalled: Arc<AtomicBool>,
}

impl ProgressSender {
    /// A sender without a consumer; every event is discarded.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            tx: None,
            dropped: Arc::new(AtomicU64::new(0)),
            stalled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn send(&self, event: ProgressEvent) {
        let Some(tx) = &self.tx else {
            return;
        };

        if event.is_droppable() || self.stalled.load(Ordering::Relaxed) {
            match tx.try_send(event) {
                Ok(()) => self.stalled.store(false, Ordering::Relaxed),
                Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
            return;
        }

        match tx.send_timeout(event, CRITICAL_SEND_TIMEOUT) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(event)) => {
                log::warn!("Progress consumer stalled; dropping {event:?} and later events until it catches up");
                self.stalled.store(true, Ordering::Relaxed);
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                log::trace!("Progress receiver gone; event discarded");
            }
        }
    }

    /// Number of events discarded because the buffer was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half of the progress channel.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: Receiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Block until the next event; `None` once every sender is gone.
    #[must_use]
    pub fn recv(&self) -> Option<ProgressEvent> {
        self.rx.recv().ok()
    }

    #[must_use]
    pub fn try_recv(&self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<ProgressEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Iterate until every sender is gone.
    pub fn iter(&self) -> impl Iterator<Item = ProgressEvent> + '_ {
        self.rx.iter()
    }
}

/// Throttled publisher used by the engines inside one run.
#[derive(Debug)]
pub struct ProgressReporter {
    sender: ProgressSender,
    throttler: ProgressThrottler,
    started: Instant,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(sender: ProgressSender, interval: Duration, entry_trigger: u64) -> Self {
        Self {
            sender,
            throttler: ProgressThrottler::with_interval_and_trigger(interval, entry_trigger),
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Publish the events built by `build` if the throttler allows it.
    pub fn tick<F>(&mut self, processed_entries: u64, build: F)
    where
        F: FnOnce() -> Vec<ProgressEvent>,
    {
        if !self.throttler.consider(Instant::now(), processed_entries) {
            return;
        }

        for event in build() {
            self.sender.send(event);
        }
        self.sender.send(ProgressEvent::Elapsed(self.elapsed()));
    }

    /// Publish a per-item failure immediately.
    pub fn error(&self, path: PathBuf, kind: ErrorKind) {
        self.sender.send(ProgressEvent::Error { path, kind });
    }

    #[must_use]
    pub fn sender(&self) -> &ProgressSender {
        &self.sender
    }
}
