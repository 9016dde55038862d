//! Time/count-based coalescing for droppable progress events.

use std::time::{Duration, Instant};

const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Decides when a traversal or backup loop should publish running counters.
#[derive(Debug)]
pub struct ProgressThrottler {
    interval: Duration,
    entry_trigger: u64,
    last_emit: Option<Instant>,
    last_emit_entries: u64,
}

impl Default for ProgressThrottler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressThrottler {
    /// Construct a throttler using the default interval of half a second.
    #[must_use]
    pub fn new() -> Self {
        Self::with_interval_and_trigger(Duration::from_millis(500), 1_000)
    }

    /// Construct a throttler with the supplied minimum interval and entry trigger.
    ///
    /// An `entry_trigger` of zero disables count-based emission.
    #[must_use]
    pub fn with_interval_and_trigger(interval: Duration, entry_trigger: u64) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            entry_trigger,
            last_emit: None,
            last_emit_entries: 0,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Consider emitting given the number of entries processed so far.
    ///
    /// The first call only records a baseline.
    pub fn consider(&mut self, now: Instant, processed_entries: u64) -> bool {
        let Some(last_emit) = self.last_emit else {
            self.last_emit = Some(now);
            self.last_emit_entries = processed_entries;
            return false;
        };

        let elapsed = now.saturating_duration_since(last_emit);
        let entries_delta = processed_entries.saturating_sub(self.last_emit_entries);
        let count_due = self.entry_trigger > 0 && entries_delta >= self.entry_trigger;

        if elapsed >= self.interval || count_due {
            self.last_emit = Some(now);
            self.last_emit_entries = processed_entries;
            return true;
        }

        false
    }
}
