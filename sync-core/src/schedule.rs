//! Sync timing for picochat.
//!
//! Decides when a sync is due. Three sources feed it:
//! - Startup: the first evaluation is always due
//! - The periodic interval, measured from the last cycle that ran
//! - A forced request (after a successful send), due on the next tick
//!
//! A due sync stays due until a cycle actually runs. Deferral while the user
//! composes is the sync state machine's job; this module only keeps the
//! due-ness alive, so a deferred sync runs on the first tick after
//! composition ends.

use std::time::Duration;

/// Periodic plus forced sync timer.
#[derive(Debug, Clone)]
pub struct SyncSchedule {
    interval_ms: u64,
    last_run_ms: Option<u64>,
    forced: bool,
}

impl SyncSchedule {
    /// Create a schedule with the given period.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            last_run_ms: None,
            forced: false,
        }
    }

    /// Whether a sync should be attempted at `now_ms`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        if self.forced {
            return true;
        }
        match self.last_run_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Request one sync on the next tick regardless of the interval.
    pub fn force(&mut self) {
        self.forced = true;
    }

    /// Record that a cycle ran at `now_ms`.
    ///
    /// Clears any forced request and restarts the interval from here.
    pub fn mark_ran(&mut self, now_ms: u64) {
        self.forced = false;
        self.last_run_ms = Some(now_ms);
    }

    /// Whether a forced sync is pending.
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Milliseconds until the next periodic sync, zero if already due.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        if self.is_due(now_ms) {
            return 0;
        }
        match self.last_run_ms {
            Some(last) => self
                .interval_ms
                .saturating_sub(now_ms.saturating_sub(last)),
            None => 0,
        }
    }
}
