//! Repeating poll timer with at most one active schedule.
//!
//! The runtime owns one [`Poller`]. Changing the refresh rate replaces the
//! schedule instead of adding a second one, and a loop that overran several
//! periods gets one tick plus a count of what it skipped.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use crate::core::errors::{Result, VesperError};

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    period: Duration,
    next_due: Instant,
}

/// Holder for the single repeating poll schedule.
#[derive(Debug, Default)]
pub struct Poller {
    task: Option<ScheduledTask>,
}

impl Poller {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any existing schedule; the first tick is due one period after `now`.
    ///
    /// # Errors
    /// Rejects a zero period and leaves the current schedule untouched.
    pub fn start(&mut self, period: Duration, now: Instant) -> Result<()> {
        if period.is_zero() {
            return Err(VesperError::InvalidConfig {
                details: "poll period must be greater than zero".to_string(),
            });
        }
        self.task = Some(ScheduledTask {
            period,
            next_due: now + period,
        });
        Ok(())
    }

    /// Number of live schedules: always 0 or 1.
    #[must_use]
    pub fn active_timers(&self) -> usize {
        usize::from(self.task.is_some())
    }

    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        self.task.map(|t| t.period)
    }

    /// Time left until the next tick, zero when overdue, `None` before `start`.
    #[must_use]
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.task
            .map(|t| t.next_due.saturating_duration_since(now))
    }

    /// Report whether a tick is due at `now` and re-arm the schedule.
    ///
    /// Returns the number of whole periods skipped (0 on an on-time tick), or
    /// `None` when nothing is due.
    pub fn poll_due(&mut self, now: Instant) -> Option<u64> {
        let task = self.task.as_mut()?;
        if now < task.next_due {
            return None;
        }

        let overdue = now.duration_since(task.next_due);
        let skipped = overdue.as_nanos() / task.period.as_nanos().max(1);
        let skipped = u64::try_from(skipped).unwrap_or(u64::MAX);
        let periods = u32::try_from(skipped.saturating_add(1)).unwrap_or(u32::MAX);

        task.next_due += task.period.saturating_mul(periods);
        Some(skipped)
    }
}
