//! Starvation guard: the deadline bounding eager timer dispatch.
//!
//! Timers due within microseconds are cheaper to run via tight polling
//! than via reprogramming the hardware comparator, but unbounded polling
//! would starve cooperative tasks. The guard caps each eager burst: once
//! the deadline passes, the dispatch loop must force a short pause.
//!
//! The guard is owned by the [`crate::Dispatcher`] and handed by reference
//! to the idle booster and the shutdown hook. Every mutation happens with
//! interrupts disabled, which is the sole mutual exclusion.

use mcu_common::tick::Tick;

/// Deadline until which eager busy-dispatch is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarvationGuard {
    deadline: Tick,
}

impl StarvationGuard {
    /// Create a guard expiring `window` ticks after `now`.
    #[must_use]
    pub fn new(now: Tick, window: u32) -> Self {
        Self {
            deadline: now.offset(window),
        }
    }

    /// Grant a fresh budget: deadline becomes `now + window`.
    #[inline]
    pub fn extend(&mut self, now: Tick, window: u32) {
        self.deadline = now.offset(window);
    }

    /// True once the budget is exhausted (`deadline` is before `now`).
    #[inline]
    #[must_use]
    pub fn expired(&self, now: Tick) -> bool {
        self.deadline.is_before(now)
    }

    /// Current deadline.
    #[must_use]
    pub fn deadline(&self) -> Tick {
        self.deadline
    }
}
