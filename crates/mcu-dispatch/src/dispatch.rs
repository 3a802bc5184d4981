//! Interrupt-context timer dispatch loop.
//!
//! [`Dispatcher::run`] is entered from the hardware timer interrupt with
//! interrupts disabled. It repeatedly asks the timer queue to fire the
//! next due timer, then decides among three outcomes:
//!
//! - the new head is comfortably in the future: return it so the board
//!   glue reprograms the hardware comparator;
//! - the head is imminent but the eager budget still holds: briefly
//!   re-enable interrupts and poll the clock until the head is due;
//! - the eager budget is exhausted: force a short deterministic pause so
//!   cooperative tasks get to run.
//!
//! A timer found more than the fault horizon in the past is a fatal
//! scheduling fault, surfaced as [`FatalFault`] rather than handled
//! inline; the top-level run loop turns it into a hard process exit.

use crate::guard::StarvationGuard;
use crate::hal::{Clock, InterruptGate, TimerQueue};
use mcu_common::config::DispatchWindows;
use mcu_common::error::{DispatchResult, FatalFault};
use mcu_common::tick::Tick;
use tracing::{debug, error};

/// Phase the dispatch loop was in when it last returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    /// Returned directly after dispatching: next timer scheduled normally.
    #[default]
    Dispatching,
    /// At least one busy-poll pass preceded the return.
    Polling,
    /// The eager budget ran out and a forced pause was inserted.
    Deferred,
}

/// The timer-dispatch core.
///
/// Owns the starvation guard (the shared scheduling context that the idle
/// booster and shutdown hook mutate by reference) and the pre-converted
/// tick windows.
#[derive(Debug)]
pub struct Dispatcher {
    guard: StarvationGuard,
    windows: DispatchWindows,
    state: DispatchState,
    /// Forced defers since startup, for diagnostics.
    defer_count: u64,
}

impl Dispatcher {
    /// Create a dispatcher with its guard opened to the idle window, the
    /// same state the shutdown hook restores.
    #[must_use]
    pub fn new(windows: DispatchWindows, now: Tick) -> Self {
        Self {
            guard: StarvationGuard::new(now, windows.idle_repeat_window),
            windows,
            state: DispatchState::default(),
            defer_count: 0,
        }
    }

    /// Invoke timers. Called from the board's timer-interrupt glue with
    /// interrupts disabled; returns the tick the hardware comparator
    /// should be armed for.
    ///
    /// The guard deadline is snapshotted once at entry: timers fired
    /// during this pass cannot extend the current burst.
    ///
    /// # Errors
    ///
    /// [`FatalFault::RescheduledTimerInPast`] if a forced defer finds the
    /// queue head more than the fault horizon overdue.
    pub fn run<C, Q, I>(&mut self, clock: &C, queue: &mut Q, irq: &mut I) -> DispatchResult<Tick>
    where
        C: Clock,
        Q: TimerQueue,
        I: InterruptGate,
    {
        let budget_until = self.guard.deadline();
        self.state = DispatchState::Dispatching;
        loop {
            // Run the next software timer.
            let next = queue.dispatch_next();

            let now = clock.now();
            let mut diff = next.signed_diff(now);
            if diff > self.windows.min_try as i32 {
                // Schedule next timer normally.
                return Ok(next);
            }

            if budget_until.is_before(now) {
                // Too many repeat timers from a single interrupt - force a pause.
                self.state = DispatchState::Deferred;
                return self.force_defer(next, clock);
            }

            // Next timer in the past or near future - wait for it to be ready.
            self.state = DispatchState::Polling;
            irq.enable();
            while diff > 0 {
                diff = next.signed_diff(clock.now());
            }
            irq.disable();
        }
    }

    /// Reschedule timers after a brief pause to prevent task starvation.
    fn force_defer<C: Clock>(&mut self, next: Tick, clock: &C) -> DispatchResult<Tick> {
        let now = clock.now();
        if next.offset(self.windows.fault_horizon).is_before(now) {
            error!(%next, %now, "rescheduled timer in the past");
            return Err(FatalFault::RescheduledTimerInPast { next, now });
        }
        self.guard.extend(now, self.windows.repeat_window);
        self.defer_count += 1;
        Ok(now.offset(self.windows.defer_repeat))
    }

    /// Shutdown hook: discard any in-flight eager budget and reopen the
    /// guard to the idle window, giving a clean restart state.
    pub fn reset(&mut self, now: Tick) {
        debug!(%now, "dispatch guard reset");
        self.guard.extend(now, self.windows.idle_repeat_window);
        self.state = DispatchState::default();
    }

    /// The starvation guard (shared scheduling context).
    #[must_use]
    pub fn guard(&self) -> &StarvationGuard {
        &self.guard
    }

    /// Mutable guard access for the idle booster. Callers must hold the
    /// interrupt mask.
    pub fn guard_mut(&mut self) -> &mut StarvationGuard {
        &mut self.guard
    }

    /// Phase of the most recent [`Dispatcher::run`] pass.
    #[must_use]
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Tick windows this dispatcher was built with.
    #[must_use]
    pub fn windows(&self) -> &DispatchWindows {
        &self.windows
    }

    /// Forced defers since startup.
    #[must_use]
    pub fn defer_count(&self) -> u64 {
        self.defer_count
    }
}
