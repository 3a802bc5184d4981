//! Simulated host: clock, timer queue, and interrupt gate.
//!
//! Stands in for the board glue on a hosted target so the dispatch core
//! can run under tests and the daemon. The clock is a shared wrapping
//! counter that optionally advances on every read, which makes the
//! dispatch loop's busy-poll terminate deterministically.

use crate::hal::{Clock, InterruptGate, TimerQueue};
use mcu_common::tick::Tick;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared simulated hardware clock.
///
/// Clones observe the same counter. Reading via [`Clock::now`] advances
/// the counter by the configured per-read step; [`SimClock::peek`] does
/// not.
#[derive(Debug, Clone)]
pub struct SimClock {
    ticks: Arc<AtomicU32>,
    step: u32,
}

impl SimClock {
    /// Clock starting at `start` that does not advance on reads.
    #[must_use]
    pub fn new(start: u32) -> Self {
        Self::with_step(start, 0)
    }

    /// Clock starting at `start` that advances by `step` on every read.
    #[must_use]
    pub fn with_step(start: u32, step: u32) -> Self {
        Self {
            ticks: Arc::new(AtomicU32::new(start)),
            step,
        }
    }

    /// Read the counter without advancing it.
    #[must_use]
    pub fn peek(&self) -> Tick {
        Tick(self.ticks.load(Ordering::Relaxed))
    }

    /// Advance the counter by `ticks`.
    pub fn advance(&self, ticks: u32) {
        self.ticks.fetch_add(ticks, Ordering::Relaxed);
    }

    /// Move the counter forward to `target` if it is not already past it.
    pub fn advance_to(&self, target: Tick) {
        let now = self.peek();
        if now.is_before(target) {
            self.advance(target.ticks_since(now));
        }
    }
}

impl Clock for SimClock {
    fn now(&self) -> Tick {
        Tick(self.ticks.fetch_add(self.step, Ordering::Relaxed))
    }
}

struct SimTimer {
    waketime: Tick,
    /// `Some(p)` reschedules the timer `p` ticks after each firing
    /// (zero keeps the waketime in place); `None` is one-shot.
    period: Option<u32>,
    callback: Box<dyn FnMut(Tick)>,
}

impl std::fmt::Debug for SimTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimTimer")
            .field("waketime", &self.waketime)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

/// Simulated software timer queue.
///
/// Keeps timers unsorted and scans for the earliest waketime, which is
/// plenty for the handful of timers the simulation carries. An empty
/// queue parks its head one `horizon` past the current clock so the
/// dispatch loop always sees a finite next waketime.
#[derive(Debug)]
pub struct SimQueue {
    timers: Vec<SimTimer>,
    clock: SimClock,
    horizon: u32,
}

impl SimQueue {
    /// Create an empty queue reading time from `clock`.
    #[must_use]
    pub fn new(clock: SimClock, horizon: u32) -> Self {
        Self {
            timers: Vec::new(),
            clock,
            horizon,
        }
    }

    /// Schedule a one-shot timer.
    pub fn schedule<F>(&mut self, waketime: Tick, callback: F)
    where
        F: FnMut(Tick) + 'static,
    {
        self.timers.push(SimTimer {
            waketime,
            period: None,
            callback: Box::new(callback),
        });
    }

    /// Schedule a periodic timer rescheduled `period` ticks after each
    /// firing.
    pub fn schedule_periodic<F>(&mut self, waketime: Tick, period: u32, callback: F)
    where
        F: FnMut(Tick) + 'static,
    {
        self.timers.push(SimTimer {
            waketime,
            period: Some(period),
            callback: Box::new(callback),
        });
    }

    /// Schedule a one-shot timer that counts its firings.
    pub fn schedule_counted(&mut self, waketime: Tick) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let hits = Rc::clone(&count);
        self.schedule(waketime, move |_| hits.set(hits.get() + 1));
        count
    }

    /// Schedule a periodic timer that counts its firings.
    pub fn schedule_periodic_counted(&mut self, waketime: Tick, period: u32) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let hits = Rc::clone(&count);
        self.schedule_periodic(waketime, period, move |_| hits.set(hits.get() + 1));
        count
    }

    /// Number of scheduled timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// True if no timers are scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn earliest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, t) in self.timers.iter().enumerate() {
            match best {
                Some(b) if !t.waketime.is_before(self.timers[b].waketime) => {}
                _ => best = Some(i),
            }
        }
        best
    }
}

impl TimerQueue for SimQueue {
    fn dispatch_next(&mut self) -> Tick {
        let now = self.clock.peek();
        if let Some(idx) = self.earliest() {
            let due = !now.is_before(self.timers[idx].waketime);
            if due {
                match self.timers[idx].period {
                    Some(p) => {
                        let t = &mut self.timers[idx];
                        let at = t.waketime;
                        (t.callback)(at);
                        t.waketime = at.offset(p);
                    }
                    None => {
                        let mut t = self.timers.swap_remove(idx);
                        (t.callback)(t.waketime);
                    }
                }
            }
        }
        self.head_waketime()
    }

    fn head_waketime(&self) -> Tick {
        match self.earliest() {
            Some(idx) => self.timers[idx].waketime,
            None => self.clock.peek().offset(self.horizon),
        }
    }
}

/// Simulated interrupt gate.
///
/// Tracks the logical mask state and counts transitions; the sleep
/// primitive advances the shared clock by a fixed quantum (at least one
/// tick, so sleeping always makes progress).
#[derive(Debug)]
pub struct SimGate {
    clock: SimClock,
    enabled: bool,
    sleep_quantum: u32,
    enables: u32,
    disables: u32,
    sleeps: u32,
}

impl SimGate {
    /// Gate over `clock` whose sleeps advance by `sleep_quantum` ticks.
    #[must_use]
    pub fn new(clock: SimClock, sleep_quantum: u32) -> Self {
        Self {
            clock,
            enabled: true,
            sleep_quantum,
            enables: 0,
            disables: 0,
            sleeps: 0,
        }
    }

    /// Whether interrupts are logically enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of `enable` calls observed.
    #[must_use]
    pub fn enable_count(&self) -> u32 {
        self.enables
    }

    /// Number of `disable` calls observed.
    #[must_use]
    pub fn disable_count(&self) -> u32 {
        self.disables
    }

    /// Number of sleeps observed.
    #[must_use]
    pub fn sleep_count(&self) -> u32 {
        self.sleeps
    }
}

impl InterruptGate for SimGate {
    fn disable(&mut self) {
        self.enabled = false;
        self.disables += 1;
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.enables += 1;
    }

    fn wait_for_interrupt(&mut self) {
        self.sleeps += 1;
        self.clock.advance(self.sleep_quantum.max(1));
    }
}
