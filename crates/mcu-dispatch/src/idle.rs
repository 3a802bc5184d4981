//! Idle priority booster.
//!
//! Runs as a cooperative task once per scheduling tick. While other tasks
//! keep the queue head moving there is work competing for the processor,
//! so the booster only tops up the guard window. Once the head stops
//! moving nothing is imminent: the eager-dispatch window can widen and
//! the processor can physically sleep until the next hardware event.

use crate::dispatch::Dispatcher;
use crate::hal::{Clock, IdleSink, InterruptGate, TimerQueue};
use mcu_common::tick::Tick;
use tracing::trace;

/// What one booster invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boost {
    /// Queue head moved since the last check: guard widened, no sleep.
    Extended,
    /// Nothing imminent: processor slept this many ticks.
    Slept(u32),
}

/// Cooperative background task that widens the guard window when idle
/// and parks the processor until the next interrupt.
#[derive(Debug, Default)]
pub struct IdleBooster {
    /// Queue head observed on the previous invocation, used to detect
    /// head movement between calls. Seeded with tick zero like the
    /// firmware's static.
    last_observed: Tick,
}

impl IdleBooster {
    /// Create a booster with an empty observation cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one booster pass. Called from task context with interrupts
    /// enabled; `wait_for_interrupt` is the only suspension point.
    pub fn run_once<C, Q, I, S>(
        &mut self,
        dispatcher: &mut Dispatcher,
        clock: &C,
        queue: &Q,
        irq: &mut I,
        stats: &mut S,
    ) -> Boost
    where
        C: Clock,
        Q: TimerQueue,
        I: InterruptGate,
        S: IdleSink,
    {
        let cached = self.last_observed;
        let idle_window = dispatcher.windows().idle_repeat_window;

        irq.disable();
        let next = queue.head_waketime();
        let cur = clock.now();
        if cached != next {
            dispatcher.guard_mut().extend(cur, idle_window);
            irq.enable();
            self.last_observed = next;
            trace!(head = %next, "queue head moved, guard widened");
            return Boost::Extended;
        }

        // Sleep the processor.
        irq.wait_for_interrupt();
        let post_sleep = clock.now();
        dispatcher.guard_mut().extend(post_sleep, idle_window);
        irq.enable();
        let slept = post_sleep.ticks_since(cur);
        stats.note_sleep(slept);
        trace!(ticks = slept, "woke from idle sleep");
        Boost::Slept(slept)
    }
}
