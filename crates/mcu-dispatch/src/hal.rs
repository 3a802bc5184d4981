//! Collaborator contracts between the dispatch core and the board.
//!
//! The core never touches hardware directly. The clock, the timer queue,
//! interrupt masking, and the stats sink all live behind these traits so
//! the same dispatch logic runs against real board glue or the simulated
//! host in [`crate::sim`].

use mcu_common::tick::Tick;

/// Monotonic (modulo wraparound) hardware clock.
///
/// Callable from any context, including with interrupts disabled.
pub trait Clock {
    /// Read the current tick.
    fn now(&self) -> Tick;
}

/// The software timer queue owned by the external scheduler.
///
/// The dispatch core only queries and triggers it; it never stores timer
/// entries itself.
pub trait TimerQueue {
    /// Execute the callback of the next ready timer, if any, and return
    /// the new queue head's waketime.
    fn dispatch_next(&mut self) -> Tick;

    /// Non-destructive peek of the next scheduled waketime.
    fn head_waketime(&self) -> Tick;
}

/// Flat (non-nesting) global interrupt mask plus the sleep primitive.
///
/// Disabling interrupts is the core's only mutual-exclusion mechanism;
/// there is no separate lock anywhere in the dispatch path.
pub trait InterruptGate {
    /// Mask interrupts. Not reentrant; callers do not nest.
    fn disable(&mut self);

    /// Unmask interrupts.
    fn enable(&mut self);

    /// Block until the next interrupt fires.
    ///
    /// Called with the mask held; the primitive itself permits the wakeup
    /// and returns with the mask held again. No timeout, no cancellation:
    /// it relies on some future interrupt eventually arriving.
    fn wait_for_interrupt(&mut self);
}

/// Observability sink for processor sleep time.
pub trait IdleSink {
    /// Report one sleep episode of the given tick duration.
    fn note_sleep(&mut self, ticks: u32);
}

impl IdleSink for mcu_common::metrics::SleepMetrics {
    fn note_sleep(&mut self, ticks: u32) {
        self.record(ticks);
    }
}

/// Sink that discards sleep reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl IdleSink for NullSink {
    fn note_sleep(&mut self, _ticks: u32) {}
}
