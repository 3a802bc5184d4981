//! Idle-sleep metrics collection.
//!
//! Tracks how long the processor spends parked in wait-for-interrupt.
//! The record path is allocation-free so it can run in the cooperative
//! task context without disturbing timing.

/// Accumulated processor-sleep statistics.
#[derive(Debug, Clone)]
pub struct SleepMetrics {
    /// Number of sleep episodes recorded.
    sleep_count: u64,
    /// Sum of all sleep durations in ticks.
    total_ticks: u64,
    /// Shortest observed sleep in ticks.
    min_ticks: u32,
    /// Longest observed sleep in ticks.
    max_ticks: u32,
    /// Most recent sleep in ticks.
    last_ticks: u32,
}

impl Default for SleepMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SleepMetrics {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sleep_count: 0,
            total_ticks: 0,
            min_ticks: u32::MAX,
            max_ticks: 0,
            last_ticks: 0,
        }
    }

    /// Record one sleep episode of the given tick duration.
    #[inline]
    pub fn record(&mut self, ticks: u32) {
        self.sleep_count += 1;
        self.total_ticks += u64::from(ticks);
        self.min_ticks = self.min_ticks.min(ticks);
        self.max_ticks = self.max_ticks.max(ticks);
        self.last_ticks = ticks;
    }

    /// Number of sleep episodes recorded.
    #[must_use]
    pub fn sleep_count(&self) -> u64 {
        self.sleep_count
    }

    /// Total ticks spent asleep.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Shortest sleep, if any were recorded.
    #[must_use]
    pub fn min(&self) -> Option<u32> {
        (self.sleep_count > 0).then_some(self.min_ticks)
    }

    /// Longest sleep, if any were recorded.
    #[must_use]
    pub fn max(&self) -> Option<u32> {
        (self.sleep_count > 0).then_some(self.max_ticks)
    }

    /// Most recent sleep duration.
    #[must_use]
    pub fn last(&self) -> u32 {
        self.last_ticks
    }

    /// Mean sleep duration in ticks, if any were recorded.
    #[must_use]
    pub fn mean(&self) -> Option<u64> {
        (self.sleep_count > 0).then(|| self.total_ticks / self.sleep_count)
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
