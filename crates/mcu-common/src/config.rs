//! Timing configuration for the dispatch core.
//!
//! Supports TOML deserialization with defaults matching the firmware's
//! compiled-in constants. Window durations use humantime format
//! ("1us", "100us") and are converted to clock ticks once at startup.

use crate::error::ConfigError;
use crate::tick::ticks_from_us;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timer-dispatch timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Hardware clock frequency in Hz.
    pub clock_freq_hz: u32,

    /// Slack below which a due-soon timer is polled for instead of
    /// reprogramming the hardware comparator.
    #[serde(with = "humantime_serde")]
    pub min_try: Duration,

    /// Length of the mandatory pause inserted by a forced defer.
    #[serde(with = "humantime_serde")]
    pub defer_repeat: Duration,

    /// Eager-dispatch budget granted after a forced defer.
    #[serde(with = "humantime_serde")]
    pub repeat_window: Duration,

    /// Widened eager-dispatch budget granted while the system idles.
    #[serde(with = "humantime_serde")]
    pub idle_repeat_window: Duration,

    /// How far in the past a rescheduled timer may be before the fault
    /// is considered unrecoverable.
    #[serde(with = "humantime_serde")]
    pub fault_horizon: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            clock_freq_hz: 16_000_000,
            min_try: Duration::from_micros(1),
            defer_repeat: Duration::from_micros(5),
            repeat_window: Duration::from_micros(100),
            idle_repeat_window: Duration::from_micros(500),
            fault_horizon: Duration::from_millis(1),
        }
    }
}

impl TimingConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Convert the configured durations to tick windows at the configured
    /// clock frequency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WindowOverflow`] if any window exceeds half
    /// the counter range, past which the signed comparison rule breaks.
    pub fn windows(&self) -> Result<DispatchWindows, ConfigError> {
        Ok(DispatchWindows {
            min_try: self.window_ticks("min_try", self.min_try)?,
            defer_repeat: self.window_ticks("defer_repeat", self.defer_repeat)?,
            repeat_window: self.window_ticks("repeat_window", self.repeat_window)?,
            idle_repeat_window: self.window_ticks("idle_repeat_window", self.idle_repeat_window)?,
            fault_horizon: self.window_ticks("fault_horizon", self.fault_horizon)?,
        })
    }

    fn window_ticks(&self, name: &'static str, d: Duration) -> Result<u32, ConfigError> {
        let us = d.as_micros();
        let ticks = us
            .checked_mul(u128::from(self.clock_freq_hz / 1_000_000))
            .unwrap_or(u128::MAX);
        if ticks >= u128::from(1u64 << 31) {
            return Err(ConfigError::WindowOverflow {
                name,
                ticks: u64::try_from(ticks).unwrap_or(u64::MAX),
            });
        }
        Ok(ticks as u32)
    }
}

/// Timing constants pre-converted to clock ticks.
///
/// Produced once at startup by [`TimingConfig::windows`] so the hot
/// dispatch path does no duration math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchWindows {
    /// See [`TimingConfig::min_try`].
    pub min_try: u32,
    /// See [`TimingConfig::defer_repeat`].
    pub defer_repeat: u32,
    /// See [`TimingConfig::repeat_window`].
    pub repeat_window: u32,
    /// See [`TimingConfig::idle_repeat_window`].
    pub idle_repeat_window: u32,
    /// See [`TimingConfig::fault_horizon`].
    pub fault_horizon: u32,
}

impl DispatchWindows {
    /// Windows for the default configuration at the given frequency.
    ///
    /// Convenience for tests and the simulated host; production code goes
    /// through [`TimingConfig::windows`].
    #[must_use]
    pub fn from_freq(clock_freq_hz: u32) -> Self {
        Self {
            min_try: ticks_from_us(1, clock_freq_hz),
            defer_repeat: ticks_from_us(5, clock_freq_hz),
            repeat_window: ticks_from_us(100, clock_freq_hz),
            idle_repeat_window: ticks_from_us(500, clock_freq_hz),
            fault_horizon: ticks_from_us(1000, clock_freq_hz),
        }
    }
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
