use crate::tick::Tick;
use std::path::PathBuf;
use thiserror::Error;

/// Unrecoverable scheduling faults.
///
/// The dispatch core has no recoverable error path: every branch either
/// returns a next-wake tick or raises one of these. The top-level run
/// loop treats a fatal fault as a hard process exit, never something to
/// recover from inline.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FatalFault {
    /// A timer target was discovered more than the fault horizon (~1ms)
    /// in the past while attempting a forced defer.
    #[error("rescheduled timer in the past: waketime {next} at clock {now}")]
    RescheduledTimerInPast {
        /// The overdue waketime.
        next: Tick,
        /// Clock reading at the moment of detection.
        now: Tick,
    },
}

/// Convenience alias for dispatch operations.
pub type DispatchResult<T> = Result<T, FatalFault>;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A configured window does not fit the 32-bit tick counter.
    #[error("window `{name}` of {ticks} ticks exceeds the 32-bit counter range")]
    WindowOverflow {
        /// Name of the offending window.
        name: &'static str,
        /// Computed tick count.
        ticks: u64,
    },
}
