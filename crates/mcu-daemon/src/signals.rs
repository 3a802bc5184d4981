//! Signal handling for daemon shutdown.
//!
//! SIGTERM and SIGINT set an atomic flag that the simulation loop polls;
//! the handler itself only touches the atomic, which is the full extent
//! of what is async-signal-safe. The loop answers the flag by invoking
//! the dispatcher's shutdown hook before exiting.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

static SHUTDOWN_FLAG: AtomicBool = AtomicBool::new(false);

/// Handle to the process-wide shutdown flag.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownSignal {
    _private: (),
}

impl ShutdownSignal {
    /// Register the SIGTERM/SIGINT handlers and return a handle.
    ///
    /// On non-Unix platforms only manual [`ShutdownSignal::request`] is
    /// available.
    pub fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            extern "C" fn on_signal(_: libc::c_int) {
                SHUTDOWN_FLAG.store(true, Ordering::Relaxed);
            }

            // SAFETY: the handler only stores to a static atomic, which is
            // async-signal-safe.
            #[allow(unsafe_code)]
            unsafe {
                if libc::signal(libc::SIGTERM, on_signal as libc::sighandler_t) == libc::SIG_ERR {
                    return Err(std::io::Error::last_os_error());
                }
                if libc::signal(libc::SIGINT, on_signal as libc::sighandler_t) == libc::SIG_ERR {
                    return Err(std::io::Error::last_os_error());
                }
            }
            debug!("Unix signal handlers registered");
        }

        Ok(Self { _private: () })
    }

    /// Check whether shutdown has been requested.
    #[inline]
    #[must_use]
    pub fn is_requested(&self) -> bool {
        SHUTDOWN_FLAG.load(Ordering::Relaxed)
    }

    /// Request shutdown manually (same effect as a signal).
    pub fn request(&self) {
        SHUTDOWN_FLAG.store(true, Ordering::Relaxed);
    }
}
