//! Shutdown signals for the dashboard loop.
//!
//! Uses `signal-hook` flag registration; the event loop polls
//! [`ShutdownSignals::should_shutdown`] each iteration instead of blocking.
//! In raw mode Ctrl-C arrives as a key event, so only externally delivered
//! signals land here.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Shutdown flag shared between signal handlers and the event loop.
#[derive(Clone)]
pub struct ShutdownSignals {
    shutdown_flag: Arc<AtomicBool>,
}

impl ShutdownSignals {
    /// Create the flag and register SIGTERM, SIGINT and SIGHUP against it.
    ///
    /// Registration is best-effort. Call this before the terminal guard so
    /// failure messages reach a normal screen.
    pub fn register() -> Self {
        let signals = Self::unregistered();
        signals.register_signals();
        signals
    }

    /// A flag no OS signal will set; for tests and embedding.
    pub fn unregistered() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn should_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    fn register_signals(&self) {
        for (name, signal) in [("SIGTERM", SIGTERM), ("SIGINT", SIGINT)] {
            if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&self.shutdown_flag)) {
                eprintln!("[VSP-SIGNAL] failed to register {name}: {e}");
            }
        }

        // Closing the controlling terminal also ends the session.
        #[cfg(unix)]
        {
            use signal_hook::consts::SIGHUP;
            if let Err(e) = signal_hook::flag::register(SIGHUP, Arc::clone(&self.shutdown_flag)) {
                eprintln!("[VSP-SIGNAL] failed to register SIGHUP: {e}");
            }
        }
    }
}
