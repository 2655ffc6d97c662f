//! Process-level interrupt handling
//!
//! SIGTERM (systemd stop), SIGINT (Ctrl+C) and SIGHUP (terminal hangup)
//! set a global flag. The dispatch loop polls it through `Interrupt`.

use log::info;
use nix::sys::signal::{self, SigHandler, Signal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;

/// Global flag for shutdown requested via signal
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check if shutdown was requested by a signal
pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::Relaxed)
}

/// Set up signal handlers for graceful shutdown (call once at startup)
pub fn setup_signal_handlers() -> Result<()> {
    for sig in [Signal::SIGTERM, Signal::SIGINT, Signal::SIGHUP] {
        unsafe { signal::signal(sig, SigHandler::Handler(shutdown_signal_handler)) }?;
    }
    info!("Shutdown signal handlers installed");
    Ok(())
}

extern "C" fn shutdown_signal_handler(_signo: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::Relaxed);
}

/// Cancellation handle shared by the loop, the application and signals
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    local: Arc<AtomicBool>,
    watch_signals: bool,
}

impl Interrupt {
    /// Handle raised only through `request`
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that also observes the process signal flag
    pub fn with_signals() -> Self {
        Self {
            local: Arc::default(),
            watch_signals: true,
        }
    }

    /// Ask the loop to stop at its next check
    pub fn request(&self) {
        self.local.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.local.load(Ordering::Relaxed) || (self.watch_signals && shutdown_requested())
    }
}
