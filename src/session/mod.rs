//! Session lifetime management
//!
//! - `ResourceGuard`: releases leased devices on every exit path
//! - `Interrupt`: shutdown requests from signals or the application

mod guard;
mod signal;

pub use guard::{Release, ResourceGuard};
pub use signal::{setup_signal_handlers, shutdown_requested, Interrupt};
