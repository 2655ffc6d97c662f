//! Host event loop implementations
//!
//! - `ChannelHost`: desktop-simulation runtime fed over an mpsc channel
//! - `ReplayScript`: timed events from a TOML file, fed from a thread

mod channel;
mod replay;

pub use channel::{ChannelHost, HostMessage};
pub use replay::{ReplayEntry, ReplayScript};
