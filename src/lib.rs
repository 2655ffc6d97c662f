//! jamloop - input and frame dispatch loop for small interactive devices
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  ResourceGuard                   │
//! ├──────────────────────────────────────────────────┤
//! │  PollingBackend            QueuedBackend         │
//! │  TTY → KeyDecoder          HostEventLoop         │
//! │  libinput → edge::diff       (ChannelHost,       │
//! │  gilrs → edge::diff           ReplayScript)      │
//! │             ↓                    ↓               │
//! │        Dispatcher::route / tick (Clock)          │
//! │                    ↓                             │
//! │     AppHooks: on_key on_click on_button on_tick  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Input arrives at irregular times from either a direct polling loop or an
//! external host event loop. Both are normalized into `InputEvent`s, routed
//! through one `Dispatcher`, and interleaved with a fixed-rate tick driven
//! by a monotonic clock. Leased devices are handed back on every exit path.

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod input;
pub mod session;

pub use config::{BackendKind, Config};
pub use dispatch::{
    AppHooks, Clock, DispatchStats, Dispatcher, Exit, InputBackend, ManualClock, MonotonicClock,
    PollingBackend, QueuedBackend,
};
pub use error::{Error, Result};
pub use input::{InputEvent, KeyToken, MouseButton};
pub use session::{Interrupt, Release, ResourceGuard};
