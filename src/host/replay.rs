//! Scripted event source for the channel host
//!
//! A replay file is TOML:
//!
//! ```toml
//! linger_ms = 500
//!
//! [[event]]
//! after_ms = 100
//! event = { kind = "key_press", token = "\u001b[A" }
//!
//! [[event]]
//! after_ms = 250
//! event = { kind = "pointer_button_down", button = "left", x = 40, y = 12 }
//! ```
//!
//! `after_ms` is relative to the previous entry. When the script ends (plus
//! `linger_ms`) the sender is dropped, which closes the host.

use log::{debug, info};
use serde::Deserialize;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::channel::HostMessage;
use crate::error::{Error, Result};
use crate::input::InputEvent;

/// One timed event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplayEntry {
    /// Delay after the previous entry
    #[serde(default)]
    pub after_ms: u64,
    pub event: InputEvent,
}

/// Ordered list of timed events
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplayScript {
    #[serde(default, rename = "event")]
    pub events: Vec<ReplayEntry>,
    /// Wait before closing once the last event is sent
    #[serde(default)]
    pub linger_ms: u64,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let script = Self::parse(&content)?;
        info!(
            "Loaded replay script {} ({} events)",
            path.display(),
            script.events.len()
        );
        Ok(script)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Total scripted time, linger included
    pub fn duration(&self) -> Duration {
        let total: u64 = self.events.iter().map(|e| e.after_ms).sum::<u64>() + self.linger_ms;
        Duration::from_millis(total)
    }

    /// Feed the script into `tx` from a background thread
    ///
    /// The thread stops early if the host goes away.
    pub fn spawn(self, tx: Sender<HostMessage>) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("jamloop-replay".into())
            .spawn(move || {
                for entry in self.events {
                    thread::sleep(Duration::from_millis(entry.after_ms));
                    debug!("replay: {:?}", entry.event);
                    if tx.send(HostMessage::Event(entry.event)).is_err() {
                        return;
                    }
                }
                thread::sleep(Duration::from_millis(self.linger_ms));
                debug!("replay finished");
            })
            .map_err(|e| Error::Host(format!("cannot start replay thread: {}", e)))?;
        Ok(handle)
    }
}
