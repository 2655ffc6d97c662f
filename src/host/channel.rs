//! Channel-fed host event loop
//!
//! Stands in for a desktop runtime's event queue: producers on other
//! threads push `HostMessage`s, the loop blocks until the next message or
//! the next tick deadline, whichever comes first.

use log::{debug, info};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

use crate::dispatch::{HostEventLoop, HostHandler, Registration};
use crate::error::Result;
use crate::input::InputEvent;

/// Message accepted by `ChannelHost`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMessage {
    Event(InputEvent),
    /// Stop the loop after delivering earlier messages
    Quit,
}

/// How the message drain ended
enum Drained {
    /// Queue empty, keep running
    Idle,
    /// Quit received or every sender dropped
    Closed,
}

/// Host event loop over an mpsc channel
///
/// The loop ends on `Quit`, when every sender has been dropped, or when the
/// handler asks to exit.
pub struct ChannelHost {
    rx: Receiver<HostMessage>,
}

impl ChannelHost {
    /// Create the host and the sender that feeds it
    pub fn new() -> (Sender<HostMessage>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }

    fn deliver(msg: HostMessage, registration: &Registration, handler: &mut dyn HostHandler) -> bool {
        match msg {
            HostMessage::Event(event) => {
                if registration.kinds.contains(event.kind()) {
                    handler.on_event(event);
                }
                true
            }
            HostMessage::Quit => {
                info!("Host quit requested");
                false
            }
        }
    }

    /// Deliver every message already queued
    fn drain(&self, registration: &Registration, handler: &mut dyn HostHandler) -> Drained {
        loop {
            match self.rx.try_recv() {
                Ok(msg) => {
                    if !Self::deliver(msg, registration, handler) {
                        return Drained::Closed;
                    }
                }
                Err(TryRecvError::Empty) => return Drained::Idle,
                Err(TryRecvError::Disconnected) => return Drained::Closed,
            }
        }
    }
}

impl HostEventLoop for ChannelHost {
    fn run(&mut self, registration: &Registration, handler: &mut dyn HostHandler) -> Result<()> {
        debug!(
            "Channel host running (kinds={:?}, min tick delay {:?})",
            registration.kinds, registration.min_tick_delay
        );
        let mut last_tick = Instant::now();

        loop {
            if handler.should_exit() {
                return Ok(());
            }

            let now = Instant::now();
            // No representable deadline means the tick never comes due
            let deadline = last_tick.checked_add(registration.min_tick_delay);
            if deadline.map_or(false, |d| now >= d) {
                // Queued events belong before this tick
                if let Drained::Closed = self.drain(registration, handler) {
                    return Ok(());
                }
                if handler.should_exit() {
                    return Ok(());
                }
                handler.on_tick();
                last_tick = now;
                continue;
            }

            let wait = deadline.map_or(Duration::MAX, |d| d - now);
            match self.rx.recv_timeout(wait) {
                Ok(msg) => {
                    if !Self::deliver(msg, registration, handler) {
                        return Ok(());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Host event source closed");
                    return Ok(());
                }
            }
        }
    }
}
