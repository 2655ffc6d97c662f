//! Native polling backend
//!
//! Cooperative single-thread loop: each iteration reads whatever the TTY,
//! pointer and gamepad have ready (never blocking), routes the resulting
//! events, checks the tick clock and sleeps briefly.

use log::{debug, info, trace};
use std::thread;
use std::time::Duration;

use super::{AppHooks, Dispatcher, Exit, InputBackend};
use crate::constants::{DEFAULT_ESCAPE_FLUSH_POLLS, DEFAULT_IDLE_SLEEP_MS, READ_CHUNK};
use crate::error::Result;
use crate::input::{
    diff, GamepadDevice, InputEvent, KeyDecoder, PointerDevice, PointerSample, RawInputStream,
    ReleasePolicy,
};
use crate::session::Release;

/// Everything one poll produced
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PollResult {
    /// Pointer attach (`true`) or detach (`false`) seen this poll
    pub presence: Option<bool>,
    /// Events in delivery order: keys, pointer, gamepad
    pub events: Vec<InputEvent>,
}

/// Backend that polls devices directly
///
/// Every device is optional; a missing device simply produces no events.
pub struct PollingBackend {
    stream: Option<Box<dyn RawInputStream>>,
    pointer: Option<Box<dyn PointerDevice>>,
    gamepad: Option<Box<dyn GamepadDevice>>,
    decoder: KeyDecoder,
    /// Consecutive polls without new bytes while a sequence is pending
    quiet_polls: u32,
    escape_flush_polls: u32,
    /// Last pointer sample, `None` until the first one (or after detach)
    last_pointer: Option<PointerSample>,
    pointer_attached: bool,
    idle_sleep: Duration,
}

impl Default for PollingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PollingBackend {
    pub fn new() -> Self {
        Self {
            stream: None,
            pointer: None,
            gamepad: None,
            decoder: KeyDecoder::new(),
            quiet_polls: 0,
            escape_flush_polls: DEFAULT_ESCAPE_FLUSH_POLLS,
            last_pointer: None,
            pointer_attached: false,
            idle_sleep: Duration::from_millis(DEFAULT_IDLE_SLEEP_MS),
        }
    }

    pub fn with_stream(mut self, stream: impl RawInputStream + 'static) -> Self {
        self.stream = Some(Box::new(stream));
        self
    }

    pub fn with_pointer(mut self, pointer: impl PointerDevice + 'static) -> Self {
        self.pointer = Some(Box::new(pointer));
        self
    }

    pub fn with_gamepad(mut self, gamepad: impl GamepadDevice + 'static) -> Self {
        self.gamepad = Some(Box::new(gamepad));
        self
    }

    /// Sleep between iterations (zero disables sleeping)
    pub fn idle_sleep(mut self, sleep: Duration) -> Self {
        self.idle_sleep = sleep;
        self
    }

    /// Quiet polls before a dangling ESC is delivered as a key
    pub fn escape_flush_polls(mut self, polls: u32) -> Self {
        self.escape_flush_polls = polls.max(1);
        self
    }

    /// Collect one iteration's input from every device
    pub fn poll_once(&mut self) -> Result<PollResult> {
        let mut result = PollResult::default();
        self.poll_keys(&mut result.events)?;
        result.presence = self.poll_pointer(&mut result.events)?;
        self.poll_gamepad(&mut result.events)?;
        Ok(result)
    }

    fn poll_keys(&mut self, events: &mut Vec<InputEvent>) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        let available = stream.bytes_available()?;
        let bytes = if available > 0 {
            stream.read(available.min(READ_CHUNK))?
        } else {
            Vec::new()
        };

        if !bytes.is_empty() {
            trace!("read {} bytes", bytes.len());
            self.quiet_polls = 0;
            events.extend(
                self.decoder
                    .feed(&bytes)
                    .into_iter()
                    .map(|token| InputEvent::KeyPress { token }),
            );
        } else if self.decoder.has_pending() {
            self.quiet_polls += 1;
            if self.quiet_polls >= self.escape_flush_polls {
                self.quiet_polls = 0;
                if let Some(token) = self.decoder.flush() {
                    debug!("flushing partial sequence {}", token);
                    events.push(InputEvent::KeyPress { token });
                }
            }
        }
        Ok(())
    }

    fn poll_pointer(&mut self, events: &mut Vec<InputEvent>) -> Result<Option<bool>> {
        let Some(pointer) = self.pointer.as_mut() else {
            return Ok(None);
        };

        let sample = pointer.poll()?;

        let attached = pointer.is_attached();
        let presence = if attached != self.pointer_attached {
            self.pointer_attached = attached;
            if !attached {
                // A re-attached device starts over with the first-sample rule
                self.last_pointer = None;
            }
            Some(attached)
        } else {
            None
        };

        let Some(sample) = sample else {
            return Ok(presence);
        };

        let moved = self
            .last_pointer
            .as_ref()
            .map_or(true, |last| (last.x, last.y) != (sample.x, sample.y));
        if moved {
            events.push(InputEvent::PointerMove {
                x: sample.x,
                y: sample.y,
            });
        }

        let previous = self.last_pointer.as_ref().map(|last| &last.buttons);
        events.extend(
            diff(previous, &sample.buttons, ReleasePolicy::PressOnly)
                .into_iter()
                .map(|change| InputEvent::PointerButtonDown {
                    button: change.id,
                    x: sample.x,
                    y: sample.y,
                }),
        );

        self.last_pointer = Some(sample);
        Ok(presence)
    }

    fn poll_gamepad(&mut self, events: &mut Vec<InputEvent>) -> Result<()> {
        let Some(gamepad) = self.gamepad.as_mut() else {
            return Ok(());
        };

        if gamepad.poll()? {
            events.extend(gamepad.changes().iter().map(|c| InputEvent::ButtonChange {
                id: c.id,
                pressed: c.pressed,
            }));
        }
        gamepad.clear_changes();
        Ok(())
    }
}

impl InputBackend for PollingBackend {
    fn name(&self) -> &'static str {
        "polling"
    }

    fn drive(&mut self, dispatcher: &mut Dispatcher, hooks: &mut dyn AppHooks) -> Result<Exit> {
        info!(
            "Polling devices: stream={} pointer={} gamepad={}",
            self.stream.is_some(),
            self.pointer.is_some(),
            self.gamepad.is_some()
        );

        loop {
            if dispatcher.interrupted() {
                return Ok(Exit::Interrupted);
            }

            let polled = self.poll_once()?;
            if let Some(attached) = polled.presence {
                hooks.on_pointer_presence(attached);
            }
            for event in polled.events {
                dispatcher.route(event, hooks);
            }
            dispatcher.tick_if_due(hooks);
            dispatcher.end_iteration();

            if !self.idle_sleep.is_zero() {
                thread::sleep(self.idle_sleep);
            }
        }
    }
}

impl Release for PollingBackend {
    /// Release every device; the first failure is reported after all have been tried
    fn release(&mut self) -> Result<()> {
        let mut first_err = None;

        let results = [
            self.stream.as_mut().map(|s| s.release()),
            self.pointer.as_mut().map(|p| p.release()),
            self.gamepad.as_mut().map(|g| g.release()),
        ];
        for result in results.into_iter().flatten() {
            if let Err(e) = result {
                first_err.get_or_insert(e);
            }
        }

        self.last_pointer = None;
        self.pointer_attached = false;

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
