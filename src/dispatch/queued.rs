//! Host-driven backend
//!
//! Control is inverted: an external event loop owns the thread and calls
//! back for each event and each tick. The backend only adapts those calls
//! to the shared dispatcher routing.

use log::debug;
use std::time::Duration;

use super::{AppHooks, Dispatcher, Exit, InputBackend};
use crate::error::Result;
use crate::input::{EventKinds, InputEvent};
use crate::session::Release;

/// What the backend asks the host for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Event kinds the host should deliver
    pub kinds: EventKinds,
    /// Minimum delay between two ticks
    pub min_tick_delay: Duration,
}

/// Callbacks the host invokes
pub trait HostHandler {
    fn on_event(&mut self, event: InputEvent);
    fn on_tick(&mut self);
    /// Polled by the host between callbacks
    fn should_exit(&self) -> bool;
}

/// External event loop
///
/// `run` returns when the handler asks to exit or the host's own event
/// source is exhausted. Events queued before a tick must be delivered
/// before that tick.
pub trait HostEventLoop {
    fn run(&mut self, registration: &Registration, handler: &mut dyn HostHandler) -> Result<()>;

    /// Return anything the host holds on our behalf
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Backend delegating the loop to a `HostEventLoop`
pub struct QueuedBackend<H: HostEventLoop> {
    host: H,
    kinds: EventKinds,
}

impl<H: HostEventLoop> QueuedBackend<H> {
    /// Subscribe to every event kind
    pub fn new(host: H) -> Self {
        Self {
            host,
            kinds: EventKinds::all(),
        }
    }

    pub fn with_kinds(mut self, kinds: EventKinds) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

/// Adapts host callbacks to dispatcher calls
struct Bridge<'a, 'h> {
    dispatcher: &'a mut Dispatcher,
    hooks: &'a mut (dyn AppHooks + 'h),
    kinds: EventKinds,
}

impl HostHandler for Bridge<'_, '_> {
    fn on_event(&mut self, event: InputEvent) {
        if self.kinds.contains(event.kind()) {
            self.dispatcher.route(event, self.hooks);
        } else {
            debug!("dropping unsubscribed {:?}", event.kind());
        }
        self.dispatcher.end_iteration();
    }

    fn on_tick(&mut self) {
        self.dispatcher.tick_now(self.hooks);
        self.dispatcher.end_iteration();
    }

    fn should_exit(&self) -> bool {
        self.dispatcher.interrupted()
    }
}

impl<H: HostEventLoop> InputBackend for QueuedBackend<H> {
    fn name(&self) -> &'static str {
        "queued"
    }

    fn drive(&mut self, dispatcher: &mut Dispatcher, hooks: &mut dyn AppHooks) -> Result<Exit> {
        let registration = Registration {
            kinds: self.kinds,
            min_tick_delay: dispatcher.tick_interval(),
        };

        let mut bridge = Bridge {
            dispatcher,
            hooks,
            kinds: self.kinds,
        };
        self.host.run(&registration, &mut bridge)?;

        if bridge.dispatcher.interrupted() {
            Ok(Exit::Interrupted)
        } else {
            Ok(Exit::HostClosed)
        }
    }
}

impl<H: HostEventLoop> Release for QueuedBackend<H> {
    fn release(&mut self) -> Result<()> {
        HostEventLoop::release(&mut self.host)
    }
}
