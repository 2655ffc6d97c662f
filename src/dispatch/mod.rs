//! Input and frame dispatch
//!
//! The `Dispatcher` owns the loop state (tick clock, interrupt, counters)
//! and the routing from normalized events to application hooks. Backends
//! decide *when* events and ticks happen; routing is shared.
//!
//! ```text
//!  PollingBackend ─┐                       ┌─> on_key / on_click / on_button
//!                  ├─> Dispatcher::route ──┤
//!  QueuedBackend ──┘   Dispatcher::tick ───┴─> on_tick
//! ```

pub mod clock;
pub mod polling;
pub mod queued;

use log::{debug, info, warn};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::input::{InputEvent, KeyToken, MouseButton};
use crate::session::{Interrupt, Release};

pub use clock::{Clock, ManualClock, MonotonicClock, TickScheduler};
pub use polling::PollingBackend;
pub use queued::{HostEventLoop, HostHandler, QueuedBackend, Registration};

/// Application callbacks
///
/// All hooks are side-effect only.
pub trait AppHooks {
    /// Decoded key
    fn on_key(&mut self, token: &KeyToken);

    /// Pointer button newly pressed (held buttons do not repeat)
    fn on_click(&mut self, button: MouseButton, x: i32, y: i32);

    /// Gamepad button pressed or released
    fn on_button(&mut self, id: u32, pressed: bool);

    /// Fixed-rate update
    fn on_tick(&mut self);

    /// Pointer moved
    fn on_move(&mut self, _x: i32, _y: i32) {}

    /// Pointer attached or detached
    fn on_pointer_presence(&mut self, _attached: bool) {}

    /// Fatal fault observed just before the loop stops
    fn on_fault(&mut self, _error: &Error) {}
}

/// Input acquisition strategy
pub trait InputBackend: Release {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Run until interrupted, the host closes, or a fatal fault
    fn drive(&mut self, dispatcher: &mut Dispatcher, hooks: &mut dyn AppHooks) -> Result<Exit>;
}

/// Why the loop stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Interrupt signal or application request
    Interrupted,
    /// The host event loop or its event source finished
    HostClosed,
}

/// Loop counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub iterations: u64,
    pub events: u64,
    pub ticks: u64,
}

/// Routes events to hooks and fires the fixed-rate tick
pub struct Dispatcher {
    clock: Box<dyn Clock>,
    scheduler: TickScheduler,
    interrupt: Interrupt,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(clock: Box<dyn Clock>, tick_interval: Duration, interrupt: Interrupt) -> Self {
        let scheduler = TickScheduler::new(tick_interval, clock.now());
        Self {
            clock,
            scheduler,
            interrupt,
            stats: DispatchStats::default(),
        }
    }

    /// Run `backend` to completion
    pub fn run<B: InputBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        hooks: &mut dyn AppHooks,
    ) -> Result<Exit> {
        info!(
            "Dispatch loop starting ({} backend, tick every {:?})",
            backend.name(),
            self.scheduler.interval()
        );

        let result = backend.drive(self, hooks);
        match &result {
            Ok(exit) => info!("Dispatch loop stopped: {:?}", exit),
            Err(e) => {
                warn!("Dispatch loop terminated: {}", e);
                hooks.on_fault(e);
            }
        }
        info!(
            "{} iterations, {} events, {} ticks",
            self.stats.iterations, self.stats.events, self.stats.ticks
        );
        result
    }

    /// Deliver one event to its hook
    pub fn route(&mut self, event: InputEvent, hooks: &mut dyn AppHooks) {
        self.stats.events += 1;
        match event {
            InputEvent::KeyPress { token } => {
                debug!("key {}", token);
                hooks.on_key(&token);
            }
            InputEvent::PointerMove { x, y } => hooks.on_move(x, y),
            InputEvent::PointerButtonDown { button, x, y } => {
                debug!("click {:?} at ({}, {})", button, x, y);
                hooks.on_click(button, x, y);
            }
            InputEvent::ButtonChange { id, pressed } => {
                debug!("button {} {}", id, if pressed { "down" } else { "up" });
                hooks.on_button(id, pressed);
            }
        }
    }

    /// Fire `on_tick` if an interval has elapsed since the last tick
    pub fn tick_if_due(&mut self, hooks: &mut dyn AppHooks) -> bool {
        if self.scheduler.due(self.clock.now()) {
            self.stats.ticks += 1;
            hooks.on_tick();
            true
        } else {
            false
        }
    }

    /// Fire `on_tick` unconditionally (the host already paced it)
    pub fn tick_now(&mut self, hooks: &mut dyn AppHooks) {
        self.scheduler.mark(self.clock.now());
        self.stats.ticks += 1;
        hooks.on_tick();
    }

    /// Count one completed loop iteration
    pub fn end_iteration(&mut self) {
        self.stats.iterations += 1;
    }

    pub fn interrupted(&self) -> bool {
        self.interrupt.is_requested()
    }

    pub fn tick_interval(&self) -> Duration {
        self.scheduler.interval()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}
