//! End-to-end dispatch loop tests with in-memory devices
//!
//! The polling loop runs with a manual clock and no idle sleep; the clock
//! advances from inside the fake stream so every iteration is deterministic.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use jamloop::dispatch::{Dispatcher, Exit, ManualClock, PollingBackend, QueuedBackend};
use jamloop::host::{ChannelHost, HostMessage};
use jamloop::input::{
    ButtonChange, ButtonStateSet, GamepadDevice, InputEvent, KeyToken, MouseButton,
    PointerDevice, PointerSample, RawInputStream,
};
use jamloop::session::{Interrupt, Release, ResourceGuard};
use jamloop::{AppHooks, Error, InputBackend, Result};

const TICK: Duration = Duration::from_millis(10);

/// Shared log of everything the application saw
type Log = Rc<RefCell<Vec<String>>>;

struct App {
    log: Log,
    interrupt: Interrupt,
    /// Request an interrupt once this many ticks have fired
    stop_after_ticks: u32,
    ticks: u32,
    faults: u32,
}

impl App {
    fn new(log: Log, interrupt: Interrupt, stop_after_ticks: u32) -> Self {
        Self {
            log,
            interrupt,
            stop_after_ticks,
            ticks: 0,
            faults: 0,
        }
    }
}

impl AppHooks for App {
    fn on_key(&mut self, token: &KeyToken) {
        self.log.borrow_mut().push(format!("key {}", token));
    }

    fn on_click(&mut self, button: MouseButton, x: i32, y: i32) {
        self.log
            .borrow_mut()
            .push(format!("click {:?} {} {}", button, x, y));
    }

    fn on_button(&mut self, id: u32, pressed: bool) {
        self.log.borrow_mut().push(format!("button {} {}", id, pressed));
    }

    fn on_tick(&mut self) {
        self.ticks += 1;
        self.log.borrow_mut().push("tick".into());
        if self.ticks >= self.stop_after_ticks {
            self.interrupt.request();
        }
    }

    fn on_pointer_presence(&mut self, attached: bool) {
        self.log.borrow_mut().push(format!("presence {}", attached));
    }

    fn on_fault(&mut self, _error: &Error) {
        self.faults += 1;
    }
}

/// Byte stream that hands out one chunk per poll and moves the clock
///
/// Each `bytes_available` call is one loop iteration; the clock advances by
/// the step scheduled for that iteration (default one tick).
struct ScriptedStream {
    chunks: VecDeque<Vec<u8>>,
    clock: ManualClock,
    steps: VecDeque<Duration>,
    fail_on_empty: bool,
    releases: Rc<Cell<u32>>,
    held: bool,
}

impl ScriptedStream {
    fn new(clock: &ManualClock, chunks: &[&[u8]], releases: Rc<Cell<u32>>) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            clock: clock.clone(),
            steps: VecDeque::new(),
            fail_on_empty: false,
            releases,
            held: true,
        }
    }
}

impl RawInputStream for ScriptedStream {
    fn bytes_available(&mut self) -> Result<usize> {
        self.clock.advance(self.steps.pop_front().unwrap_or(TICK));
        match self.chunks.front() {
            Some(chunk) => Ok(chunk.len()),
            None if self.fail_on_empty => Err(Error::StreamClosed),
            None => Ok(0),
        }
    }

    fn read(&mut self, _n: usize) -> Result<Vec<u8>> {
        Ok(self.chunks.pop_front().unwrap_or_default())
    }
}

impl Release for ScriptedStream {
    fn release(&mut self) -> Result<()> {
        if self.held {
            self.held = false;
            self.releases.set(self.releases.get() + 1);
        }
        Ok(())
    }
}

/// Pointer that replays level samples, then keeps reporting the last one
struct ScriptedPointer {
    samples: VecDeque<PointerSample>,
    last: Option<PointerSample>,
}

impl PointerDevice for ScriptedPointer {
    fn poll(&mut self) -> Result<Option<PointerSample>> {
        if let Some(sample) = self.samples.pop_front() {
            self.last = Some(sample);
        }
        Ok(self.last.clone())
    }

    fn is_attached(&self) -> bool {
        true
    }
}

impl Release for ScriptedPointer {
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Gamepad that diffs scripted level samples the way a driver would
struct ScriptedGamepad {
    samples: VecDeque<ButtonStateSet<u32>>,
    previous: Option<ButtonStateSet<u32>>,
    changes: Vec<ButtonChange<u32>>,
}

impl GamepadDevice for ScriptedGamepad {
    fn poll(&mut self) -> Result<bool> {
        let Some(current) = self.samples.pop_front() else {
            return Ok(false);
        };
        self.changes = jamloop::input::diff(
            self.previous.as_ref(),
            &current,
            jamloop::input::ReleasePolicy::Report,
        );
        self.previous = Some(current);
        Ok(!self.changes.is_empty())
    }

    fn changes(&self) -> &[ButtonChange<u32>] {
        &self.changes
    }

    fn clear_changes(&mut self) {
        self.changes.clear();
    }

    fn is_attached(&self) -> bool {
        true
    }
}

impl Release for ScriptedGamepad {
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

fn dispatcher(clock: &ManualClock, interrupt: &Interrupt) -> Dispatcher {
    Dispatcher::new(Box::new(clock.clone()), TICK, interrupt.clone())
}

fn buttons(ids: &[MouseButton]) -> ButtonStateSet<MouseButton> {
    ids.iter().copied().collect()
}

#[test]
fn test_events_precede_tick_within_iteration() {
    let clock = ManualClock::new();
    let interrupt = Interrupt::new();
    let releases = Rc::new(Cell::new(0));
    let log: Log = Rc::default();

    let stream = ScriptedStream::new(&clock, &[b"a\x1b[A"], releases.clone());
    let mut backend = PollingBackend::new()
        .with_stream(stream)
        .idle_sleep(Duration::ZERO);
    let mut d = dispatcher(&clock, &interrupt);
    let mut app = App::new(log.clone(), interrupt.clone(), 2);

    let exit = d.run(&mut backend, &mut app).unwrap();
    assert_eq!(exit, Exit::Interrupted);
    assert_eq!(*log.borrow(), vec!["key a", "key Up", "tick", "tick"]);
}

#[test]
fn test_held_buttons_do_not_refire() {
    let clock = ManualClock::new();
    let interrupt = Interrupt::new();
    let log: Log = Rc::default();

    let pointer = ScriptedPointer {
        samples: VecDeque::from(vec![
            PointerSample {
                buttons: buttons(&[MouseButton::Left]),
                x: 360,
                y: 200,
            },
            PointerSample {
                buttons: buttons(&[MouseButton::Left]),
                x: 360,
                y: 200,
            },
            PointerSample {
                buttons: buttons(&[MouseButton::Left, MouseButton::Right]),
                x: 360,
                y: 200,
            },
        ]),
        last: None,
    };
    let gamepad = ScriptedGamepad {
        samples: VecDeque::from(vec![
            [0].into_iter().collect(),
            [0].into_iter().collect(),
            ButtonStateSet::new(),
        ]),
        previous: None,
        changes: Vec::new(),
    };
    let stream = ScriptedStream::new(&clock, &[], Rc::default());
    let mut backend = PollingBackend::new()
        .with_stream(stream)
        .with_pointer(pointer)
        .with_gamepad(gamepad)
        .idle_sleep(Duration::ZERO);
    let mut d = dispatcher(&clock, &interrupt);
    let mut app = App::new(log.clone(), interrupt.clone(), 4);

    d.run(&mut backend, &mut app).unwrap();

    let log = log.borrow();
    let clicks: Vec<&String> = log.iter().filter(|l| l.starts_with("click")).collect();
    assert_eq!(clicks, vec!["click Left 360 200", "click Right 360 200"]);
    let pad: Vec<&String> = log.iter().filter(|l| l.starts_with("button")).collect();
    assert_eq!(pad, vec!["button 0 true", "button 0 false"]);
    assert_eq!(log[0], "presence true");
}

#[test]
fn test_stall_yields_single_tick() {
    let clock = ManualClock::new();
    let interrupt = Interrupt::new();
    let log: Log = Rc::default();

    let mut stream = ScriptedStream::new(&clock, &[], Rc::default());
    // One long stall (25 ticks worth), then the loop keeps polling with no time passing
    stream.steps = std::iter::once(TICK * 25)
        .chain(std::iter::repeat(Duration::ZERO).take(50))
        .collect();
    let mut backend = PollingBackend::new()
        .with_stream(stream)
        .idle_sleep(Duration::ZERO);
    let mut d = dispatcher(&clock, &interrupt);
    let mut app = App::new(log.clone(), interrupt.clone(), 2);

    d.run(&mut backend, &mut app).unwrap();

    // First iteration ticks once for the stall; 50 frozen iterations add
    // nothing; the next tick needs a full interval afterwards.
    let stats = d.stats();
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.iterations, 52);
}

#[test]
fn test_fatal_fault_releases_once() {
    let clock = ManualClock::new();
    let interrupt = Interrupt::new();
    let releases = Rc::new(Cell::new(0));
    let log: Log = Rc::default();

    let mut stream = ScriptedStream::new(&clock, &[b"x"], releases.clone());
    stream.fail_on_empty = true;
    let backend: Box<dyn InputBackend> = Box::new(
        PollingBackend::new()
            .with_stream(stream)
            .idle_sleep(Duration::ZERO),
    );
    let mut d = dispatcher(&clock, &interrupt);
    let mut app = App::new(log.clone(), interrupt.clone(), u32::MAX);

    let mut guard = ResourceGuard::new(backend);
    let result = guard.run(|backend| d.run(backend.as_mut(), &mut app));

    assert!(matches!(result, Err(Error::StreamClosed)));
    assert_eq!(app.faults, 1);
    assert_eq!(releases.get(), 1);

    guard.release().unwrap();
    assert_eq!(releases.get(), 1);
    assert_eq!(*log.borrow(), vec!["key x", "tick"]);
}

#[test]
fn test_interrupt_releases_once() {
    let clock = ManualClock::new();
    let interrupt = Interrupt::new();
    let releases = Rc::new(Cell::new(0));

    let stream = ScriptedStream::new(&clock, &[], releases.clone());
    let backend = PollingBackend::new()
        .with_stream(stream)
        .idle_sleep(Duration::ZERO);
    let mut d = dispatcher(&clock, &interrupt);
    let mut app = App::new(Rc::default(), interrupt.clone(), 3);

    let mut guard = ResourceGuard::new(backend);
    let exit = guard.run(|backend| d.run(backend, &mut app)).unwrap();

    assert_eq!(exit, Exit::Interrupted);
    assert_eq!(app.ticks, 3);
    assert_eq!(releases.get(), 1);
}

#[test]
fn test_queued_backend_shares_routing() {
    let clock = ManualClock::new();
    let interrupt = Interrupt::new();
    let log: Log = Rc::default();

    let (tx, host) = ChannelHost::new();
    tx.send(HostMessage::Event(InputEvent::KeyPress {
        token: KeyToken::new(b"\x1bOP".to_vec()),
    }))
    .unwrap();
    tx.send(HostMessage::Event(InputEvent::PointerButtonDown {
        button: MouseButton::Left,
        x: 7,
        y: 9,
    }))
    .unwrap();
    tx.send(HostMessage::Event(InputEvent::ButtonChange { id: 3, pressed: true }))
        .unwrap();
    drop(tx);

    // The sender is gone, so the host closes once the queue is drained
    let backend = QueuedBackend::new(host);
    let mut d = Dispatcher::new(Box::new(clock), TICK, interrupt.clone());
    let mut app = App::new(log.clone(), interrupt.clone(), u32::MAX);

    let mut guard = ResourceGuard::new(backend);
    let exit = guard.run(|backend| d.run(backend, &mut app)).unwrap();

    assert_eq!(exit, Exit::HostClosed);
    assert_eq!(
        *log.borrow(),
        vec!["key F1", "click Left 7 9", "button 3 true"]
    );
}
