//! jamloop - run the dispatch loop against real devices or a replay script
//!
//! The bundled application only logs what it receives; `q` quits.

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use jamloop::config::{BackendKind, Config};
use jamloop::host::{ChannelHost, HostMessage, ReplayScript};
use jamloop::input::{GilrsGamepad, LibinputPointer, TtyInput};
use jamloop::session::{setup_signal_handlers, Interrupt, ResourceGuard};
use jamloop::{
    AppHooks, Dispatcher, Error, Exit, InputBackend, KeyToken, MonotonicClock, MouseButton,
    PollingBackend, QueuedBackend,
};

/// Print help message
fn print_help() {
    println!(
        r#"jamloop {} - input and frame dispatch loop

USAGE:
    jamloop [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -c, --config PATH       Load config from PATH
    --queued                Use the host-driven backend
    --replay FILE           Feed the host-driven backend from a replay script
    --no-pointer            Do not open a pointer device
    --no-gamepad            Do not open gamepads
    --init-config           Write the default config file

EXAMPLES:
    jamloop                           Poll TTY, mouse and gamepads
    jamloop --replay demo.toml        Simulate input from a script
    RUST_LOG=debug jamloop            Log every routed event

CONFIG FILE:
    ~/.config/jamloop/config.toml
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Value following `flag` on the command line
fn flag_value(args: &[String], short: &str, long: &str) -> Result<Option<String>> {
    match args.iter().position(|a| a == short || a == long) {
        Some(i) => args
            .get(i + 1)
            .cloned()
            .map(Some)
            .ok_or_else(|| anyhow!("{} requires a value", long)),
        None => Ok(None),
    }
}

/// Demo application: log input, count ticks
struct DemoApp {
    interrupt: Interrupt,
    ticks: u64,
}

impl AppHooks for DemoApp {
    fn on_key(&mut self, token: &KeyToken) {
        info!("key: {}", token);
        if token.as_bytes() == b"q" {
            self.interrupt.request();
        }
    }

    fn on_click(&mut self, button: MouseButton, x: i32, y: i32) {
        info!("click: {:?} at ({}, {})", button, x, y);
    }

    fn on_button(&mut self, id: u32, pressed: bool) {
        info!("button {}: {}", id, if pressed { "pressed" } else { "released" });
    }

    fn on_tick(&mut self) {
        self.ticks += 1;
    }

    fn on_pointer_presence(&mut self, attached: bool) {
        info!("pointer {}", if attached { "shown" } else { "hidden" });
    }

    fn on_fault(&mut self, error: &Error) {
        eprintln!("jamloop: {}", error);
    }
}

/// Build the polling backend; optional devices that fail to open are skipped
fn polling_backend(cfg: &Config) -> Result<PollingBackend> {
    let tty = TtyInput::open().context("Failed to open terminal input")?;
    let mut backend = PollingBackend::new()
        .with_stream(tty)
        .idle_sleep(cfg.idle_sleep())
        .escape_flush_polls(cfg.input.escape_flush_polls);

    if cfg.input.pointer {
        match LibinputPointer::open(&cfg.input.seat, cfg.display.width, cfg.display.height) {
            Ok(pointer) => backend = backend.with_pointer(pointer),
            Err(e) => warn!("Pointer unavailable: {}", e),
        }
    }

    if cfg.input.gamepad {
        match GilrsGamepad::open() {
            Ok(gamepad) => backend = backend.with_gamepad(gamepad),
            Err(e) => warn!("Gamepad unavailable: {}", e),
        }
    }

    Ok(backend)
}

/// Build the host-driven backend fed by a replay script
///
/// Without a script the returned sender must outlive the loop; dropping it
/// closes the host.
fn queued_backend(
    replay: Option<PathBuf>,
) -> Result<(QueuedBackend<ChannelHost>, Option<Sender<HostMessage>>)> {
    let (tx, host) = ChannelHost::new();
    let idle_sender = match replay {
        Some(path) => {
            let script = ReplayScript::load(&path)
                .with_context(|| format!("Failed to load replay {}", path.display()))?;
            info!("Replaying {:?} of input", script.duration());
            script.spawn(tx).context("Failed to start replay")?;
            None
        }
        None => Some(tx),
    };
    Ok((QueuedBackend::new(host), idle_sender))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("jamloop {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.iter().any(|a| a == "--init-config") {
        let path = Config::write_default().context("Failed to generate config")?;
        println!("Config file generated: {}", path.display());
        return Ok(());
    }

    info!("jamloop starting...");

    let mut cfg = match flag_value(&args, "-c", "--config")? {
        Some(path) => Config::load_from_file(&PathBuf::from(path))?,
        None => Config::load(),
    };
    let replay = flag_value(&args, "--replay", "--replay")?.map(PathBuf::from);
    if args.iter().any(|a| a == "--queued") || replay.is_some() {
        cfg.input.backend = BackendKind::Queued;
    }
    if args.iter().any(|a| a == "--no-pointer") {
        cfg.input.pointer = false;
    }
    if args.iter().any(|a| a == "--no-gamepad") {
        cfg.input.gamepad = false;
    }

    setup_signal_handlers()?;
    let interrupt = Interrupt::with_signals();

    let (backend, _idle_sender): (Box<dyn InputBackend>, Option<Sender<HostMessage>>) =
        match cfg.input.backend {
            BackendKind::Polling => (Box::new(polling_backend(&cfg)?), None),
            BackendKind::Queued => {
                let (backend, sender) = queued_backend(replay)?;
                (Box::new(backend), sender)
            }
        };

    let mut dispatcher = Dispatcher::new(
        Box::new(MonotonicClock::new()),
        cfg.tick_interval(),
        interrupt.clone(),
    );
    let mut app = DemoApp {
        interrupt,
        ticks: 0,
    };

    let mut guard = ResourceGuard::new(backend);
    let exit = guard.run(|backend| dispatcher.run(backend.as_mut(), &mut app))?;

    match exit {
        Exit::Interrupted => info!("Interrupted after {} ticks", app.ticks),
        Exit::HostClosed => info!("Host closed after {} ticks", app.ticks),
    }
    Ok(())
}
