//! Gamepad input via gilrs
//!
//! gilrs keeps per-pad button state up to date as its event queue is
//! drained. Each poll samples the active pad's buttons and diffs them
//! against the previous sample.

use gilrs::{Button, EventType, GamepadId, Gilrs};
use log::{info, warn};

use super::device::GamepadDevice;
use super::edge::{diff, ButtonChange, ButtonStateSet, ReleasePolicy};
use crate::error::{Error, Result};
use crate::session::Release;

/// Button identifiers handed to applications are indices into this table
pub const BUTTONS: [Button; 19] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::C,
    Button::Z,
    Button::LeftTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

/// Stable id for a gilrs button
pub fn button_id(button: Button) -> Option<u32> {
    BUTTONS.iter().position(|&b| b == button).map(|i| i as u32)
}

/// Forget the last sample, returning a release for every button it held
fn release_held(previous: &mut Option<ButtonStateSet<u32>>) -> Vec<ButtonChange<u32>> {
    diff(
        previous.take().as_ref(),
        &ButtonStateSet::new(),
        ReleasePolicy::Report,
    )
}

/// First connected gamepad, tracked through gilrs
pub struct GilrsGamepad {
    gilrs: Gilrs,
    /// Pad whose buttons are reported
    active: Option<GamepadId>,
    /// Last sample; `None` right after (re)connect
    previous: Option<ButtonStateSet<u32>>,
    /// Changes since the last clear
    changes: Vec<ButtonChange<u32>>,
}

impl GilrsGamepad {
    pub fn open() -> Result<Self> {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => gilrs,
            Err(gilrs::Error::NotImplemented(dummy)) => {
                warn!("Gamepads not supported on this platform");
                dummy
            }
            Err(e) => return Err(Error::device("gamepad", e)),
        };

        let active = gilrs.gamepads().next().map(|(id, pad)| {
            info!("Gamepad attached: {}", pad.name());
            id
        });

        Ok(Self {
            gilrs,
            active,
            previous: None,
            changes: Vec::new(),
        })
    }

    fn sample(&self, id: GamepadId) -> ButtonStateSet<u32> {
        let pad = self.gilrs.gamepad(id);
        BUTTONS
            .iter()
            .enumerate()
            .filter(|&(_, &button)| pad.is_pressed(button))
            .map(|(i, _)| i as u32)
            .collect()
    }
}

impl GamepadDevice for GilrsGamepad {
    fn poll(&mut self) -> Result<bool> {
        let mut released = false;
        while let Some(event) = self.gilrs.next_event() {
            match event.event {
                EventType::Connected if self.active.is_none() => {
                    info!("Gamepad attached: {}", self.gilrs.gamepad(event.id).name());
                    self.active = Some(event.id);
                    self.previous = None;
                }
                EventType::Disconnected if self.active == Some(event.id) => {
                    info!("Gamepad detached");
                    self.active = self
                        .gilrs
                        .gamepads()
                        .map(|(id, _)| id)
                        .find(|&id| id != event.id);
                    let releases = release_held(&mut self.previous);
                    released |= !releases.is_empty();
                    self.changes.extend(releases);
                }
                _ => {}
            }
        }

        let Some(id) = self.active else {
            return Ok(released);
        };

        let current = self.sample(id);
        let edges = diff(self.previous.as_ref(), &current, ReleasePolicy::Report);
        self.previous = Some(current);

        let changed = released || !edges.is_empty();
        self.changes.extend(edges);
        Ok(changed)
    }

    fn changes(&self) -> &[ButtonChange<u32>] {
        &self.changes
    }

    fn clear_changes(&mut self) {
        self.changes.clear();
    }

    fn is_attached(&self) -> bool {
        self.active.is_some()
    }
}

impl Release for GilrsGamepad {
    fn release(&mut self) -> Result<()> {
        // gilrs holds no exclusive claim; just forget recorded state
        self.changes.clear();
        self.previous = None;
        Ok(())
    }
}
