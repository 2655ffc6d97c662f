//! Normalized input events
//!
//! Every backend, polled or host-driven, produces these.

use bitflags::bitflags;
use serde::Deserialize;

use super::decoder::KeyToken;
use crate::constants::{BTN_LEFT, BTN_MIDDLE, BTN_RIGHT};

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Any other evdev button code
    Other(u32),
}

impl MouseButton {
    /// Map an evdev button code (BTN_*)
    pub fn from_code(code: u32) -> Self {
        match code {
            BTN_LEFT => MouseButton::Left,
            BTN_RIGHT => MouseButton::Right,
            BTN_MIDDLE => MouseButton::Middle,
            other => MouseButton::Other(other),
        }
    }
}

/// Normalized input event
///
/// Produced once by a backend and consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    /// Decoded key (single byte or whole escape sequence)
    KeyPress { token: KeyToken },
    /// Pointer moved to absolute display coordinates
    PointerMove { x: i32, y: i32 },
    /// Pointer button newly pressed
    PointerButtonDown { button: MouseButton, x: i32, y: i32 },
    /// Gamepad button edge
    ButtonChange { id: u32, pressed: bool },
}

bitflags! {
    /// Event kinds a host event loop can be subscribed to
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventKinds: u8 {
        const KEY = 0b0001;
        const POINTER_MOVE = 0b0010;
        const POINTER_BUTTON = 0b0100;
        const GAMEPAD_BUTTON = 0b1000;
    }
}

impl InputEvent {
    /// Kind flag of this event
    pub fn kind(&self) -> EventKinds {
        match self {
            InputEvent::KeyPress { .. } => EventKinds::KEY,
            InputEvent::PointerMove { .. } => EventKinds::POINTER_MOVE,
            InputEvent::PointerButtonDown { .. } => EventKinds::POINTER_BUTTON,
            InputEvent::ButtonChange { .. } => EventKinds::GAMEPAD_BUTTON,
        }
    }
}
