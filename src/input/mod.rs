//! Input handling
//!
//! Normalize keyboard, pointer and gamepad input into `InputEvent`s.
//! - Raw TTY stdin, decoded into key tokens (arrow keys, function keys)
//! - Mouse via libinput, sampled as button levels
//! - Gamepads via gilrs
//! - Edge tracking: level samples → press/release changes

pub mod decoder;
pub mod device;
pub mod edge;
pub mod event;
pub mod gamepad;
pub mod keyboard;
pub mod keycodes;
pub mod pointer;

pub use decoder::{KeyDecoder, KeyToken};
pub use device::{GamepadDevice, PointerDevice, PointerSample, RawInputStream};
pub use edge::{diff, ButtonChange, ButtonStateSet, ReleasePolicy};
pub use event::{EventKinds, InputEvent, MouseButton};
pub use gamepad::GilrsGamepad;
pub use keyboard::TtyInput;
pub use pointer::LibinputPointer;
