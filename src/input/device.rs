//! Device interfaces consumed by the polling backend
//!
//! Implemented by the real drivers in this module tree and by
//! in-memory fakes in tests.

use super::edge::{ButtonChange, ButtonStateSet};
use super::event::MouseButton;
use crate::error::Result;
use crate::session::Release;

/// Non-blocking byte stream (TTY stdin)
pub trait RawInputStream: Release {
    /// Bytes that can be read right now without blocking
    ///
    /// May overstate what `read` returns; end-of-input is reported by
    /// whichever of the two notices it first.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `n` bytes; empty if nothing is ready
    fn read(&mut self, n: usize) -> Result<Vec<u8>>;
}

/// One level sample from a pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerSample {
    pub buttons: ButtonStateSet<MouseButton>,
    pub x: i32,
    pub y: i32,
}

/// Mouse or other pointing device
pub trait PointerDevice: Release {
    /// New sample, or `None` when nothing changed since the last poll
    fn poll(&mut self) -> Result<Option<PointerSample>>;

    /// Is a physical pointer currently attached?
    fn is_attached(&self) -> bool;
}

/// Gamepad with poll-and-diff semantics
pub trait GamepadDevice: Release {
    /// Refresh state; true if any button changed
    fn poll(&mut self) -> Result<bool>;

    /// Changes recorded since the last `clear_changes`
    fn changes(&self) -> &[ButtonChange<u32>];

    fn clear_changes(&mut self);

    /// Is a gamepad currently connected?
    fn is_attached(&self) -> bool;
}
