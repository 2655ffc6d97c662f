//! Global constants for jamloop
//!
//! Consolidates timing, escape sequence and device constants
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Timing Constants
// ============================================================================

/// Default update tick rate (Hz)
pub const DEFAULT_REFRESH_HZ: f64 = 60.0;

/// Default sleep between polling iterations in milliseconds.
/// Only bounds CPU spin; the tick is driven by the clock, not this sleep.
pub const DEFAULT_IDLE_SLEEP_MS: u64 = 2;

/// Consecutive empty polls before a lone ESC is delivered as a key
pub const DEFAULT_ESCAPE_FLUSH_POLLS: u32 = 3;

// ============================================================================
// Escape Sequences
// ============================================================================

/// Escape introducer
pub const ESC: u8 = 0x1b;

/// Control Sequence Introducer second byte (`ESC [`)
pub const CSI_BYTE: u8 = b'[';

/// Single Shift 3 second byte (`ESC O`, VT function keys)
pub const SS3_BYTE: u8 = b'O';

/// Longest escape sequence kept in the decode buffer
pub const MAX_SEQUENCE_LEN: usize = 16;

/// Largest single read from the raw input stream
pub const READ_CHUNK: usize = 256;

// ============================================================================
// Pointer Buttons (linux/input-event-codes.h)
// ============================================================================

/// Left mouse button
pub const BTN_LEFT: u32 = 0x110;

/// Right mouse button
pub const BTN_RIGHT: u32 = 0x111;

/// Middle mouse button
pub const BTN_MIDDLE: u32 = 0x112;

// ============================================================================
// Display
// ============================================================================

/// Default display width when no configuration is provided
pub const DEFAULT_DISPLAY_WIDTH: u32 = 720;

/// Default display height when no configuration is provided
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 400;

/// Default libinput seat
pub const DEFAULT_SEAT: &str = "seat0";
