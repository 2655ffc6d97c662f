//! Named key sequences
//!
//! Byte sequences a Linux VT or xterm-compatible terminal sends for
//! non-printing keys, with the names handed to applications.

/// Sequence → key name
const NAMED_KEYS: &[(&[u8], &str)] = &[
    // Control keys
    (b"\r", "Enter"),
    (b"\n", "Enter"),
    (b"\t", "Tab"),
    (b"\x7f", "Backspace"),
    (b"\x08", "Backspace"),
    (b"\x1b", "Escape"),
    // Cursor keys (normal and application mode)
    (b"\x1b[A", "Up"),
    (b"\x1b[B", "Down"),
    (b"\x1b[C", "Right"),
    (b"\x1b[D", "Left"),
    (b"\x1bOA", "Up"),
    (b"\x1bOB", "Down"),
    (b"\x1bOC", "Right"),
    (b"\x1bOD", "Left"),
    // Navigation
    (b"\x1b[H", "Home"),
    (b"\x1b[F", "End"),
    (b"\x1b[1~", "Home"),
    (b"\x1b[4~", "End"),
    (b"\x1b[2~", "Insert"),
    (b"\x1b[3~", "Delete"),
    (b"\x1b[5~", "PageUp"),
    (b"\x1b[6~", "PageDown"),
    // Function keys
    (b"\x1bOP", "F1"),
    (b"\x1bOQ", "F2"),
    (b"\x1bOR", "F3"),
    (b"\x1bOS", "F4"),
    (b"\x1b[[A", "F1"),
    (b"\x1b[[B", "F2"),
    (b"\x1b[[C", "F3"),
    (b"\x1b[[D", "F4"),
    (b"\x1b[[E", "F5"),
    (b"\x1b[15~", "F5"),
    (b"\x1b[17~", "F6"),
    (b"\x1b[18~", "F7"),
    (b"\x1b[19~", "F8"),
    (b"\x1b[20~", "F9"),
    (b"\x1b[21~", "F10"),
    (b"\x1b[23~", "F11"),
    (b"\x1b[24~", "F12"),
];

/// Look up the name of a complete key sequence
pub fn name_of(bytes: &[u8]) -> Option<&'static str> {
    NAMED_KEYS
        .iter()
        .find(|(seq, _)| *seq == bytes)
        .map(|(_, name)| *name)
}
