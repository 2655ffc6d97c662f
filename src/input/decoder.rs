//! Key sequence decoding
//!
//! Reassembles raw TTY bytes into logical keys. Arrow and function keys
//! arrive as multi-byte escape sequences that may be split across reads.

use std::fmt;

use serde::Deserialize;

use super::keycodes;
use crate::constants::{CSI_BYTE, ESC, MAX_SEQUENCE_LEN, SS3_BYTE};

/// One logical key: a single byte or a complete escape sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub struct KeyToken(Vec<u8>);

impl KeyToken {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Well-known key name (`"Up"`, `"F5"`, `"Enter"`, ...)
    pub fn name(&self) -> Option<&'static str> {
        keycodes::name_of(&self.0)
    }

    /// Is this an escape sequence (as opposed to a plain byte)?
    pub fn is_sequence(&self) -> bool {
        self.0.len() > 1 && self.0[0] == ESC
    }
}

impl From<String> for KeyToken {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for KeyToken {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name() {
            return f.write_str(name);
        }
        for &b in &self.0 {
            match b {
                0x20..=0x7e => write!(f, "{}", b as char)?,
                ESC => f.write_str("ESC")?,
                _ => write!(f, "\\x{:02x}", b)?,
            }
        }
        Ok(())
    }
}

/// Outcome of scanning the front of the buffer
enum Scan {
    /// A token of this many bytes is complete
    Token(usize),
    /// A sequence has started but more bytes are needed
    Incomplete,
}

/// Stateful escape sequence decoder
///
/// The pending buffer is empty whenever no sequence is in flight.
///
/// Decoding is byte-level: outside an escape sequence every byte is its own
/// token, so a multi-byte UTF-8 character arrives as one token per byte.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Vec<u8>,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every key they complete
    ///
    /// A trailing partial sequence stays buffered for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyToken> {
        self.pending.extend_from_slice(bytes);

        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < self.pending.len() {
            match scan(&self.pending[pos..]) {
                Scan::Token(len) => {
                    tokens.push(KeyToken::new(&self.pending[pos..pos + len]));
                    pos += len;
                }
                Scan::Incomplete => break,
            }
        }
        self.pending.drain(..pos);

        tokens
    }

    /// Give up waiting on a partial sequence and deliver it as-is
    ///
    /// A lone ESC key press looks exactly like the start of a sequence,
    /// so the caller flushes after a short quiet period.
    pub fn flush(&mut self) -> Option<KeyToken> {
        if self.pending.is_empty() {
            return None;
        }
        Some(KeyToken(std::mem::take(&mut self.pending)))
    }

    /// Is a partial sequence buffered?
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn scan(buf: &[u8]) -> Scan {
    if buf[0] != ESC {
        return Scan::Token(1);
    }
    let Some(&second) = buf.get(1) else {
        return Scan::Incomplete;
    };
    match second {
        CSI_BYTE => scan_csi(buf),
        SS3_BYTE => match buf.get(2) {
            Some(0x40..=0x7e) => Scan::Token(3),
            Some(_) => Scan::Token(2),
            None => Scan::Incomplete,
        },
        // Alt+key or a bare ESC followed by typing
        _ => Scan::Token(1),
    }
}

/// `ESC [` parameters* final
fn scan_csi(buf: &[u8]) -> Scan {
    // Linux console F1-F5: ESC [ [ A..E
    if buf.get(2) == Some(&CSI_BYTE) {
        return match buf.get(3) {
            Some(b'A'..=b'E') => Scan::Token(4),
            Some(_) => Scan::Token(3),
            None => Scan::Incomplete,
        };
    }
    for (i, &b) in buf.iter().enumerate().skip(2) {
        if i >= MAX_SEQUENCE_LEN {
            return Scan::Token(i);
        }
        match b {
            0x30..=0x3f => continue,
            0x40..=0x7e => return Scan::Token(i + 1),
            // Unexpected byte: pass the prefix through, rescan from here
            _ => return Scan::Token(i),
        }
    }
    Scan::Incomplete
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(dec: &mut KeyDecoder, bytes: &[u8]) -> Vec<Vec<u8>> {
        dec.feed(bytes).into_iter().map(|t| t.0).collect()
    }

    #[test]
    fn test_plain_byte() {
        let mut dec = KeyDecoder::new();
        assert_eq!(feed(&mut dec, b"a"), vec![b"a".to_vec()]);
        assert!(!dec.has_pending());
    }

    #[test]
    fn test_plain_run() {
        let mut dec = KeyDecoder::new();
        assert_eq!(feed(&mut dec, b"hi"), vec![b"h".to_vec(), b"i".to_vec()]);
    }

    #[test]
    fn test_arrow_key() {
        let mut dec = KeyDecoder::new();
        let tokens = dec.feed(b"\x1b[A");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].as_bytes(), b"\x1b[A");
        assert_eq!(tokens[0].name(), Some("Up"));
    }

    #[test]
    fn test_split_arrow_key() {
        let mut dec = KeyDecoder::new();
        assert!(dec.feed(b"\x1b").is_empty());
        assert!(dec.has_pending());
        assert_eq!(feed(&mut dec, b"[A"), vec![b"\x1b[A".to_vec()]);
        assert!(!dec.has_pending());
    }

    #[test]
    fn test_split_after_bracket() {
        let mut dec = KeyDecoder::new();
        assert!(dec.feed(b"x\x1b[").len() == 1);
        assert_eq!(feed(&mut dec, b"B"), vec![b"\x1b[B".to_vec()]);
    }

    #[test]
    fn test_tilde_terminated() {
        let mut dec = KeyDecoder::new();
        let tokens = dec.feed(b"\x1b[1~");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].as_bytes(), b"\x1b[1~");
        assert!(!dec.has_pending());
    }

    #[test]
    fn test_tilde_split() {
        let mut dec = KeyDecoder::new();
        assert!(dec.feed(b"\x1b[1").is_empty());
        assert_eq!(feed(&mut dec, b"~"), vec![b"\x1b[1~".to_vec()]);
    }

    #[test]
    fn test_two_digit_function_key() {
        let mut dec = KeyDecoder::new();
        let tokens = dec.feed(b"\x1b[15~q");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].name(), Some("F5"));
        assert_eq!(tokens[1].as_bytes(), b"q");
    }

    #[test]
    fn test_ss3_function_key() {
        let mut dec = KeyDecoder::new();
        let tokens = dec.feed(b"\x1bOP");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name(), Some("F1"));
    }

    #[test]
    fn test_linux_console_function_key() {
        let mut dec = KeyDecoder::new();
        assert!(dec.feed(b"\x1b[[").is_empty());
        let tokens = dec.feed(b"C");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name(), Some("F3"));
    }

    #[test]
    fn test_malformed_passes_through() {
        let mut dec = KeyDecoder::new();
        // Control byte where a parameter or final byte belongs
        let tokens = feed(&mut dec, b"\x1b[1\x07z");
        assert_eq!(
            tokens,
            vec![b"\x1b[1".to_vec(), b"\x07".to_vec(), b"z".to_vec()]
        );
        assert!(!dec.has_pending());
    }

    #[test]
    fn test_escape_restarts_sequence() {
        let mut dec = KeyDecoder::new();
        let tokens = feed(&mut dec, b"\x1b[\x1b[C");
        assert_eq!(tokens, vec![b"\x1b[".to_vec(), b"\x1b[C".to_vec()]);
    }

    #[test]
    fn test_overlong_sequence_bounded() {
        let mut dec = KeyDecoder::new();
        let mut bytes = b"\x1b[".to_vec();
        bytes.extend(std::iter::repeat(b'1').take(20));
        let tokens = dec.feed(&bytes);
        assert_eq!(tokens[0].as_bytes().len(), MAX_SEQUENCE_LEN);
        assert!(dec.feed(b"~").len() >= 1);
        assert!(!dec.has_pending());
    }

    #[test]
    fn test_alt_key() {
        let mut dec = KeyDecoder::new();
        assert_eq!(feed(&mut dec, b"\x1bx"), vec![b"\x1b".to_vec(), b"x".to_vec()]);
    }

    #[test]
    fn test_utf8_arrives_byte_by_byte() {
        let mut dec = KeyDecoder::new();
        assert_eq!(
            feed(&mut dec, "é".as_bytes()),
            vec![vec![0xc3], vec![0xa9]]
        );
        assert!(!dec.has_pending());
    }

    #[test]
    fn test_flush_lone_escape() {
        let mut dec = KeyDecoder::new();
        assert!(dec.feed(b"\x1b").is_empty());
        let token = dec.flush().unwrap();
        assert_eq!(token.name(), Some("Escape"));
        assert!(dec.flush().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyToken::from("a").to_string(), "a");
        assert_eq!(KeyToken::new(b"\x1b[D".to_vec()).to_string(), "Left");
        assert_eq!(KeyToken::new(vec![0x01]).to_string(), "\\x01");
    }
}
