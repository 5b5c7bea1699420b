// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Raw frame buffer and wire constants
//!
//! On the line a frame looks like
//!
//! ```text
//! STX ( LF label SP value SP checksum CR )* ETX
//! ```
//!
//! There is no length field. [`RawFrame`] holds the bytes found between
//! `STX` and `ETX`, markers excluded.

use std::borrow::Cow;

use super::checksum::checksum;
use super::tag::Tag;

/// Start of text, opens a frame when it directly follows [`ETX`].
pub const STX: u8 = 0x02;
/// End of text, closes a frame.
pub const ETX: u8 = 0x03;
/// Line feed, opens a group.
pub const LF: u8 = 0x0A;
/// Carriage return, closes a group.
pub const CR: u8 = 0x0D;
/// Separator between label, value and checksum.
pub const SP: u8 = 0x20;

/// Upper bound on the body of one frame.
///
/// A historic single-phase frame is under 200 bytes; anything longer means
/// the end marker was lost and the reader must resynchronise.
pub const MAX_FRAME_LEN: usize = 1024;

/// Bytes collected between two protocol delimiters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Vec<u8>,
}

impl RawFrame {
    /// Create an empty frame with room for a typical body.
    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(256),
        }
    }

    /// Wrap an already delimited body.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Append one byte; returns `false` once [`MAX_FRAME_LEN`] is reached.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.bytes.len() >= MAX_FRAME_LEN {
            return false;
        }
        self.bytes.push(byte);
        true
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame body as text. Teleinfo is 7-bit ASCII, anything else is replaced.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Append one `LF label SP value SP checksum CR` group to `out`.
pub fn encode_group(tag: &str, value: &str, out: &mut Vec<u8>) {
    out.push(LF);
    out.extend_from_slice(tag.as_bytes());
    out.push(SP);
    out.extend_from_slice(value.as_bytes());
    out.push(SP);
    out.push(checksum(tag, value));
    out.push(CR);
}

/// Build a complete `STX ... ETX` frame from `(tag, value)` pairs.
pub fn encode_frame(groups: &[(Tag, &str)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + groups.len() * 20);
    out.push(STX);
    for (tag, value) in groups {
        encode_group(tag.name(), value, &mut out);
    }
    out.push(ETX);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_group_layout() {
        let mut out = Vec::new();
        encode_group("IINST", "003", &mut out);
        assert_eq!(out, b"\nIINST 003 Z\r");
    }

    #[test]
    fn test_encode_frame_has_markers() {
        let frame = encode_frame(&[(Tag::Isousc, "30"), (Tag::Imax, "030")]);
        assert_eq!(frame.first(), Some(&STX));
        assert_eq!(frame.last(), Some(&ETX));
        assert_eq!(&frame[1..frame.len() - 1], b"\nISOUSC 30 9\r\nIMAX 030 B\r");
    }

    #[test]
    fn test_raw_frame_is_bounded() {
        let mut frame = RawFrame::new();
        for _ in 0..MAX_FRAME_LEN {
            assert!(frame.push(b'A'));
        }
        assert!(!frame.push(b'A'));
        assert_eq!(frame.len(), MAX_FRAME_LEN);
        frame.clear();
        assert!(frame.is_empty());
    }
}
