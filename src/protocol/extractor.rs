// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Field extraction
//!
//! Each recognised tag is looked up in the frame body and the text that
//! follows it is split on whitespace into `label value checksum`.
//!
//! The checksum byte may itself be a space (0x20). A whitespace split then
//! swallows it and the third token becomes the next group's label, or is
//! missing at the end of the frame. Any checksum token that is not exactly
//! one byte long is therefore folded back to a single space before the
//! group is validated.

use log::warn;

use super::checksum;
use super::frame::{RawFrame, SP};
use super::tag::{Tag, TAG_COUNT};

/// Longest value accepted for any tag. `ADCO` carries 12 characters.
pub const MAX_VALUE_LEN: usize = 16;

/// One `(label, value, checksum)` triple found in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub tag: Tag,
    pub value: String,
    pub checksum: u8,
}

impl Field {
    /// Whether the transmitted checksum matches the label and value.
    pub fn is_valid(&self) -> bool {
        self.value.len() <= MAX_VALUE_LEN
            && checksum::is_valid(self.tag.name(), &self.value, self.checksum)
    }
}

/// Latest parsed value for each tag of one frame.
///
/// A fresh snapshot has every slot empty, so a tag missing from the frame
/// never inherits a value from an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    values: [Option<String>; TAG_COUNT],
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `tag`, `None` when absent or empty.
    pub fn get(&self, tag: Tag) -> Option<&str> {
        self.values[tag.index()]
            .as_deref()
            .filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, tag: Tag, value: impl Into<String>) {
        self.values[tag.index()] = Some(value.into());
    }

    /// Whether `tag` carries a non-empty value.
    pub fn has(&self, tag: Tag) -> bool {
        self.get(tag).is_some()
    }

    /// Value of `tag` converted with [`parse_int`], 0 when absent.
    pub fn int(&self, tag: Tag) -> i64 {
        self.get(tag).map(parse_int).unwrap_or(0)
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        self.values = Default::default();
    }
}

/// Outcome of one extraction pass over a frame.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Values of the groups whose checksum matched
    pub snapshot: Snapshot,
    /// Tags found in the frame whose checksum did not match
    pub corrupted: Vec<Tag>,
}

impl Extraction {
    /// A frame is usable only if none of its recognised groups is corrupted.
    pub fn is_valid(&self) -> bool {
        self.corrupted.is_empty()
    }
}

/// Run every recognised tag over `frame`.
pub fn extract(frame: &RawFrame) -> Extraction {
    let text = frame.as_text();
    let mut extraction = Extraction::default();

    for tag in Tag::ALL {
        let Some(field) = find_field(&text, tag) else {
            continue;
        };
        if field.is_valid() {
            extraction.snapshot.set(tag, field.value);
        } else {
            warn!(
                "Teleinfo data [{}] corrupted (value '{}', checksum {:#04x})",
                tag, field.value, field.checksum
            );
            extraction.corrupted.push(tag);
        }
    }

    extraction
}

/// Locate `tag` in `text` and split what follows into a [`Field`].
///
/// A match must stand alone: preceded by the start of the text or
/// whitespace, followed by whitespace. This keeps `HCHC` from matching
/// inside a value such as `HCHC..`.
pub fn find_field(text: &str, tag: Tag) -> Option<Field> {
    let name = tag.name();
    let bytes = text.as_bytes();

    let start = text.match_indices(name).map(|(i, _)| i).find(|&i| {
        let before_ok = i == 0 || bytes[i - 1].is_ascii_whitespace();
        let after = i + name.len();
        let after_ok = bytes.get(after).is_some_and(|b| b.is_ascii_whitespace());
        before_ok && after_ok
    })?;

    let mut tokens = text[start + name.len()..].split_ascii_whitespace();
    let value = tokens.next().unwrap_or_default().to_string();
    let checksum = match tokens.next() {
        Some(token) if token.len() == 1 => token.as_bytes()[0],
        _ => SP,
    };

    Some(Field {
        tag,
        value,
        checksum,
    })
}

/// Convert a value the way C `atoi` does.
///
/// Leading whitespace and one sign are accepted, then as many digits as
/// present; anything unparsable yields 0. Overflow saturates.
pub fn parse_int(value: &str) -> i64 {
    let s = value.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::{encode_group, ETX, STX};

    fn body(groups: &[(&str, &str)]) -> RawFrame {
        let mut out = Vec::new();
        for (tag, value) in groups {
            encode_group(tag, value, &mut out);
        }
        RawFrame::from_bytes(out)
    }

    fn full_frame() -> RawFrame {
        body(&[
            ("ADCO", "031138001788"),
            ("OPTARIF", "HC.."),
            ("ISOUSC", "30"),
            ("HCHP", "012345678"),
            ("HCHC", "008765432"),
            ("PTEC", "HP.."),
            ("IINST", "003"),
            ("IMAX", "030"),
            ("PAPP", "00650"),
            ("HHPHC", "D"),
            ("MOTDETAT", "000000"),
            ("ADPS", "033"),
        ])
    }

    #[test]
    fn test_full_frame_populates_every_tag() {
        let extraction = extract(&full_frame());
        assert!(extraction.is_valid(), "corrupted: {:?}", extraction.corrupted);
        for tag in Tag::ALL {
            assert!(extraction.snapshot.has(tag), "{tag} missing");
        }
        assert_eq!(extraction.snapshot.get(Tag::Adco), Some("031138001788"));
        assert_eq!(extraction.snapshot.get(Tag::Ptec), Some("HP.."));
        assert_eq!(extraction.snapshot.int(Tag::Hchp), 12_345_678);
        assert_eq!(extraction.snapshot.int(Tag::Papp), 650);
    }

    #[test]
    fn test_space_checksum_is_folded_back() {
        // PTEC HP.. has a space checksum and is followed by another group
        let frame = body(&[("PTEC", "HP.."), ("IINST", "003")]);
        assert!(frame.as_bytes().windows(3).any(|w| w == b"  \r"));

        let field = find_field(&frame.as_text(), Tag::Ptec).unwrap();
        assert_eq!(field.value, "HP..");
        assert_eq!(field.checksum, SP);
        assert!(field.is_valid());
    }

    #[test]
    fn test_space_checksum_at_end_of_frame() {
        let frame = body(&[("IINST", "003"), ("PTEC", "HP..")]);
        let field = find_field(&frame.as_text(), Tag::Ptec).unwrap();
        assert_eq!(field.checksum, SP);
        assert!(extract(&frame).is_valid());
    }

    #[test]
    fn test_corrupted_checksum_is_reported() {
        let mut bytes = full_frame().as_bytes().to_vec();
        // IINST 003 Z -> IINST 003 [
        let pos = bytes
            .windows(11)
            .position(|w| w == b"IINST 003 Z")
            .unwrap();
        bytes[pos + 10] += 1;

        let extraction = extract(&RawFrame::from_bytes(bytes));
        assert!(!extraction.is_valid());
        assert_eq!(extraction.corrupted, vec![Tag::Iinst]);
        assert!(!extraction.snapshot.has(Tag::Iinst));
    }

    #[test]
    fn test_missing_tag_leaves_slot_empty() {
        let frame = body(&[("HCHP", "012345678"), ("PAPP", "00650")]);
        let extraction = extract(&frame);
        assert!(extraction.is_valid());
        assert!(!extraction.snapshot.has(Tag::Hchc));
        assert_eq!(extraction.snapshot.int(Tag::Hchc), 0);
    }

    #[test]
    fn test_tag_inside_value_is_not_matched() {
        // OPTARIF value "HC.." must not satisfy a lookup for HCHC
        let frame = body(&[("OPTARIF", "HC..")]);
        assert!(find_field(&frame.as_text(), Tag::Hchc).is_none());
        // ISOUSC must not be found inside a longer label
        let frame = RawFrame::from_bytes(b"\nXISOUSC 30 9\r".to_vec());
        assert!(find_field(&frame.as_text(), Tag::Isousc).is_none());
    }

    #[test]
    fn test_oversized_value_is_corrupted() {
        let value = "0".repeat(MAX_VALUE_LEN + 1);
        let frame = body(&[("ADCO", &value)]);
        assert_eq!(extract(&frame).corrupted, vec![Tag::Adco]);
    }

    #[test]
    fn test_markers_inside_body_are_ignored() {
        let mut bytes = vec![STX];
        encode_group("IMAX", "030", &mut bytes);
        bytes.push(ETX);
        let extraction = extract(&RawFrame::from_bytes(bytes));
        assert_eq!(extraction.snapshot.int(Tag::Imax), 30);
    }

    #[test]
    fn test_parse_int_follows_atoi() {
        assert_eq!(parse_int("012345678"), 12_345_678);
        assert_eq!(parse_int("  42abc"), 42);
        assert_eq!(parse_int("-7"), -7);
        assert_eq!(parse_int("+7"), 7);
        assert_eq!(parse_int("HP.."), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("99999999999999999999999"), i64::MAX);
    }

    #[test]
    fn test_snapshot_clear() {
        let mut snapshot = Snapshot::new();
        snapshot.set(Tag::Papp, "00650");
        snapshot.set(Tag::Adps, "");
        assert!(snapshot.has(Tag::Papp));
        assert!(!snapshot.has(Tag::Adps));
        snapshot.clear();
        assert!(!snapshot.has(Tag::Papp));
    }
}
