// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Group checksum
//!
//! The meter protects each group with one printable byte: the sum of the
//! label, one separator and the value, keeping the low 6 bits and adding
//! 0x20. The result must match the transmitted byte exactly.

use super::frame::SP;

/// Compute the checksum byte the meter would send for `tag` and `value`.
///
/// The accumulator is 8 bits wide and wraps, as on the device; wrapping
/// does not affect the low 6 bits that are kept.
pub fn checksum(tag: &str, value: &str) -> u8 {
    let sum = tag
        .bytes()
        .chain(value.bytes())
        .fold(SP, |acc, b| acc.wrapping_add(b));
    (sum & 0x3F) + 0x20
}

/// Check a received group against its checksum byte.
pub fn is_valid(tag: &str, value: &str, checksum_byte: u8) -> bool {
    checksum(tag, value) == checksum_byte
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vectors() {
        assert_eq!(checksum("ADCO", "031138001788"), b'?');
        assert_eq!(checksum("OPTARIF", "HC.."), b'<');
        assert_eq!(checksum("ISOUSC", "30"), b'9');
        assert_eq!(checksum("HCHP", "012345678"), b'7');
        assert_eq!(checksum("HCHC", "008765432"), b')');
        assert_eq!(checksum("IINST", "003"), b'Z');
        assert_eq!(checksum("IMAX", "030"), b'B');
        assert_eq!(checksum("PAPP", "00650"), b',');
        assert_eq!(checksum("HHPHC", "D"), b'/');
        assert_eq!(checksum("MOTDETAT", "000000"), b'B');
        assert_eq!(checksum("ADPS", "033"), b'>');
    }

    #[test]
    fn test_space_checksum() {
        // PTEC "HP.." is the classic group whose checksum is the separator itself
        assert_eq!(checksum("PTEC", "HP.."), b' ');
        assert!(is_valid("PTEC", "HP..", b' '));
    }

    #[test]
    fn test_off_by_one_is_rejected() {
        assert!(is_valid("ADCO", "031138001788", b'?'));
        assert!(!is_valid("ADCO", "031138001788", b'?' + 1));
        assert!(!is_valid("ADCO", "031138001788", b'?' - 1));
    }

    #[test]
    fn test_result_is_printable() {
        for value in ["", "0", "999999999", "zzzzzzzzzzzzzzzz"] {
            let c = checksum("MOTDETAT", value);
            assert!((0x20..=0x5F).contains(&c), "checksum {c:#x} out of range");
        }
    }
}
