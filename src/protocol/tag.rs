// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Teleinfo tag names
//!
//! A single-phase meter in historic mode transmits a fixed set of labelled
//! groups. Only the labels listed here are extracted; anything else in a
//! frame is ignored.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of recognised tags.
pub const TAG_COUNT: usize = 12;

/// Label of one information group transmitted by the meter.
///
/// The declaration order is the canonical extraction order and is also the
/// slot index used by [`Snapshot`](super::Snapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Meter identifier
    Adco,
    /// Rate option (`BASE`, `HC..`, `EJP.`, ...)
    Optarif,
    /// Subscribed current ceiling in A
    Isousc,
    /// Peak-hour cumulative index in Wh
    Hchp,
    /// Off-peak-hour cumulative index in Wh
    Hchc,
    /// Current tariff period
    Ptec,
    /// Instantaneous current in A
    Iinst,
    /// Maximum current in A
    Imax,
    /// Apparent power in VA
    Papp,
    /// Peak/off-peak schedule code
    Hhphc,
    /// Meter status word
    Motdetat,
    /// Overcurrent alarm, only present while the subscribed ceiling is exceeded
    Adps,
}

impl Tag {
    /// All tags in canonical order.
    pub const ALL: [Tag; TAG_COUNT] = [
        Tag::Adco,
        Tag::Optarif,
        Tag::Isousc,
        Tag::Hchp,
        Tag::Hchc,
        Tag::Ptec,
        Tag::Iinst,
        Tag::Imax,
        Tag::Papp,
        Tag::Hhphc,
        Tag::Motdetat,
        Tag::Adps,
    ];

    /// Label exactly as transmitted on the line.
    pub const fn name(self) -> &'static str {
        match self {
            Tag::Adco => "ADCO",
            Tag::Optarif => "OPTARIF",
            Tag::Isousc => "ISOUSC",
            Tag::Hchp => "HCHP",
            Tag::Hchc => "HCHC",
            Tag::Ptec => "PTEC",
            Tag::Iinst => "IINST",
            Tag::Imax => "IMAX",
            Tag::Papp => "PAPP",
            Tag::Hhphc => "HHPHC",
            Tag::Motdetat => "MOTDETAT",
            Tag::Adps => "ADPS",
        }
    }

    /// Position of the tag in [`Tag::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a label is not one of the recognised tags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown teleinfo tag '{0}'")]
pub struct UnknownTag(pub String);

impl FromStr for Tag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .iter()
            .copied()
            .find(|tag| tag.name() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}
