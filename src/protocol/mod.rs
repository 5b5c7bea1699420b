// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Teleinfo wire protocol
//!
//! This module covers the historic teleinfo format emitted by French
//! residential meters: frame delimiters, the fixed set of tags, per-group
//! checksums and extraction of tagged values from one frame.
//!
//! ## Usage
//!
//! ```
//! use rust_teleinfo::protocol::{encode_frame, extract, RawFrame, Tag};
//!
//! let wire = encode_frame(&[(Tag::Papp, "00650"), (Tag::Iinst, "003")]);
//! // Strip STX/ETX the way the frame reader does
//! let frame = RawFrame::from_bytes(&wire[1..wire.len() - 1]);
//! let extraction = extract(&frame);
//! assert!(extraction.is_valid());
//! assert_eq!(extraction.snapshot.int(Tag::Papp), 650);
//! ```

pub mod checksum;
pub mod extractor;
pub mod frame;
pub mod tag;

pub use checksum::{checksum, is_valid};
pub use extractor::{extract, find_field, parse_int, Extraction, Field, Snapshot};
pub use frame::{encode_frame, encode_group, RawFrame, CR, ETX, LF, MAX_FRAME_LEN, SP, STX};
pub use tag::{Tag, UnknownTag, TAG_COUNT};
