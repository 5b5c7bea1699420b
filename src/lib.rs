// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust Teleinfo library
//!
//! Acquisition of the historic teleinfo output of French electricity meters,
//! windowed aggregation of the readings and persistence of one record per
//! window.

pub mod acquisition;
pub mod aggregation;
pub mod config;
pub mod daemon;
pub mod persistence;
pub mod protocol;
pub mod utility;
