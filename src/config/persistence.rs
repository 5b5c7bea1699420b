// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Persistence configuration
//!
//! When `enabled` is false aggregated records are only written to the log.

use serde::{Deserialize, Serialize};

use crate::persistence::sqlite::DEFAULT_TABLE;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PersistenceConfig {
    /// Write records to the SQLite database.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Path of the SQLite database file.
    #[serde(default = "default_database")]
    pub database: String,

    /// Table receiving the records, created on first write if missing.
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_enabled() -> bool {
    true
}

fn default_database() -> String {
    "/mnt/usbkey/domotique.sqlite".to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            database: default_database(),
            table: default_table(),
        }
    }
}
