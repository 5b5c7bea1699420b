// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::aggregation::MAX_WINDOW_CAPACITY;
use super::{Config, SourceKind};
use crate::persistence::sqlite::is_valid_identifier;

/// Embedded JSON schema of the configuration file
pub(crate) const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./teleinfod --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Validates the configuration against rules the JSON schema does not express.
///
/// # Validation Rules
///
/// - **Periods**: `interval_secs`, `read_timeout_ms` and `mock_frame_period_ms`
///   must be non-zero
/// - **Window**: `window_capacity` must be between 1 and
///   [`MAX_WINDOW_CAPACITY`]
/// - **Serial line**: `baud_rate` must be non-zero
/// - **File source**: requires `input_file`
/// - **Table name**: must be a plain SQL identifier since it is spliced into
///   the statements
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.aggregation.interval_secs == 0 {
        anyhow::bail!("Aggregation interval must be at least one second");
    }

    if config.aggregation.window_capacity == 0 {
        anyhow::bail!("Aggregation window capacity must be at least 1");
    }

    if config.aggregation.window_capacity > MAX_WINDOW_CAPACITY {
        anyhow::bail!(
            "Aggregation window capacity {} exceeds the maximum of {}",
            config.aggregation.window_capacity,
            MAX_WINDOW_CAPACITY
        );
    }

    if config.acquisition.read_timeout_ms == 0 {
        anyhow::bail!("Serial read timeout must be at least 1 ms");
    }

    if config.acquisition.baud_rate == 0 {
        anyhow::bail!("Invalid baud rate: {}", config.acquisition.baud_rate);
    }

    if config.acquisition.source == SourceKind::Mock && config.acquisition.mock_frame_period_ms == 0
    {
        anyhow::bail!("Mock frame period must be at least 1 ms");
    }

    if config.acquisition.source == SourceKind::File {
        match config.acquisition.input_file.as_deref() {
            None | Some("") => anyhow::bail!("File source selected without an input_file"),
            Some(file) => debug!("Teleinfo capture file: {}", file),
        }
    }

    if !is_valid_identifier(&config.persistence.table) {
        anyhow::bail!(
            "Invalid table name '{}', expected letters, digits and underscores",
            config.persistence.table
        );
    }

    if config.persistence.enabled && config.persistence.database.trim().is_empty() {
        anyhow::bail!("Persistence enabled without a database path");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(validate_specific_rules(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.aggregation.interval_secs = 0;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_window_capacity_bounds() {
        let mut config = Config::default();
        config.aggregation.window_capacity = MAX_WINDOW_CAPACITY;
        assert!(validate_specific_rules(&config).is_ok());
        config.aggregation.window_capacity = MAX_WINDOW_CAPACITY + 1;
        let err = validate_specific_rules(&config).unwrap_err();
        assert!(err.to_string().contains("exceeds the maximum"));
    }

    #[test]
    fn test_schema_caps_window_capacity() {
        let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA).unwrap();
        let capacity = &schema["properties"]["aggregation"]["properties"]["window_capacity"];
        assert_eq!(capacity["maximum"].as_u64(), Some(MAX_WINDOW_CAPACITY as u64));
    }

    #[test]
    fn test_file_source_needs_input() {
        let mut config = Config::default();
        config.acquisition.source = SourceKind::File;
        assert!(validate_specific_rules(&config).is_err());
        config.acquisition.input_file = Some("capture.raw".to_string());
        assert!(validate_specific_rules(&config).is_ok());
    }

    #[test]
    fn test_table_must_be_identifier() {
        let mut config = Config::default();
        config.persistence.table = "teleinfo; DROP TABLE x".to_string();
        let err = validate_specific_rules(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid table name"));
    }

    #[test]
    fn test_embedded_schema_is_json() {
        let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA).unwrap();
        assert_eq!(schema["type"], "object");
    }
}
