// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the teleinfo daemon
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema before it is deserialized.
//!
//! ## Configuration Structure
//!
//! - `acquisition`: where the teleinfo stream comes from
//! - `aggregation`: window period, capacity and overflow behaviour
//! - `persistence`: SQLite database receiving the records
//!
//! ## Usage
//!
//! ```no_run
//! use rust_teleinfo::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("/dev/ttyUSB0".to_string()), // Serial device
//!     None,                             // Database
//!     Some(60),                         // Interval
//!     None,                             // Source
//!     None,                             // Input file
//! );
//!
//! println!("Aggregation interval: {}s", config.aggregation.interval_secs);
//! ```

pub mod acquisition;
pub mod aggregation;
pub mod persistence;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use acquisition::{AcquisitionConfig, SourceKind};
pub use aggregation::AggregationConfig;
pub use persistence::PersistenceConfig;
pub use utils::output_config_schema;

/// Root configuration structure of the daemon.
///
/// Every section falls back to its defaults when absent from the file, so
/// an empty document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Teleinfo stream source and serial line settings.
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Aggregation window settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Database receiving the aggregated records.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Check a YAML document against the embedded schema.
    pub fn validate_yaml(contents: &str) -> Result<()> {
        let yaml_value: serde_yml::Value =
            serde_yml::from_str(contents).context("Failed to parse YAML configuration")?;

        // An empty document stands for all defaults
        let json_value = match serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?
        {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            value => value,
        };

        let schema: serde_json::Value =
            serde_json::from_str(utils::CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        if let Err(error) = validator.validate(&json_value) {
            anyhow::bail!("Configuration validation failed: {}", error);
        }
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default values. A file failing
    /// validation leaves a `<name>.sample.yaml` with defaults next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(err) = Self::validate_yaml(&contents) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            return Err(err.context(format!("Invalid configuration file {}", path.display())));
        }

        let config: Config = if contents.trim().is_empty() {
            Self::default()
        } else {
            match serde_yml::from_str(&contents) {
                Ok(config) => config,
                Err(err) => {
                    error!("Configuration deserialization error: {}", err);
                    if let Err(e) = Self::create_sample_config(path) {
                        error!("Failed to create sample config: {}", e);
                    }
                    return Err(anyhow::anyhow!(
                        "Failed to deserialize configuration from {}: {}",
                        path.display(),
                        err
                    ));
                }
            }
        };

        if let Err(err) = utils::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only the values actually given on the command line are applied.
    ///
    /// # Parameters
    ///
    /// * `serial_device` - Serial device the meter is connected to
    /// * `database` - SQLite database path, also enables persistence
    /// * `interval_secs` - Aggregation period in seconds
    /// * `source` - Stream source kind
    /// * `input_file` - Capture file for the `file` source
    pub fn apply_args(
        &mut self,
        serial_device: Option<String>,
        database: Option<PathBuf>,
        interval_secs: Option<u64>,
        source: Option<SourceKind>,
        input_file: Option<PathBuf>,
    ) {
        if let Some(device) = serial_device {
            debug!("Overriding serial device from command line: {}", device);
            self.acquisition.serial_device = device;
        }

        if let Some(database) = database {
            debug!("Overriding database from command line: {:?}", database);
            self.persistence.database = database.to_string_lossy().to_string();
            self.persistence.enabled = true;
        }

        if let Some(interval) = interval_secs {
            debug!("Overriding aggregation interval from command line: {}", interval);
            self.aggregation.interval_secs = interval;
        }

        if let Some(file) = input_file {
            debug!("Overriding input file from command line: {:?}", file);
            self.acquisition.input_file = Some(file.to_string_lossy().to_string());
            // A capture file implies the file source unless told otherwise
            if source.is_none() {
                self.acquisition.source = SourceKind::File;
            }
        }

        if let Some(source) = source {
            debug!("Overriding source from command line: {:?}", source);
            self.acquisition.source = source;
        }
    }

    /// Re-run the cross-field checks, e.g. after [`apply_args`](Self::apply_args).
    pub fn validate(&self) -> Result<()> {
        utils::validate_specific_rules(self)
    }
}
