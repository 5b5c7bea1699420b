// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Teleinfo acquisition configuration
//!
//! This module defines where the teleinfo byte stream comes from and how the
//! serial line is set up.

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Origin of the teleinfo byte stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Meter connected to a serial port
    #[default]
    Serial,
    /// Raw capture replayed from a file
    File,
    /// Synthetic meter
    Mock,
}

/// Configuration for the acquisition of teleinfo frames.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AcquisitionConfig {
    /// Source of the byte stream.
    #[serde(default)]
    pub source: SourceKind,

    /// Serial device the meter output is wired to.
    #[serde(default = "default_serial_device")]
    pub serial_device: String,

    /// Line speed in baud. Historic teleinfo runs at 1200.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Longest wait for a single byte, in milliseconds.
    ///
    /// When it expires the reader logs the idle line and keeps waiting, it
    /// also bounds how long a stop request may take to be noticed.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Capture file read by the `file` source.
    #[serde(default)]
    pub input_file: Option<String>,

    /// Start the capture over once its end is reached.
    #[serde(default)]
    pub loop_playback: bool,

    /// Period between two frames of the `mock` source, in milliseconds.
    #[serde(default = "default_mock_frame_period_ms")]
    pub mock_frame_period_ms: u64,
}

fn default_serial_device() -> String {
    "/dev/ttyAMA0".to_string()
}

fn default_baud_rate() -> u32 {
    1200
}

fn default_read_timeout_ms() -> u64 {
    8000
}

fn default_mock_frame_period_ms() -> u64 {
    1000
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            serial_device: default_serial_device(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            input_file: None,
            loop_playback: false,
            mock_frame_period_ms: default_mock_frame_period_ms(),
        }
    }
}

impl AcquisitionConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn mock_frame_period(&self) -> Duration {
        Duration::from_millis(self.mock_frame_period_ms)
    }
}
