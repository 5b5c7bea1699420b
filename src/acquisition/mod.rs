// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Teleinfo acquisition module
//!
//! This module reads the teleinfo byte stream from a serial line, from a
//! captured file or from a synthetic meter, cuts it into frames and feeds the
//! validated fields into the aggregation buffer.

use std::io::{self, Read};

use anyhow::{Context, Result};
use log::info;

pub mod daemon;
mod file;
pub mod frame_reader;
pub mod mock;
mod serial;

pub use daemon::{AcquisitionDaemon, AcquisitionStats, StatsSnapshot};
pub use file::FileSource;
pub use frame_reader::{FrameError, FrameReader};
pub use mock::MockMeter;
pub use serial::SerialSource;

use crate::config::{AcquisitionConfig, SourceKind};

/// A byte stream carrying teleinfo frames.
///
/// A `read` returning `Ok(0)` means the line stayed idle for the whole read
/// timeout, not end of stream.
pub trait TeleinfoSource: Read + Send {
    /// Drop any input received but not yet read.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Human readable origin of the stream, used in logs
    fn describe(&self) -> String;
}

impl TeleinfoSource for Box<dyn TeleinfoSource> {
    fn discard_input(&mut self) -> io::Result<()> {
        (**self).discard_input()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Open the source selected by the acquisition configuration.
pub fn open_source(config: &AcquisitionConfig) -> Result<Box<dyn TeleinfoSource>> {
    let source: Box<dyn TeleinfoSource> = match config.source {
        SourceKind::Serial => Box::new(
            SerialSource::open(
                &config.serial_device,
                config.baud_rate,
                config.read_timeout(),
            )
            .with_context(|| format!("Failed to open serial port {}", config.serial_device))?,
        ),
        SourceKind::File => {
            let path = config
                .input_file
                .as_deref()
                .context("File source selected without an input file")?;
            Box::new(
                FileSource::open(path, config.loop_playback, config.read_timeout())
                    .with_context(|| format!("Failed to open teleinfo capture {}", path))?,
            )
        }
        SourceKind::Mock => Box::new(MockMeter::new(config.mock_frame_period())),
    };
    info!("Using teleinfo source: {}", source.describe());
    Ok(source)
}
