// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Serial line source
//!
//! Teleinfo is sent as 7 data bits, even parity, one stop bit, without flow
//! control. Each read waits at most the configured timeout.

use std::io::{self, Read};
use std::time::Duration;

use anyhow::Result;
use log::debug;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use super::TeleinfoSource;

pub struct SerialSource {
    port: Box<dyn SerialPort>,
    device: String,
}

impl SerialSource {
    /// Open `device` in teleinfo line mode.
    pub fn open(device: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        debug!(
            "Opening serial port {} at {} baud, 7E1, timeout {:?}",
            device, baud_rate, timeout
        );
        let port = serialport::new(device, baud_rate)
            .data_bits(DataBits::Seven)
            .parity(Parity::Even)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()?;
        Ok(Self {
            port,
            device: device.to_string(),
        })
    }
}

impl Read for SerialSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl TeleinfoSource for SerialSource {
    fn discard_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    fn describe(&self) -> String {
        format!("serial port {}", self.device)
    }
}
