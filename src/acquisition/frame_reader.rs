// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Frame reader
//!
//! Turns the continuous byte stream of a [`TeleinfoSource`] into one
//! [`RawFrame`] per protocol cycle:
//!
//! 1. discard bytes until `ETX` immediately followed by `STX`,
//! 2. collect bytes verbatim until the next `ETX`.
//!
//! The closing `ETX` of one frame counts as the opening `ETX` of the next,
//! so back-to-back frames are all delivered. A read that returns no data
//! (line idle for the whole timeout) is logged and retried.

use std::io::{self, ErrorKind, Read};

use log::{debug, warn};
use thiserror::Error;

use super::TeleinfoSource;
use crate::protocol::{RawFrame, ETX, MAX_FRAME_LEN, STX};
use crate::utility::ShutdownSignal;

/// Errors that end one frame-reading attempt.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Teleinfo read error: {0}")]
    Io(#[from] io::Error),

    /// No end marker within [`MAX_FRAME_LEN`] bytes
    #[error("Teleinfo frame exceeds {0} bytes without end marker")]
    Oversized(usize),

    #[error("Frame reader stopped")]
    Stopped,
}

pub struct FrameReader<S> {
    source: S,
    last: u8,
    timeouts: u64,
}

impl<S: TeleinfoSource> FrameReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last: 0,
            timeouts: 0,
        }
    }

    /// Number of reads that returned no data so far.
    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Block until one complete frame has been read.
    ///
    /// Returns [`FrameError::Stopped`] as soon as `shutdown` is triggered,
    /// checked before every byte read.
    pub fn read_frame(&mut self, shutdown: &ShutdownSignal) -> Result<RawFrame, FrameError> {
        if let Err(e) = self.source.discard_input() {
            warn!("Unable to flush teleinfo input: {}", e);
        }

        // Wait for end marker followed by start marker
        loop {
            let byte = self.next_byte(shutdown, "start")?;
            let opens = self.last == ETX && byte == STX;
            self.last = byte;
            if opens {
                break;
            }
        }

        let mut frame = RawFrame::new();
        loop {
            let byte = self.next_byte(shutdown, "end")?;
            self.last = byte;
            if byte == ETX {
                return Ok(frame);
            }
            if !frame.push(byte) {
                return Err(FrameError::Oversized(MAX_FRAME_LEN));
            }
        }
    }

    fn next_byte(&mut self, shutdown: &ShutdownSignal, waiting_for: &str) -> Result<u8, FrameError> {
        let mut buf = [0u8; 1];
        loop {
            if !shutdown.is_running() {
                return Err(FrameError::Stopped);
            }
            match self.source.read(&mut buf) {
                // Teleinfo is 7-bit, drop any parity bit left by the line
                Ok(n) if n > 0 => return Ok(buf[0] & 0x7F),
                Ok(_) => self.note_timeout(waiting_for),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    self.note_timeout(waiting_for)
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(FrameError::Io(e)),
            }
        }
    }

    fn note_timeout(&mut self, waiting_for: &str) {
        self.timeouts += 1;
        debug!(
            "No teleinfo data received while waiting for frame {} ({})",
            waiting_for,
            self.source.describe()
        );
    }
}
