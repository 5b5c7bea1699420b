// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Replay of a captured teleinfo byte stream

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use log::debug;

use super::TeleinfoSource;

/// Reads a raw capture as if it were the serial line.
///
/// Once the end of the file is reached the source either starts over
/// (`loop_playback`) or behaves like an idle line: every read sleeps for the
/// idle timeout and returns no data.
pub struct FileSource {
    reader: BufReader<File>,
    path: PathBuf,
    loop_playback: bool,
    idle_timeout: Duration,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P, loop_playback: bool, idle_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        debug!(
            "Replaying teleinfo capture {:?} (loop: {})",
            path, loop_playback
        );
        Ok(Self {
            reader: BufReader::new(file),
            path,
            loop_playback,
            idle_timeout,
        })
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 || buf.is_empty() {
            return Ok(n);
        }
        if self.loop_playback {
            self.reader.seek(SeekFrom::Start(0))?;
            let n = self.reader.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
        }
        std::thread::sleep(self.idle_timeout);
        Ok(0)
    }
}

impl TeleinfoSource for FileSource {
    fn describe(&self) -> String {
        format!("capture file {}", self.path.display())
    }
}
