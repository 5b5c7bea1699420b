// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Acquisition daemon module
//!
//! This module provides the frame-processing loop: read a frame, extract and
//! validate its fields, then commit the snapshot into the shared aggregation
//! buffer. The loop is blocking and is meant to run on a dedicated thread.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Result;
use log::{debug, error, info, warn};

use super::{FrameError, FrameReader, TeleinfoSource};
use crate::aggregation::{CommitOutcome, SharedAggregationBuffer};
use crate::protocol::{extract, RawFrame, Tag};
use crate::utility::ShutdownSignal;

/// Pause after a non-transient read error before trying again
const ERROR_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Frame counters shared with the heartbeat task
#[derive(Debug, Default)]
pub struct AcquisitionStats {
    frames: AtomicU64,
    committed: AtomicU64,
    corrupted: AtomicU64,
    incomplete: AtomicU64,
    overflowed: AtomicU64,
    read_errors: AtomicU64,
}

/// Point-in-time copy of [`AcquisitionStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames: u64,
    pub committed: u64,
    pub corrupted: u64,
    pub incomplete: u64,
    pub overflowed: u64,
    pub read_errors: u64,
}

impl AcquisitionStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            corrupted: self.corrupted.load(Ordering::Relaxed),
            incomplete: self.incomplete.load(Ordering::Relaxed),
            overflowed: self.overflowed.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}

/// What happened to one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Committed(CommitOutcome),
    /// At least one group failed its checksum
    Corrupted,
    /// HCHP, HCHC or PAPP empty or absent
    Incomplete,
}

pub struct AcquisitionDaemon<S> {
    reader: FrameReader<S>,
    buffer: SharedAggregationBuffer,
    stats: Arc<AcquisitionStats>,
    shutdown: ShutdownSignal,
}

impl<S: TeleinfoSource> AcquisitionDaemon<S> {
    pub fn new(source: S, buffer: SharedAggregationBuffer, shutdown: ShutdownSignal) -> Self {
        Self {
            reader: FrameReader::new(source),
            buffer,
            stats: Arc::new(AcquisitionStats::default()),
            shutdown,
        }
    }

    /// Share the counters with another task.
    pub fn stats(&self) -> Arc<AcquisitionStats> {
        Arc::clone(&self.stats)
    }

    /// Read and process frames until the shutdown signal is triggered.
    pub fn run(mut self) -> Result<()> {
        info!(
            "Frame processing started on {}",
            self.reader.source().describe()
        );

        loop {
            match self.reader.read_frame(&self.shutdown) {
                Ok(frame) => {
                    self.process_frame(&frame);
                }
                Err(FrameError::Stopped) => break,
                Err(e @ FrameError::Oversized(_)) => {
                    self.stats.read_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("{}, resynchronising", e);
                }
                Err(e) => {
                    self.stats.read_errors.fetch_add(1, Ordering::Relaxed);
                    error!("{}", e);
                    std::thread::sleep(ERROR_RETRY_DELAY);
                }
            }
        }

        info!(
            "Frame processing stopped after {} frames",
            self.stats.frames.load(Ordering::Relaxed)
        );
        Ok(())
    }

    /// Validate one frame and commit it if usable.
    pub fn process_frame(&self, frame: &RawFrame) -> FrameOutcome {
        self.stats.frames.fetch_add(1, Ordering::Relaxed);

        let extraction = extract(frame);
        if !extraction.is_valid() {
            self.stats.corrupted.fetch_add(1, Ordering::Relaxed);
            return FrameOutcome::Corrupted;
        }

        let snapshot = extraction.snapshot;
        if !(snapshot.has(Tag::Hchp) && snapshot.has(Tag::Hchc) && snapshot.has(Tag::Papp)) {
            debug!(
                "Frame skipped, empty values HCHP='{}' HCHC='{}' PAPP='{}'",
                snapshot.get(Tag::Hchp).unwrap_or_default(),
                snapshot.get(Tag::Hchc).unwrap_or_default(),
                snapshot.get(Tag::Papp).unwrap_or_default()
            );
            self.stats.incomplete.fetch_add(1, Ordering::Relaxed);
            return FrameOutcome::Incomplete;
        }

        if let Some(adps) = snapshot.get(Tag::Adps) {
            info!("Overcurrent warning: {} A", adps);
        }

        let outcome = self.buffer.commit(&snapshot);
        match outcome {
            CommitOutcome::Incomplete => {
                self.stats.incomplete.fetch_add(1, Ordering::Relaxed);
                return FrameOutcome::Incomplete;
            }
            CommitOutcome::Rejected | CommitOutcome::Evicted => {
                self.stats.overflowed.fetch_add(1, Ordering::Relaxed);
            }
            CommitOutcome::Stored => {}
        }
        self.stats.committed.fetch_add(1, Ordering::Relaxed);
        FrameOutcome::Committed(outcome)
    }
}
