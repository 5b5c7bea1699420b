// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Aggregation scheduler
//!
//! Every interval the scheduler flushes the shared window and writes one
//! record to the persistence sink. Cycles are skipped until a frame has
//! latched the energy indices, so no all-zero record is ever written after
//! start-up. A failed write is logged and the window is lost.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::{debug, error, info, warn};
use tokio::time::{self, Instant, MissedTickBehavior};

use super::SharedAggregationBuffer;
use crate::persistence::{AggregatedRecord, PersistenceSink};
use crate::utility::ShutdownSignal;

/// Default aggregation period
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Result of one scheduler cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No index latched yet
    Skipped,
    /// Record written to the sink
    Emitted(AggregatedRecord),
    /// Record built but the sink refused it
    Failed(AggregatedRecord),
}

pub struct AggregationScheduler {
    buffer: SharedAggregationBuffer,
    sink: Arc<dyn PersistenceSink>,
    interval: Duration,
    shutdown: ShutdownSignal,
}

impl AggregationScheduler {
    pub fn new(
        buffer: SharedAggregationBuffer,
        sink: Arc<dyn PersistenceSink>,
        interval: Duration,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            buffer,
            sink,
            interval,
            shutdown,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Flush the window once and persist the result.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Some(summary) = self.buffer.flush_if_ready() else {
            debug!("Aggregation cycle skipped, no meter index received yet");
            return CycleOutcome::Skipped;
        };

        if summary.samples == 0 {
            warn!("Aggregation window closed without any sample, means reported as 0");
        }
        if summary.overflowed > 0 {
            warn!(
                "Aggregation window overflowed: {} frames hit the {} sample limit",
                summary.overflowed, summary.samples
            );
        }

        let record = AggregatedRecord::from_summary(&summary, Local::now().naive_local());
        let sink = Arc::clone(&self.sink);
        let to_store = record.clone();
        let written = tokio::task::spawn_blocking(move || sink.upsert(&to_store)).await;

        match written {
            Ok(Ok(())) => {
                info!(
                    "Stored teleinfo record {} in {} ({} samples, IINST={:.2} PAPP={:.2})",
                    record.timestamp_text(),
                    self.sink.name(),
                    summary.samples,
                    record.mean_current,
                    record.mean_power
                );
                CycleOutcome::Emitted(record)
            }
            Ok(Err(e)) => {
                error!(
                    "Failed to store teleinfo record {} in {}: {}",
                    record.timestamp_text(),
                    self.sink.name(),
                    e
                );
                CycleOutcome::Failed(record)
            }
            Err(e) => {
                error!("Persistence task for {} failed: {}", self.sink.name(), e);
                CycleOutcome::Failed(record)
            }
        }
    }

    /// Run cycles every interval until the shutdown signal is triggered.
    ///
    /// The first cycle happens one full interval after start.
    pub async fn run(self) {
        info!(
            "Aggregation scheduler started, interval {:?}, sink {}",
            self.interval,
            self.sink.name()
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.shutdown.is_running() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = self.shutdown.wait() => break,
            }
        }

        info!("Aggregation scheduler stopped");
    }
}
