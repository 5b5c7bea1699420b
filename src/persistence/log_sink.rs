// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sink used when persistence is disabled: records only reach the log.

use log::info;

use super::{AggregatedRecord, PersistenceSink, SinkError};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl PersistenceSink for LogSink {
    fn upsert(&self, record: &AggregatedRecord) -> Result<(), SinkError> {
        info!(
            "Teleinfo {}: ISOUSC={} HP={} HC={} PTEC={} IINST={:.2} IMAX={} PAPP={:.2}",
            record.timestamp_text(),
            record.subscribed_current,
            record.peak_index,
            record.off_peak_index,
            record.tariff_period,
            record.mean_current,
            record.max_current,
            record.mean_power
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
