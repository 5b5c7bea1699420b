// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Persistence of aggregated records
//!
//! The scheduler hands one [`AggregatedRecord`] per window to a
//! [`PersistenceSink`]. Records are keyed by their timestamp and a sink must
//! overwrite an existing record with the same key instead of duplicating it.
//!
//! Available sinks:
//! - [`SqliteSink`]: `INSERT OR REPLACE` into a SQLite table
//! - [`MemorySink`]: in-process map, for tests and tooling
//! - [`LogSink`]: writes records to the log only

pub mod log_sink;
pub mod memory;
pub mod sqlite;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::aggregation::WindowSummary;

pub use log_sink::LogSink;
pub use memory::MemorySink;
pub use sqlite::SqliteSink;

/// Timestamp layout of the persisted key.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors reported by a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid table name '{0}'")]
    InvalidTable(String),
    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// One aggregated window as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    /// Local wall-clock time of the flush, also the record key
    pub timestamp: NaiveDateTime,
    /// ISOUSC in A
    pub subscribed_current: i64,
    /// HCHP in Wh
    pub peak_index: i64,
    /// HCHC in Wh
    pub off_peak_index: i64,
    /// PTEC, two characters
    pub tariff_period: String,
    /// Window mean of IINST in A
    pub mean_current: f64,
    /// IMAX in A
    pub max_current: i64,
    /// Window mean of PAPP in VA
    pub mean_power: f64,
}

impl AggregatedRecord {
    pub fn from_summary(summary: &WindowSummary, timestamp: NaiveDateTime) -> Self {
        let latched = &summary.latched;
        Self {
            timestamp,
            subscribed_current: latched.subscribed_current,
            peak_index: latched.peak_index,
            off_peak_index: latched.off_peak_index,
            tariff_period: latched.tariff_period.clone(),
            mean_current: summary.mean_current,
            max_current: latched.max_current,
            mean_power: summary.mean_power,
        }
    }

    /// Key of the record, `YYYY-MM-DD HH:MM:SS`.
    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Durable destination for aggregated records.
pub trait PersistenceSink: Send + Sync {
    /// Insert `record`, replacing any record with the same timestamp.
    fn upsert(&self, record: &AggregatedRecord) -> Result<(), SinkError>;

    /// Short name for log messages.
    fn name(&self) -> &str;
}

/// Round to two decimals, the precision means are stored with.
pub fn round_centi(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::LatchedState;
    use chrono::NaiveDate;

    #[test]
    fn test_record_from_summary() {
        let summary = WindowSummary {
            latched: LatchedState {
                subscribed_current: 30,
                peak_index: 12_345_678,
                off_peak_index: 8_765_432,
                tariff_period: "HC".to_string(),
                max_current: 45,
            },
            mean_current: 2.5,
            mean_power: 575.25,
            samples: 4,
            overflowed: 0,
        };
        let timestamp = NaiveDate::from_ymd_opt(2016, 9, 1)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();

        let record = AggregatedRecord::from_summary(&summary, timestamp);
        assert_eq!(record.timestamp_text(), "2016-09-01 08:05:00");
        assert_eq!(record.tariff_period, "HC");
        assert_eq!(record.max_current, 45);
        assert_eq!(record.mean_power, 575.25);
    }

    #[test]
    fn test_round_centi() {
        assert_eq!(round_centi(2.0 / 3.0), 0.67);
        assert_eq!(round_centi(650.0), 650.0);
    }
}
