// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! SQLite sink
//!
//! The database is opened for each write and closed right after, so the
//! file can live on removable storage and be read by other programs
//! between windows. The table is created on first use when missing.

use std::path::{Path, PathBuf};

use log::debug;
use rusqlite::{params, Connection};

use super::{round_centi, AggregatedRecord, PersistenceSink, SinkError};

/// Default table name.
pub const DEFAULT_TABLE: &str = "teleinfo";

/// Upserts records into `<table>` of a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    path: PathBuf,
    table: String,
}

impl SqliteSink {
    /// Create a sink for `table` in the database at `path`.
    ///
    /// The table name goes into the SQL text and must be a plain
    /// identifier.
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>) -> Result<Self, SinkError> {
        let table = table.into();
        if !is_valid_identifier(&table) {
            return Err(SinkError::InvalidTable(table));
        }
        Ok(Self {
            path: path.into(),
            table,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn schema(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                `date`   TEXT NOT NULL UNIQUE,
                `HP`     INTEGER DEFAULT 0,
                `HC`     INTEGER DEFAULT 0,
                `PTEC`   TEXT,
                `ISOUSC` INTEGER DEFAULT 30,
                `IINST`  REAL DEFAULT 0,
                `IMAX`   INTEGER DEFAULT 30,
                `PAPP`   REAL DEFAULT 0
            );",
            self.table
        )
    }

    /// Open the database and make sure the table exists.
    pub fn connect(&self) -> Result<Connection, SinkError> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(&self.schema())?;
        Ok(conn)
    }
}

impl PersistenceSink for SqliteSink {
    fn upsert(&self, record: &AggregatedRecord) -> Result<(), SinkError> {
        let conn = self.connect()?;
        let sql = format!(
            "INSERT OR REPLACE INTO \"{}\" (date, ISOUSC, HP, HC, PTEC, IINST, IMAX, PAPP) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            self.table
        );
        conn.execute(
            &sql,
            params![
                record.timestamp_text(),
                record.subscribed_current,
                record.peak_index,
                record.off_peak_index,
                record.tariff_period,
                round_centi(record.mean_current),
                record.max_current,
                round_centi(record.mean_power),
            ],
        )?;
        debug!(
            "Wrote teleinfo record {} to {}",
            record.timestamp_text(),
            self.path.display()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn record(minute: u32, peak_index: i64) -> AggregatedRecord {
        AggregatedRecord {
            timestamp: NaiveDate::from_ymd_opt(2016, 9, 1)
                .unwrap()
                .and_hms_opt(12, minute, 0)
                .unwrap(),
            subscribed_current: 30,
            peak_index,
            off_peak_index: 8_765_432,
            tariff_period: "HP".to_string(),
            mean_current: 2.0 / 3.0,
            max_current: 30,
            mean_power: 650.126,
        }
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("teleinfo"));
        assert!(is_valid_identifier("_t2"));
        assert!(!is_valid_identifier("2t"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("t; DROP TABLE x"));
        assert!(matches!(
            SqliteSink::new("db.sqlite", "bad name"),
            Err(SinkError::InvalidTable(_))
        ));
    }

    #[test]
    fn test_upsert_creates_and_replaces() {
        let dir = tempdir().unwrap();
        let sink = SqliteSink::new(dir.path().join("teleinfo.sqlite"), DEFAULT_TABLE).unwrap();

        sink.upsert(&record(5, 12_345_678)).unwrap();
        sink.upsert(&record(10, 12_345_700)).unwrap();
        // Same key as the first record
        sink.upsert(&record(5, 12_345_690)).unwrap();

        let conn = sink.connect().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM teleinfo", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);

        let (hp, ptec, iinst, papp): (i64, String, f64, f64) = conn
            .query_row(
                "SELECT HP, PTEC, IINST, PAPP FROM teleinfo WHERE date = ?1",
                ["2016-09-01 12:05:00"],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(hp, 12_345_690);
        assert_eq!(ptec, "HP");
        assert_eq!(iinst, 0.67);
        assert_eq!(papp, 650.13);
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = tempdir().unwrap();
        let sink = SqliteSink::new(dir.path().join("missing/dir/db.sqlite"), "teleinfo").unwrap();
        assert!(matches!(
            sink.upsert(&record(0, 1)),
            Err(SinkError::Sqlite(_))
        ));
    }
}
