// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! In-memory sink keyed by timestamp

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::{AggregatedRecord, PersistenceSink, SinkError};

#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<BTreeMap<String, AggregatedRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored records ordered by timestamp.
    pub fn records(&self) -> Vec<AggregatedRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistenceSink for MemorySink {
    fn upsert(&self, record: &AggregatedRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.timestamp_text(), record.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
