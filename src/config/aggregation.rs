// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Aggregation window configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregation::OverflowPolicy;

/// Largest accepted `window_capacity`, also the schema maximum
pub const MAX_WINDOW_CAPACITY: usize = 65536;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AggregationConfig {
    /// Seconds between two persisted records.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Samples kept per window. At one frame every 1.5 s a 300 s window
    /// holds about 200 of them.
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    /// What a full window does with new samples.
    #[serde(default)]
    pub overflow_policy: OverflowPolicy,
}

fn default_interval_secs() -> u64 {
    300
}

fn default_window_capacity() -> usize {
    512
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            window_capacity: default_window_capacity(),
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

impl AggregationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
