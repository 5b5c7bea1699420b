// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Bounded sample sequence
//!
//! A window never holds more than `capacity` samples. What happens to the
//! next one is decided by [`OverflowPolicy`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Behaviour of a full window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Keep the first `capacity` samples, drop later ones
    #[default]
    Reject,
    /// Keep the latest `capacity` samples, evict the oldest
    Wrap,
}

/// Result of a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Stored,
    /// Window full, sample dropped
    Rejected,
    /// Window full, oldest sample evicted
    Evicted,
}

/// Ordered samples of one window with an explicit capacity.
#[derive(Debug, Clone)]
pub struct BoundedSamples {
    samples: VecDeque<i64>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl BoundedSamples {
    /// Create an empty sequence. A zero capacity is raised to 1.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            policy,
        }
    }

    pub fn push(&mut self, sample: i64) -> PushOutcome {
        if self.samples.len() < self.capacity {
            self.samples.push_back(sample);
            return PushOutcome::Stored;
        }
        match self.policy {
            OverflowPolicy::Reject => PushOutcome::Rejected,
            OverflowPolicy::Wrap => {
                self.samples.pop_front();
                self.samples.push_back(sample);
                PushOutcome::Evicted
            }
        }
    }

    /// Sum of the positive samples divided by `divisor`.
    ///
    /// Non-positive samples are left out of the sum but not out of the
    /// divisor. Returns 0.0 for a zero divisor.
    pub fn mean_over(&self, divisor: usize) -> f64 {
        if divisor == 0 {
            return 0.0;
        }
        // 16-digit values over a large window do not fit an i64 sum
        let sum: i128 = self
            .samples
            .iter()
            .filter(|&&s| s > 0)
            .map(|&s| i128::from(s))
            .sum();
        sum as f64 / divisor as f64
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

}
