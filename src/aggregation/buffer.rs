// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shared aggregation buffer
//!
//! The frame-processing task commits one validated snapshot per frame and
//! the scheduler flushes the window on its own cadence. Both go through
//! the same mutex, so a flush sees exactly the commits that released the
//! lock before it, and later commits land in the next window.
//!
//! Critical sections only touch in-memory data and are at most linear in
//! the window length.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::samples::{BoundedSamples, OverflowPolicy, PushOutcome};
use crate::protocol::{Snapshot, Tag};

/// Meter state that survives window resets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatchedState {
    /// Subscribed current ceiling (ISOUSC) in A
    pub subscribed_current: i64,
    /// Peak-hour index (HCHP) in Wh
    pub peak_index: i64,
    /// Off-peak-hour index (HCHC) in Wh
    pub off_peak_index: i64,
    /// Two-character tariff period code (PTEC), e.g. `HP` or `HC`
    pub tariff_period: String,
    /// Maximum current (IMAX) in A
    pub max_current: i64,
}

impl LatchedState {
    /// False until a frame has latched at least one non-zero index.
    pub fn has_indices(&self) -> bool {
        self.peak_index != 0 || self.off_peak_index != 0
    }
}

/// Result of committing one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Scalars latched and samples appended
    Stored,
    /// Scalars latched, window full, samples dropped
    Rejected,
    /// Scalars latched, window full, oldest samples evicted
    Evicted,
    /// HCHP, HCHC or PAPP missing, nothing changed
    Incomplete,
}

/// Statistics of one flushed window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSummary {
    pub latched: LatchedState,
    /// Mean instantaneous current in A
    pub mean_current: f64,
    /// Mean apparent power in VA
    pub mean_power: f64,
    /// Samples stored in the window, at most its capacity
    pub samples: usize,
    /// Commits that hit a full window
    pub overflowed: usize,
}

/// Window samples plus latched scalars.
#[derive(Debug, Clone)]
pub struct AggregationBuffer {
    current: BoundedSamples,
    power: BoundedSamples,
    overflowed: usize,
    latched: LatchedState,
}

impl AggregationBuffer {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            current: BoundedSamples::new(capacity, policy),
            power: BoundedSamples::new(capacity, policy),
            overflowed: 0,
            latched: LatchedState::default(),
        }
    }

    /// Latch the meter state of `snapshot` and append its samples.
    ///
    /// The snapshot must come from a checksum-valid frame. It is ignored
    /// unless HCHP, HCHC and PAPP are all present, which is not the case
    /// on the short frames sent right after an overcurrent alarm.
    pub fn commit(&mut self, snapshot: &Snapshot) -> CommitOutcome {
        if !(snapshot.has(Tag::Hchp) && snapshot.has(Tag::Hchc) && snapshot.has(Tag::Papp)) {
            return CommitOutcome::Incomplete;
        }

        self.latched.subscribed_current = snapshot.int(Tag::Isousc);
        self.latched.peak_index = snapshot.int(Tag::Hchp);
        self.latched.off_peak_index = snapshot.int(Tag::Hchc);
        if let Some(period) = snapshot.get(Tag::Ptec) {
            // "HP.." -> "HP"
            let period: String = period.chars().take(2).collect();
            if period.len() > 1 {
                self.latched.tariff_period = period;
            }
        }
        self.latched.max_current = snapshot.int(Tag::Imax);

        let pushed = self.current.push(snapshot.int(Tag::Iinst));
        self.power.push(snapshot.int(Tag::Papp));

        match pushed {
            PushOutcome::Stored => CommitOutcome::Stored,
            PushOutcome::Rejected => {
                self.overflowed += 1;
                CommitOutcome::Rejected
            }
            PushOutcome::Evicted => {
                self.overflowed += 1;
                CommitOutcome::Evicted
            }
        }
    }

    /// Summarise the window and start a new one.
    ///
    /// Means divide by the stored sample count even though non-positive
    /// samples are left out of the sums. Once the window has overflowed
    /// that count is the capacity, so the means cover the kept samples
    /// only. Latched scalars are kept.
    pub fn flush(&mut self) -> WindowSummary {
        let samples = self.sample_count();
        let summary = WindowSummary {
            latched: self.latched.clone(),
            mean_current: self.current.mean_over(samples),
            mean_power: self.power.mean_over(samples),
            samples,
            overflowed: self.overflowed,
        };

        self.current.clear();
        self.power.clear();
        self.overflowed = 0;

        summary
    }

    /// Flush only once indices have been latched.
    pub fn flush_if_ready(&mut self) -> Option<WindowSummary> {
        if self.latched.has_indices() {
            Some(self.flush())
        } else {
            None
        }
    }

    pub fn sample_count(&self) -> usize {
        self.current.len()
    }

    pub fn capacity(&self) -> usize {
        self.current.capacity()
    }

    pub fn latched(&self) -> &LatchedState {
        &self.latched
    }
}

/// [`AggregationBuffer`] behind one lock, cloned into each task.
#[derive(Debug, Clone)]
pub struct SharedAggregationBuffer {
    inner: Arc<Mutex<AggregationBuffer>>,
}

impl SharedAggregationBuffer {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AggregationBuffer::new(capacity, policy))),
        }
    }

    // Every field is plain data, a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, AggregationBuffer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn commit(&self, snapshot: &Snapshot) -> CommitOutcome {
        self.lock().commit(snapshot)
    }

    pub fn flush(&self) -> WindowSummary {
        self.lock().flush()
    }

    /// Check for latched indices and flush under a single acquisition.
    pub fn flush_if_ready(&self) -> Option<WindowSummary> {
        self.lock().flush_if_ready()
    }

    pub fn sample_count(&self) -> usize {
        self.lock().sample_count()
    }

    pub fn latched(&self) -> LatchedState {
        self.lock().latched().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn snapshot(iinst: &str, papp: &str) -> Snapshot {
        let mut s = Snapshot::new();
        s.set(Tag::Isousc, "30");
        s.set(Tag::Hchp, "012345678");
        s.set(Tag::Hchc, "008765432");
        s.set(Tag::Ptec, "HP..");
        s.set(Tag::Iinst, iinst);
        s.set(Tag::Imax, "030");
        s.set(Tag::Papp, papp);
        s
    }

    #[test]
    fn test_commit_latches_scalars() {
        let mut buffer = AggregationBuffer::new(16, OverflowPolicy::Reject);
        assert_eq!(buffer.commit(&snapshot("003", "00650")), CommitOutcome::Stored);

        let latched = buffer.latched();
        assert_eq!(latched.subscribed_current, 30);
        assert_eq!(latched.peak_index, 12_345_678);
        assert_eq!(latched.off_peak_index, 8_765_432);
        assert_eq!(latched.tariff_period, "HP");
        assert_eq!(latched.max_current, 30);
        assert_eq!(buffer.sample_count(), 1);
    }

    #[test]
    fn test_incomplete_snapshot_changes_nothing() {
        let mut buffer = AggregationBuffer::new(16, OverflowPolicy::Reject);
        for missing in [Tag::Hchp, Tag::Hchc, Tag::Papp] {
            let mut s = snapshot("003", "00650");
            s.set(missing, "");
            assert_eq!(buffer.commit(&s), CommitOutcome::Incomplete);
        }
        assert_eq!(buffer.latched(), &LatchedState::default());
        assert_eq!(buffer.sample_count(), 0);
    }

    #[test]
    fn test_short_tariff_period_is_not_latched() {
        let mut buffer = AggregationBuffer::new(16, OverflowPolicy::Reject);
        buffer.commit(&snapshot("003", "00650"));
        let mut s = snapshot("003", "00650");
        s.set(Tag::Ptec, "H");
        buffer.commit(&s);
        assert_eq!(buffer.latched().tariff_period, "HP");
    }

    #[test]
    fn test_flush_means_and_reset() {
        let mut buffer = AggregationBuffer::new(16, OverflowPolicy::Reject);
        buffer.commit(&snapshot("002", "00400"));
        buffer.commit(&snapshot("004", "00800"));
        buffer.commit(&snapshot("000", "00000"));

        let summary = buffer.flush();
        assert_eq!(summary.samples, 3);
        // Zero samples stay in the divisor
        assert_relative_eq!(summary.mean_current, 2.0);
        assert_relative_eq!(summary.mean_power, 400.0);
        assert_eq!(summary.latched.peak_index, 12_345_678);

        assert_eq!(buffer.sample_count(), 0);
        assert_eq!(buffer.latched().peak_index, 12_345_678);
        assert_eq!(buffer.latched().tariff_period, "HP");
    }

    #[test]
    fn test_empty_window_mean_is_zero() {
        let mut buffer = AggregationBuffer::new(16, OverflowPolicy::Reject);
        buffer.commit(&snapshot("003", "00650"));
        buffer.flush();
        let summary = buffer.flush();
        assert_eq!(summary.samples, 0);
        assert_relative_eq!(summary.mean_current, 0.0);
        assert_relative_eq!(summary.mean_power, 0.0);
    }

    #[test]
    fn test_overflow_reject() {
        let mut buffer = AggregationBuffer::new(4, OverflowPolicy::Reject);
        for _ in 0..4 {
            assert_eq!(buffer.commit(&snapshot("001", "00100")), CommitOutcome::Stored);
        }
        let mut last = snapshot("009", "00900");
        last.set(Tag::Hchp, "012345999");
        assert_eq!(buffer.commit(&last), CommitOutcome::Rejected);
        assert_eq!(buffer.commit(&last), CommitOutcome::Rejected);
        // Latched state still follows the meter
        assert_eq!(buffer.latched().peak_index, 12_345_999);

        let summary = buffer.flush();
        assert_eq!(summary.samples, 4);
        assert_eq!(summary.overflowed, 2);
        assert_relative_eq!(summary.mean_current, 1.0);

        assert_eq!(buffer.commit(&last), CommitOutcome::Stored);
        assert_eq!(buffer.flush().overflowed, 0);
    }

    #[test]
    fn test_overflow_wrap() {
        let mut buffer = AggregationBuffer::new(2, OverflowPolicy::Wrap);
        buffer.commit(&snapshot("001", "00100"));
        buffer.commit(&snapshot("002", "00200"));
        assert_eq!(buffer.commit(&snapshot("004", "00400")), CommitOutcome::Evicted);

        let summary = buffer.flush();
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.overflowed, 1);
        assert_relative_eq!(summary.mean_current, 3.0);
        assert_relative_eq!(summary.mean_power, 300.0);
    }

    #[test]
    fn test_full_window_of_max_length_power() {
        let mut buffer = AggregationBuffer::new(1000, OverflowPolicy::Reject);
        for _ in 0..1000 {
            buffer.commit(&snapshot("999", "9999999999999999"));
        }
        let summary = buffer.flush_if_ready().unwrap();
        assert_eq!(summary.samples, 1000);
        assert_relative_eq!(summary.mean_power, 9_999_999_999_999_999.0);
        assert_relative_eq!(summary.mean_current, 999.0);
    }

    #[test]
    fn test_flush_if_ready_waits_for_indices() {
        let mut buffer = AggregationBuffer::new(16, OverflowPolicy::Reject);
        assert!(buffer.flush_if_ready().is_none());
        buffer.commit(&snapshot("003", "00650"));
        assert!(buffer.flush_if_ready().is_some());
    }

    #[test]
    fn test_shared_buffer_concurrent_commits() {
        let shared = SharedAggregationBuffer::new(1000, OverflowPolicy::Reject);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        shared.commit(&snapshot("005", "01000"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.sample_count(), 400);
        let summary = shared.flush_if_ready().unwrap();
        assert_eq!(summary.samples, 400);
        assert_relative_eq!(summary.mean_current, 5.0);
        assert_eq!(shared.sample_count(), 0);
    }
}
