// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Windowed aggregation of validated frames
//!
//! - [`samples`]: bounded per-window sample storage
//! - [`buffer`]: latched meter state plus window samples behind one lock
//! - [`scheduler`]: periodic flush into a persistence sink

pub mod buffer;
pub mod samples;
pub mod scheduler;

pub use buffer::{
    AggregationBuffer, CommitOutcome, LatchedState, SharedAggregationBuffer, WindowSummary,
};
pub use samples::{BoundedSamples, OverflowPolicy, PushOutcome};
pub use scheduler::{AggregationScheduler, CycleOutcome};
