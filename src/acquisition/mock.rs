// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-teleinfo project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Synthetic single-phase meter
//!
//! Produces checksum-valid historic teleinfo frames on a fixed period so the
//! whole pipeline can run without a meter attached. The current draw is
//! random, the indices grow with the energy it represents, and the tariff
//! period follows the clock (off-peak from 22:00 to 06:00).

use std::collections::VecDeque;
use std::io::{self, Read};
use std::time::{Duration, Instant};

use chrono::{Local, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::TeleinfoSource;
use crate::protocol::{encode_group, Tag, ETX, STX};

const METER_ID: &str = "031138001788";
const SUBSCRIBED_CURRENT: u32 = 30;
const MAINS_VOLTAGE: u32 = 230;

pub struct MockMeter {
    rng: StdRng,
    period: Duration,
    next_frame_at: Option<Instant>,
    pending: VecDeque<u8>,
    frames: u64,
    overcurrent_every: Option<u64>,
    off_peak_hours: bool,
    peak_index: u64,
    off_peak_index: u64,
    // Energy not yet accounted for in the indices, in Wh
    pending_wh: f64,
}

impl MockMeter {
    /// Meter emitting one frame every `period`.
    pub fn new(period: Duration) -> Self {
        Self::with_rng(period, StdRng::from_os_rng())
    }

    /// Deterministic meter for tests.
    pub fn seeded(period: Duration, seed: u64) -> Self {
        Self::with_rng(period, StdRng::seed_from_u64(seed))
    }

    fn with_rng(period: Duration, rng: StdRng) -> Self {
        let hour = Local::now().hour();
        let mut pending = VecDeque::new();
        // The stream opens on the tail of a frame
        pending.push_back(ETX);
        Self {
            rng,
            period,
            next_frame_at: None,
            pending,
            frames: 0,
            overcurrent_every: None,
            off_peak_hours: !(6..22).contains(&hour),
            peak_index: 12_345_678,
            off_peak_index: 8_765_432,
            pending_wh: 0.0,
        }
    }

    /// Every `n`-th frame reports an overcurrent (`ADPS`).
    pub fn with_overcurrent_every(mut self, n: u64) -> Self {
        self.overcurrent_every = (n > 0).then_some(n);
        self
    }

    /// Force the tariff period instead of following the clock.
    pub fn with_off_peak(mut self, off_peak: bool) -> Self {
        self.off_peak_hours = off_peak;
        self
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames
    }

    /// Build the next frame, `STX` and `ETX` included.
    pub fn next_frame(&mut self) -> Vec<u8> {
        self.frames += 1;
        let overcurrent = self
            .overcurrent_every
            .is_some_and(|n| self.frames % n == 0);

        let current = if overcurrent {
            self.rng
                .random_range(SUBSCRIBED_CURRENT + 1..=SUBSCRIBED_CURRENT + 10)
        } else {
            self.rng.random_range(1..SUBSCRIBED_CURRENT)
        };
        let power = current * MAINS_VOLTAGE + self.rng.random_range(0..MAINS_VOLTAGE);

        self.pending_wh += f64::from(power) * self.period.as_secs_f64() / 3600.0;
        let whole = self.pending_wh.floor();
        self.pending_wh -= whole;
        if self.off_peak_hours {
            self.off_peak_index += whole as u64;
        } else {
            self.peak_index += whole as u64;
        }

        let period = if self.off_peak_hours { "HC.." } else { "HP.." };
        let mut groups = vec![
            (Tag::Adco, METER_ID.to_string()),
            (Tag::Optarif, "HC..".to_string()),
            (Tag::Isousc, SUBSCRIBED_CURRENT.to_string()),
            (Tag::Hchc, format!("{:09}", self.off_peak_index)),
            (Tag::Hchp, format!("{:09}", self.peak_index)),
            (Tag::Ptec, period.to_string()),
            (Tag::Iinst, format!("{:03}", current)),
        ];
        if overcurrent {
            groups.push((Tag::Adps, format!("{:03}", current)));
        }
        groups.extend([
            (Tag::Imax, format!("{:03}", SUBSCRIBED_CURRENT)),
            (Tag::Papp, format!("{:05}", power)),
            (Tag::Hhphc, "D".to_string()),
            (Tag::Motdetat, "000000".to_string()),
        ]);

        let mut out = Vec::with_capacity(256);
        out.push(STX);
        for (tag, value) in &groups {
            encode_group(tag.name(), value, &mut out);
        }
        out.push(ETX);
        out
    }

    fn wait_for_next_frame(&mut self) {
        let now = Instant::now();
        if let Some(at) = self.next_frame_at {
            if at > now {
                std::thread::sleep(at - now);
            }
        }
        self.next_frame_at = Some(Instant::now() + self.period);
    }
}

impl Read for MockMeter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pending.is_empty() {
            self.wait_for_next_frame();
            let frame = self.next_frame();
            self.pending.extend(frame);
        }
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl TeleinfoSource for MockMeter {
    fn describe(&self) -> String {
        format!("mock meter (one frame every {:?})", self.period)
    }
}
