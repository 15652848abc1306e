// SPDX-License-Identifier: GPL-3.0-only

//! Recognition admission policy
//!
//! Decides which captured frames are forwarded to the recognition queue:
//! a frame is admitted when the configured interval has passed since the
//! last submission and the frame counter lands on the skip cadence. This
//! decouples recognition load from the capture rate.

use std::time::{Duration, Instant};

/// Per-run admission state. Created fresh on every pipeline start, so a
/// restart never inherits the previous run's throttle timers.
#[derive(Debug, Default)]
pub struct AdmissionPolicy {
    last_submit: Option<Instant>,
    counter: u64,
}

impl AdmissionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a captured frame and decide whether to submit it.
    ///
    /// The counter advances on every captured frame, admitted or not.
    pub fn admit(&mut self, now: Instant, interval: Duration, skip_rate: u32) -> bool {
        let index = self.counter;
        self.counter = self.counter.wrapping_add(1);

        if index % u64::from(skip_rate.max(1)) != 0 {
            return false;
        }

        let interval_elapsed = match self.last_submit {
            Some(at) => now.duration_since(at) > interval,
            None => true,
        };
        if !interval_elapsed {
            return false;
        }

        self.last_submit = Some(now);
        true
    }
}
