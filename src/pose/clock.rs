//! Pose timestamps
//!
//! Samples are stamped in milliseconds since the UNIX epoch, but the wall
//! clock is only read once. Later readings advance by a monotonic [`Instant`],
//! so a clock adjustment can never make history timestamps go backwards.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Epoch-anchored monotonic millisecond clock
#[derive(Debug, Clone, Copy)]
pub struct PoseClock {
    epoch_ms: u64,
    origin: Instant,
}

impl PoseClock {
    /// Anchor a new clock at the current wall-clock time
    pub fn new() -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            epoch_ms,
            origin: Instant::now(),
        }
    }

    /// Current time in epoch milliseconds
    pub fn now_ms(&self) -> u64 {
        self.epoch_ms + self.origin.elapsed().as_millis() as u64
    }

    /// Wall-clock anchor of this clock
    pub fn epoch_ms(&self) -> u64 {
        self.epoch_ms
    }
}

impl Default for PoseClock {
    fn default() -> Self {
        Self::new()
    }
}
