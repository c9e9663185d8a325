//! Wall-clock countdown anchor.
//!
//! Remaining time is always recomputed from the moment the countdown was
//! (re)anchored, never decremented tick by tick. Scheduling jitter and
//! event-loop suspension therefore cannot accumulate drift: however many
//! ticks fire, the answer only depends on real elapsed time.

use serde::{Deserialize, Serialize};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Anchor for a running countdown.
///
/// Captured when a countdown (re)starts; re-anchored only on start, resume,
/// and phase transitions, so sub-second remainders are never lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    /// Epoch ms when this countdown was anchored.
    pub started_epoch_ms: u64,
    /// Remaining seconds at the moment of anchoring.
    pub start_remaining_secs: u32,
}

impl Countdown {
    pub fn begin(remaining_secs: u32, now_ms: u64) -> Self {
        Self {
            started_epoch_ms: now_ms,
            start_remaining_secs: remaining_secs,
        }
    }

    /// Whole seconds elapsed since the anchor.
    pub fn elapsed_secs_at(&self, now_ms: u64) -> u32 {
        let ms = now_ms.saturating_sub(self.started_epoch_ms);
        u32::try_from(ms / 1000).unwrap_or(u32::MAX)
    }

    /// Remaining seconds at `now_ms`, floored at zero.
    pub fn remaining_at(&self, now_ms: u64) -> u32 {
        self.start_remaining_secs
            .saturating_sub(self.elapsed_secs_at(now_ms))
    }
}
