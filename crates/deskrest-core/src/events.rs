use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, PresetId, ScreenBreakState};

/// Every state change in the system produces an Event.
/// Consumers (CLI surfaces, alert sinks) react; they never mutate timer
/// state directly.
///
/// `seq` on completion events is the transition sequence number: one bump
/// per zero-crossing, so a sink that sees the same crossing twice can
/// deduplicate on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PhaseStarted {
        phase: Phase,
        duration_secs: u32,
        seq: u64,
        at: DateTime<Utc>,
    },
    PhasePaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        phase: Phase,
        next_phase: Phase,
        seq: u64,
        at: DateTime<Utc>,
    },
    /// A full WORK+REST cycle finished (REST ran out). Emitted at most once
    /// per crossing, alongside the corresponding `PhaseCompleted`.
    CycleCompleted {
        seq: u64,
        at: DateTime<Utc>,
    },
    PhaseSkipped {
        from: Phase,
        to: Phase,
        at: DateTime<Utc>,
    },
    PresetChanged {
        preset: PresetId,
        at: DateTime<Utc>,
    },
    /// Countdown milestone (10/5/3/2/1 seconds left in the current phase).
    Milestone {
        seconds_left: u32,
        at: DateTime<Utc>,
    },
    ScreenBreakOpened {
        work_elapsed_secs: u32,
        at: DateTime<Utc>,
    },
    ScreenBreakDismissed {
        /// True for "done" (including countdown expiry), false for snooze.
        acknowledged: bool,
        at: DateTime<Utc>,
    },
    /// The full consumer read contract in one record.
    StateSnapshot {
        phase: Phase,
        remaining_secs: u32,
        is_running: bool,
        preset: PresetId,
        work_elapsed_secs: u32,
        cycle_complete_pending: bool,
        screen_break: ScreenBreakState,
        at: DateTime<Utc>,
    },
}
