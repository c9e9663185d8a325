//! Persisted timer state and reload reconciliation.
//!
//! Two independent string-keyed JSON records live in the kv store: the timer
//! snapshot and the screen-break state. Readers tolerate missing or
//! malformed records by falling back to defaults; there is no schema
//! versioning.
//!
//! The snapshot's `remaining_secs` is only meaningful relative to
//! `last_tick_epoch_ms`: when the stored state was running, remaining is
//! recomputed from the gap on load, never trusted verbatim.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::database::Database;
use crate::error::StorageError;
use crate::timer::{configured_duration_secs, Phase, PresetId, ScreenBreakState, TimerEngine};

pub const TIMER_SNAPSHOT_KEY: &str = "timer_snapshot";
pub const SCREEN_BREAK_KEY: &str = "screen_break";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub remaining_secs: u32,
    pub last_tick_epoch_ms: u64,
    pub is_running: bool,
    pub preset: PresetId,
}

impl TimerSnapshot {
    pub fn capture(engine: &TimerEngine, now_ms: u64) -> Self {
        Self {
            phase: engine.phase(),
            remaining_secs: engine.remaining_at(now_ms),
            last_tick_epoch_ms: now_ms,
            is_running: engine.is_running(),
            preset: engine.preset(),
        }
    }

    /// Rebuild an engine from a stored snapshot, reconciling elapsed time
    /// across the gap since it was written.
    ///
    /// - Absent snapshot: fresh WORK at `default_preset`, stopped.
    /// - Stored running: subtract the gap from remaining (floor 0). If that
    ///   lands exactly on 0 the phase fully completed while the app was
    ///   closed: advance to the next phase with its full duration, stopped.
    ///   No events fire for a transition the user was not present for.
    /// - Stored stopped: restored verbatim.
    ///
    /// A snapshot naming the custom preset degrades to `default_preset`,
    /// since custom timings are session-only and no longer known.
    pub fn restore(stored: Option<Self>, default_preset: PresetId, now_ms: u64) -> TimerEngine {
        let snap = match stored {
            Some(snap) => snap,
            None => return TimerEngine::new(default_preset),
        };
        let preset = if snap.preset == PresetId::Custom {
            default_preset
        } else {
            snap.preset
        };
        if !snap.is_running {
            return TimerEngine::from_parts(snap.phase, snap.remaining_secs, false, preset, now_ms);
        }
        let gap_secs =
            u32::try_from(now_ms.saturating_sub(snap.last_tick_epoch_ms) / 1000).unwrap_or(u32::MAX);
        let remaining = snap.remaining_secs.saturating_sub(gap_secs);
        if remaining == 0 {
            let next = snap.phase.next();
            let duration = configured_duration_secs(preset, None, next);
            return TimerEngine::from_parts(next, duration, false, preset, now_ms);
        }
        TimerEngine::from_parts(snap.phase, remaining, true, preset, now_ms)
    }
}

/// Read the timer snapshot; missing or malformed records count as absent.
pub fn load_timer_snapshot(db: &Database) -> Option<TimerSnapshot> {
    let json = db.kv_get(TIMER_SNAPSHOT_KEY).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub fn save_timer_snapshot(db: &Database, snap: &TimerSnapshot) -> Result<(), StorageError> {
    let json = serde_json::to_string(snap)
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
    db.kv_set(TIMER_SNAPSHOT_KEY, &json)
}

/// Read the screen-break record scoped to `today`; any stored record from
/// another day (or a malformed one) yields fresh state.
pub fn load_screen_break(db: &Database, today: NaiveDate) -> ScreenBreakState {
    let stored = db
        .kv_get(SCREEN_BREAK_KEY)
        .ok()
        .flatten()
        .and_then(|json| serde_json::from_str(&json).ok());
    ScreenBreakState::scoped_to(stored, today)
}

pub fn save_screen_break(db: &Database, state: &ScreenBreakState) -> Result<(), StorageError> {
    let json = serde_json::to_string(state)
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
    db.kv_set(SCREEN_BREAK_KEY, &json)
}
