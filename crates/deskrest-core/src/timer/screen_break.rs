//! Ocular-rest ("screen break") trigger engine.
//!
//! Nested inside the WORK phase: every 20 minutes of accumulated running
//! work time opens a 20-second rest prompt. The prompt can be acknowledged
//! (advancing the trigger mark) or snoozed for five minutes. State is
//! persisted keyed by calendar day and discarded on day rollover.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Work seconds between screen-break triggers (20 minutes).
pub const SCREEN_BREAK_INTERVAL_SECS: u32 = 1200;

/// Extra work seconds granted by a snooze (5 minutes).
pub const SNOOZE_DELAY_SECS: u32 = 300;

/// Visible countdown while the prompt is open.
pub const BREAK_COUNTDOWN_SECS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenBreakState {
    /// Calendar day this state belongs to; a stored record from another day
    /// is discarded on load.
    pub day: NaiveDate,
    pub is_open: bool,
    /// Visible countdown, 20 -> 0, ticked at per-second cadence while open.
    pub countdown_secs: u32,
    /// Work-elapsed seconds at the last acknowledged trigger. Only ever
    /// advances forward.
    pub last_trigger_work_elapsed: u32,
    pub snoozed: bool,
    pub snooze_target_work_elapsed: Option<u32>,
}

impl ScreenBreakState {
    pub fn fresh(day: NaiveDate) -> Self {
        Self {
            day,
            is_open: false,
            countdown_secs: 0,
            last_trigger_work_elapsed: 0,
            snoozed: false,
            snooze_target_work_elapsed: None,
        }
    }

    /// Apply the daily scope: a record from a different day is fresh state.
    pub fn scoped_to(stored: Option<Self>, today: NaiveDate) -> Self {
        match stored {
            Some(state) if state.day == today => state,
            _ => Self::fresh(today),
        }
    }

    /// The next 20-minute boundary strictly after the last trigger's.
    fn next_threshold(&self) -> u32 {
        (self.last_trigger_work_elapsed / SCREEN_BREAK_INTERVAL_SECS + 1)
            .saturating_mul(SCREEN_BREAK_INTERVAL_SECS)
    }

    /// Feed the current work-elapsed accumulator. Opens the prompt (and
    /// returns `true`) when a new interval boundary is reached; otherwise
    /// leaves state alone.
    ///
    /// While a snooze is pending the snooze target is the only trigger: the
    /// mark was deliberately not advanced, so the boundary that already
    /// fired must not fire again before the deferral runs out.
    pub fn observe_work_elapsed(&mut self, work_elapsed_secs: u32) -> bool {
        if self.is_open {
            return false;
        }
        let due = match self.snooze_target_work_elapsed {
            Some(target) => work_elapsed_secs >= target,
            None => work_elapsed_secs >= self.next_threshold(),
        };
        if due {
            self.is_open = true;
            self.countdown_secs = BREAK_COUNTDOWN_SECS;
            return true;
        }
        false
    }

    /// Acknowledge the prompt ("done"): the current work-elapsed value
    /// becomes the new trigger mark. The mark never moves backwards.
    pub fn acknowledge(&mut self, work_elapsed_secs: u32) {
        self.is_open = false;
        self.countdown_secs = 0;
        self.last_trigger_work_elapsed = self.last_trigger_work_elapsed.max(work_elapsed_secs);
        self.snoozed = false;
        self.snooze_target_work_elapsed = None;
    }

    /// Snooze: close for five more minutes of work time without advancing
    /// the trigger mark.
    pub fn snooze(&mut self, work_elapsed_secs: u32) {
        if !self.is_open {
            return;
        }
        self.is_open = false;
        self.countdown_secs = 0;
        self.snoozed = true;
        self.snooze_target_work_elapsed =
            Some(work_elapsed_secs.saturating_add(SNOOZE_DELAY_SECS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 27).unwrap()
    }

    #[test]
    fn fires_on_each_twenty_minute_boundary_exactly_once() {
        let mut sb = ScreenBreakState::fresh(day());
        assert!(!sb.observe_work_elapsed(1199));
        assert!(sb.observe_work_elapsed(1200));
        assert!(sb.is_open);
        // Already open: no re-trigger.
        assert!(!sb.observe_work_elapsed(1201));

        sb.acknowledge(1205);
        // Not continuously: nothing until the next boundary.
        assert!(!sb.observe_work_elapsed(2399));
        assert!(sb.observe_work_elapsed(2400));
    }

    #[test]
    fn snooze_defers_by_five_minutes_without_advancing_mark() {
        let mut sb = ScreenBreakState::fresh(day());
        sb.observe_work_elapsed(1200);
        sb.snooze(1200);
        assert!(!sb.is_open);
        assert!(sb.snoozed);
        assert_eq!(sb.snooze_target_work_elapsed, Some(1500));
        assert_eq!(sb.last_trigger_work_elapsed, 0);

        // The already-fired 1200 boundary must stay quiet during the snooze.
        assert!(!sb.observe_work_elapsed(1201));
        assert!(!sb.observe_work_elapsed(1499));
        assert!(sb.observe_work_elapsed(1500));
        sb.acknowledge(1500);
        assert_eq!(sb.last_trigger_work_elapsed, 1500);
        // 1500's boundary is 1200, so the next trigger is at 2400.
        assert!(!sb.observe_work_elapsed(2399));
        assert!(sb.observe_work_elapsed(2400));
    }

    #[test]
    fn trigger_mark_never_moves_backwards() {
        let mut sb = ScreenBreakState::fresh(day());
        sb.observe_work_elapsed(1200);
        sb.acknowledge(1300);
        sb.acknowledge(900);
        assert_eq!(sb.last_trigger_work_elapsed, 1300);
    }

    #[test]
    fn snooze_when_closed_is_a_no_op() {
        let mut sb = ScreenBreakState::fresh(day());
        sb.snooze(600);
        assert!(!sb.snoozed);
        assert!(sb.snooze_target_work_elapsed.is_none());
    }

    #[test]
    fn stored_state_from_another_day_is_discarded() {
        let mut stale = ScreenBreakState::fresh(day());
        stale.last_trigger_work_elapsed = 2400;
        let tomorrow = day().succ_opt().unwrap();
        let scoped = ScreenBreakState::scoped_to(Some(stale.clone()), tomorrow);
        assert_eq!(scoped, ScreenBreakState::fresh(tomorrow));

        let same_day = ScreenBreakState::scoped_to(Some(stale.clone()), day());
        assert_eq!(same_day, stale);
    }

    #[test]
    fn serde_roundtrip() {
        let mut sb = ScreenBreakState::fresh(day());
        sb.observe_work_elapsed(1200);
        sb.snooze(1230);
        let json = serde_json::to_string(&sb).unwrap();
        let back: ScreenBreakState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sb);
    }
}
