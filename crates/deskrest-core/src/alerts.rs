//! Alert delivery seam.
//!
//! The state machine never talks to platform notification or audio APIs
//! directly: it emits events, and the session context forwards them to an
//! `AlertSink`. Implementations must be fire-and-forget and swallow their
//! own failures; nothing an alert sink does may stall or fail the timer.

use crate::timer::Phase;

pub trait AlertSink {
    /// A phase finished and the next one is loaded.
    fn phase_completed(&self, finished: Phase, next: Phase);

    /// Countdown milestone cue (10/5/3/2/1 seconds left).
    fn milestone(&self, seconds_left: u32);

    /// The screen-break prompt opened.
    fn screen_break_opened(&self);
}

/// Silent sink for headless use and tests.
pub struct NullAlerts;

impl AlertSink for NullAlerts {
    fn phase_completed(&self, _finished: Phase, _next: Phase) {}
    fn milestone(&self, _seconds_left: u32) {}
    fn screen_break_opened(&self) {}
}
