//! Focus timer state machine.
//!
//! A wall-clock-based WORK/REST cycle. The engine has no internal thread:
//! the caller drives it by invoking `tick()` periodically (sub-second cadence
//! for smooth countdown display) and every method takes the current time
//! explicitly, so tests control the clock.
//!
//! ## Phase cycle
//!
//! ```text
//! WORK --(remaining hits 0)--> REST --(remaining hits 0)--> WORK ...
//! ```
//!
//! A completed phase stops the countdown, loads the next phase's full
//! duration, and auto-resumes after a short debounce window so the UI can
//! show the zero state. Each zero-crossing bumps a transition sequence
//! number exactly once; completion events carry that number, so observers
//! reacting to the same crossing twice cannot double-fire side effects.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::clock::Countdown;
use super::preset::{CustomTimings, Preset, PresetId};
use crate::error::ValidationError;
use crate::events::Event;

/// Delay between a phase completing and the next phase auto-starting.
pub const AUTO_RESUME_DELAY_MS: u64 = 500;

/// Countdown seconds that emit a short cue, once each per phase.
const MILESTONES: [u32; 5] = [10, 5, 3, 2, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Rest,
}

impl Phase {
    pub fn next(self) -> Phase {
        match self {
            Phase::Work => Phase::Rest,
            Phase::Rest => Phase::Work,
        }
    }
}

/// Duration in seconds of `phase` under the given preset and session-only
/// custom override. `Custom` without timings falls back to the standard
/// preset (custom timings are never persisted, so a restored session can
/// name `Custom` without its values).
pub(crate) fn configured_duration_secs(
    preset: PresetId,
    custom: Option<&CustomTimings>,
    phase: Phase,
) -> u32 {
    if preset == PresetId::Custom {
        if let Some(c) = custom {
            return match phase {
                Phase::Work => c.work_secs(),
                Phase::Rest => c.rest_secs(),
            };
        }
    }
    let p = Preset::get(preset).unwrap_or_else(|| {
        Preset::get(PresetId::Standard).unwrap_or(Preset {
            id: PresetId::Standard,
            work_min: 25,
            rest_min: 5,
        })
    });
    match phase {
        Phase::Work => p.work_secs(),
        Phase::Rest => p.rest_secs(),
    }
}

/// Core timer state machine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    phase: Phase,
    remaining_secs: u32,
    running: bool,
    preset: PresetId,
    custom: Option<CustomTimings>,
    /// Anchor for the running countdown; `Some` iff `running`.
    countdown: Option<Countdown>,
    /// Seconds spent in WORK while running, excluding the current anchor span.
    work_elapsed_base_secs: u32,
    /// Bumped exactly once per zero-crossing; the idempotency token carried
    /// on completion events.
    transition_seq: u64,
    /// Scheduled auto-resume after a phase transition.
    pending_resume_at_ms: Option<u64>,
    /// End-of-cycle affordance: set on REST completion, cleared on dismiss.
    cycle_complete_pending: bool,
    last_milestone: Option<u32>,
}

impl TimerEngine {
    /// Fresh engine: WORK phase, preset's work duration, stopped.
    pub fn new(preset: PresetId) -> Self {
        let preset = if preset == PresetId::Custom {
            PresetId::Standard
        } else {
            preset
        };
        Self {
            phase: Phase::Work,
            remaining_secs: configured_duration_secs(preset, None, Phase::Work),
            running: false,
            preset,
            custom: None,
            countdown: None,
            work_elapsed_base_secs: 0,
            transition_seq: 0,
            pending_resume_at_ms: None,
            cycle_complete_pending: false,
            last_milestone: None,
        }
    }

    /// Rebuild an engine from persisted parts (post-reconciliation).
    /// Emits nothing: transitions the user was not present for stay silent.
    pub(crate) fn from_parts(
        phase: Phase,
        remaining_secs: u32,
        running: bool,
        preset: PresetId,
        now_ms: u64,
    ) -> Self {
        let mut engine = Self::new(preset);
        engine.phase = phase;
        engine.remaining_secs = remaining_secs;
        engine.running = running && remaining_secs > 0;
        engine.countdown = engine
            .running
            .then(|| Countdown::begin(remaining_secs, now_ms));
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn preset(&self) -> PresetId {
        self.preset
    }

    pub fn custom_timings(&self) -> Option<CustomTimings> {
        self.custom
    }

    pub fn transition_seq(&self) -> u64 {
        self.transition_seq
    }

    pub fn cycle_complete_pending(&self) -> bool {
        self.cycle_complete_pending
    }

    /// Remaining seconds at `now_ms`, recomputed from the anchor while
    /// running. Does not mutate.
    pub fn remaining_at(&self, now_ms: u64) -> u32 {
        match self.countdown {
            Some(cd) if self.running => cd.remaining_at(now_ms),
            _ => self.remaining_secs,
        }
    }

    /// Total duration of the current phase under the active configuration.
    pub fn phase_duration_secs(&self) -> u32 {
        configured_duration_secs(self.preset, self.custom.as_ref(), self.phase)
    }

    /// Accumulated seconds spent in WORK while running. Pauses with the
    /// timer, resets to zero when WORK ends.
    pub fn work_elapsed_secs(&self, now_ms: u64) -> u32 {
        let live = match self.countdown {
            Some(cd) if self.running && self.phase == Phase::Work => cd
                .elapsed_secs_at(now_ms)
                .min(cd.start_remaining_secs),
            _ => 0,
        };
        self.work_elapsed_base_secs.saturating_add(live)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// No-op if already running or nothing remains to count down.
    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        if self.running || self.remaining_secs == 0 {
            return Vec::new();
        }
        self.pending_resume_at_ms = None;
        self.running = true;
        self.countdown = Some(Countdown::begin(self.remaining_secs, now_ms));
        vec![Event::PhaseStarted {
            phase: self.phase,
            duration_secs: self.remaining_secs,
            seq: self.transition_seq,
            at: Utc::now(),
        }]
    }

    /// No-op if already stopped, except that an explicit pause inside the
    /// auto-resume debounce window cancels the scheduled resume.
    pub fn pause(&mut self, now_ms: u64) -> Vec<Event> {
        if !self.running {
            self.pending_resume_at_ms = None;
            return Vec::new();
        }
        self.flush(now_ms);
        self.running = false;
        self.countdown = None;
        vec![Event::PhasePaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }]
    }

    pub fn toggle(&mut self, now_ms: u64) -> Vec<Event> {
        if self.running {
            self.pause(now_ms)
        } else {
            self.start(now_ms)
        }
    }

    /// Skip to the next phase. Only valid while stopped; runs the normal
    /// completion path (full next-phase duration, auto-resume debounce).
    pub fn skip(&mut self, now_ms: u64) -> Vec<Event> {
        if self.running {
            return Vec::new();
        }
        let from = self.phase;
        self.remaining_secs = 0;
        let mut events = self.complete_phase(now_ms);
        events.insert(
            0,
            Event::PhaseSkipped {
                from,
                to: self.phase,
                at: Utc::now(),
            },
        );
        events
    }

    /// Change preset. Rejected while running: pausing first is required,
    /// since changing durations mid-countdown is undefined.
    ///
    /// While stopped: resets to WORK with the preset's work duration,
    /// clears any session-only custom override, stays stopped.
    pub fn set_preset(&mut self, id: PresetId, _now_ms: u64) -> Result<Vec<Event>, ValidationError> {
        if self.running {
            return Err(ValidationError::CommandRejected(
                "cannot change preset while the timer is running".into(),
            ));
        }
        if id == PresetId::Custom {
            return Err(ValidationError::CommandRejected(
                "set custom timings instead of selecting the custom preset".into(),
            ));
        }
        self.preset = id;
        self.custom = None;
        self.reset_to_work();
        Ok(vec![Event::PresetChanged {
            preset: id,
            at: Utc::now(),
        }])
    }

    /// Apply session-only custom timings. Same running restriction as
    /// `set_preset`; values below one minute are rejected.
    pub fn set_custom_timings(
        &mut self,
        work_min: u32,
        rest_min: u32,
        _now_ms: u64,
    ) -> Result<Vec<Event>, ValidationError> {
        if self.running {
            return Err(ValidationError::CommandRejected(
                "cannot change timings while the timer is running".into(),
            ));
        }
        let timings = CustomTimings::new(work_min, rest_min)?;
        self.preset = PresetId::Custom;
        self.custom = Some(timings);
        self.reset_to_work();
        Ok(vec![Event::PresetChanged {
            preset: PresetId::Custom,
            at: Utc::now(),
        }])
    }

    /// Clear the end-of-cycle affordance. It will not reappear until the
    /// next REST completion.
    pub fn dismiss_cycle_complete(&mut self) {
        self.cycle_complete_pending = false;
    }

    /// Advance the countdown. Call at sub-second cadence.
    ///
    /// Recomputes remaining from the anchor (never decrements), emits each
    /// milestone cue at most once, runs the phase transition on the first
    /// tick that observes zero, and auto-resumes once the debounce window
    /// after a transition has passed.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        if !self.running {
            if let Some(resume_at) = self.pending_resume_at_ms {
                if now_ms >= resume_at {
                    self.pending_resume_at_ms = None;
                    self.running = true;
                    self.countdown = Some(Countdown::begin(self.remaining_secs, now_ms));
                    return vec![Event::PhaseStarted {
                        phase: self.phase,
                        duration_secs: self.remaining_secs,
                        seq: self.transition_seq,
                        at: Utc::now(),
                    }];
                }
            }
            return Vec::new();
        }
        let cd = match self.countdown {
            Some(cd) => cd,
            None => return Vec::new(),
        };
        let remaining = cd.remaining_at(now_ms);
        self.remaining_secs = remaining;
        if remaining == 0 {
            return self.complete_phase(now_ms);
        }
        let mut events = Vec::new();
        if MILESTONES.contains(&remaining) && self.last_milestone != Some(remaining) {
            self.last_milestone = Some(remaining);
            events.push(Event::Milestone {
                seconds_left: remaining,
                at: Utc::now(),
            });
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Fold the live anchor span into stored state without losing the
    /// work-elapsed accumulator.
    fn flush(&mut self, now_ms: u64) {
        if let Some(cd) = self.countdown {
            if self.phase == Phase::Work {
                let span = cd.elapsed_secs_at(now_ms).min(cd.start_remaining_secs);
                self.work_elapsed_base_secs = self.work_elapsed_base_secs.saturating_add(span);
            }
            self.remaining_secs = cd.remaining_at(now_ms);
        }
    }

    /// The single transition path for a zero-crossing: stop, bump the
    /// sequence number, switch phase, load the next duration, schedule the
    /// auto-resume. REST completion additionally marks one full cycle.
    fn complete_phase(&mut self, now_ms: u64) -> Vec<Event> {
        let finished = self.phase;
        self.transition_seq += 1;
        let seq = self.transition_seq;
        self.running = false;
        self.countdown = None;
        self.last_milestone = None;
        self.work_elapsed_base_secs = 0;
        self.phase = finished.next();
        self.remaining_secs =
            configured_duration_secs(self.preset, self.custom.as_ref(), self.phase);
        self.pending_resume_at_ms = Some(now_ms.saturating_add(AUTO_RESUME_DELAY_MS));
        let mut events = vec![Event::PhaseCompleted {
            phase: finished,
            next_phase: self.phase,
            seq,
            at: Utc::now(),
        }];
        if finished == Phase::Rest {
            self.cycle_complete_pending = true;
            events.push(Event::CycleCompleted { seq, at: Utc::now() });
        }
        events
    }

    fn reset_to_work(&mut self) {
        self.phase = Phase::Work;
        self.remaining_secs =
            configured_duration_secs(self.preset, self.custom.as_ref(), Phase::Work);
        self.running = false;
        self.countdown = None;
        self.pending_resume_at_ms = None;
        self.work_elapsed_base_secs = 0;
        self.last_milestone = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    fn secs(n: u64) -> u64 {
        n * 1000
    }

    #[test]
    fn start_is_idempotent() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        assert_eq!(engine.start(T0).len(), 1);
        assert!(engine.is_running());
        assert!(engine.start(T0 + 100).is_empty());
        assert!(engine.is_running());
    }

    #[test]
    fn pause_is_idempotent() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        assert!(engine.pause(T0).is_empty());
        engine.start(T0);
        assert_eq!(engine.pause(T0 + secs(10)).len(), 1);
        assert_eq!(engine.remaining_at(T0 + secs(10)), 25 * 60 - 10);
        assert!(engine.pause(T0 + secs(11)).is_empty());
        assert_eq!(engine.remaining_at(T0 + secs(11)), 25 * 60 - 10);
    }

    #[test]
    fn remaining_recomputes_from_anchor_not_tick_count() {
        let mut engine = TimerEngine::new(PresetId::Light);
        engine.start(T0);
        // Irregular tick cadence; only real elapsed time matters.
        engine.tick(T0 + 70);
        engine.tick(T0 + 330);
        engine.tick(T0 + secs(90));
        assert_eq!(engine.remaining_at(T0 + secs(90)), 15 * 60 - 90);
    }

    #[test]
    fn work_completion_switches_to_rest_and_auto_resumes() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        engine.start(T0);
        let events = engine.tick(T0 + secs(25 * 60));
        assert!(matches!(
            events[0],
            Event::PhaseCompleted { phase: Phase::Work, next_phase: Phase::Rest, seq: 1, .. }
        ));
        assert!(!engine.is_running());
        assert_eq!(engine.phase(), Phase::Rest);
        assert_eq!(engine.remaining_at(T0 + secs(25 * 60)), 5 * 60);

        // Within the debounce window: still stopped.
        assert!(engine.tick(T0 + secs(25 * 60) + 200).is_empty());
        assert!(!engine.is_running());

        // Past the window: auto-resume.
        let events = engine.tick(T0 + secs(25 * 60) + AUTO_RESUME_DELAY_MS);
        assert!(matches!(events[0], Event::PhaseStarted { phase: Phase::Rest, .. }));
        assert!(engine.is_running());
    }

    #[test]
    fn zero_crossing_transitions_exactly_once() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        engine.start(T0);
        let done = T0 + secs(25 * 60);
        let first = engine.tick(done);
        assert_eq!(first.len(), 1);
        assert_eq!(engine.transition_seq(), 1);
        // A near-duplicate tick observing the same crossing does nothing.
        let second = engine.tick(done + 50);
        assert!(second.is_empty());
        assert_eq!(engine.transition_seq(), 1);
    }

    #[test]
    fn rest_completion_marks_one_full_cycle() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        engine.start(T0);
        let rest_start = T0 + secs(25 * 60) + AUTO_RESUME_DELAY_MS;
        engine.tick(T0 + secs(25 * 60));
        engine.tick(rest_start);
        let events = engine.tick(rest_start + secs(5 * 60));
        assert!(matches!(
            events[0],
            Event::PhaseCompleted { phase: Phase::Rest, next_phase: Phase::Work, .. }
        ));
        assert!(matches!(events[1], Event::CycleCompleted { seq: 2, .. }));
        assert!(engine.cycle_complete_pending());
        engine.dismiss_cycle_complete();
        assert!(!engine.cycle_complete_pending());
    }

    #[test]
    fn pause_during_debounce_cancels_auto_resume() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        engine.start(T0);
        let done = T0 + secs(25 * 60);
        engine.tick(done);
        assert!(!engine.is_running());

        engine.pause(done + 200);
        assert!(engine.tick(done + AUTO_RESUME_DELAY_MS).is_empty());
        assert!(!engine.is_running());

        // An explicit start still works afterwards.
        engine.start(done + secs(1));
        assert!(engine.is_running());
    }

    #[test]
    fn skip_while_stopped_runs_completion_path() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        let events = engine.skip(T0);
        assert!(matches!(events[0], Event::PhaseSkipped { from: Phase::Work, to: Phase::Rest, .. }));
        assert!(matches!(events[1], Event::PhaseCompleted { .. }));
        assert_eq!(engine.phase(), Phase::Rest);
        assert_eq!(engine.remaining_at(T0), 5 * 60);
        // Auto-resume still applies.
        engine.tick(T0 + AUTO_RESUME_DELAY_MS);
        assert!(engine.is_running());
    }

    #[test]
    fn skip_while_running_is_a_no_op() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        engine.start(T0);
        assert!(engine.skip(T0 + secs(5)).is_empty());
        assert_eq!(engine.phase(), Phase::Work);
        assert!(engine.is_running());
    }

    #[test]
    fn preset_change_while_running_leaves_state_untouched() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        engine.start(T0);
        engine.tick(T0 + secs(60));
        let before = (engine.phase(), engine.remaining_at(T0 + secs(60)), engine.preset());
        assert!(engine.set_preset(PresetId::Focus, T0 + secs(60)).is_err());
        assert!(engine.set_custom_timings(10, 2, T0 + secs(60)).is_err());
        let after = (engine.phase(), engine.remaining_at(T0 + secs(60)), engine.preset());
        assert_eq!(before, after);
    }

    #[test]
    fn preset_change_while_stopped_resets_to_work() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        engine.set_custom_timings(40, 8, T0).unwrap();
        assert_eq!(engine.preset(), PresetId::Custom);
        assert_eq!(engine.remaining_at(T0), 40 * 60);

        engine.skip(T0); // Move to REST so the reset is observable.
        assert_eq!(engine.phase(), Phase::Rest);

        engine.set_preset(PresetId::Focus, T0).unwrap();
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.remaining_at(T0), 50 * 60);
        assert!(engine.custom_timings().is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn custom_rest_duration_is_used_on_work_completion() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        engine.set_custom_timings(2, 7, T0).unwrap();
        engine.start(T0);
        engine.tick(T0 + secs(2 * 60));
        assert_eq!(engine.phase(), Phase::Rest);
        assert_eq!(engine.remaining_at(T0 + secs(2 * 60)), 7 * 60);
    }

    #[test]
    fn custom_timings_below_minimum_are_rejected() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        assert!(engine.set_custom_timings(0, 5, T0).is_err());
        assert!(engine.set_custom_timings(25, 0, T0).is_err());
        assert_eq!(engine.preset(), PresetId::Standard);
    }

    #[test]
    fn milestones_emit_once_per_second() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        engine.start(T0);
        let at_ten = T0 + secs(25 * 60 - 10);
        let events = engine.tick(at_ten);
        assert!(matches!(events[..], [Event::Milestone { seconds_left: 10, .. }]));
        // Sub-second tick overlap within the same remaining second.
        assert!(engine.tick(at_ten + 100).is_empty());
        assert!(engine.tick(at_ten + 400).is_empty());
        let events = engine.tick(at_ten + secs(5));
        assert!(matches!(events[..], [Event::Milestone { seconds_left: 5, .. }]));
    }

    #[test]
    fn work_elapsed_pauses_and_resets() {
        let mut engine = TimerEngine::new(PresetId::Standard);
        engine.start(T0);
        assert_eq!(engine.work_elapsed_secs(T0 + secs(100)), 100);
        engine.pause(T0 + secs(100));
        // Paused: accumulator holds.
        assert_eq!(engine.work_elapsed_secs(T0 + secs(500)), 100);
        engine.start(T0 + secs(500));
        assert_eq!(engine.work_elapsed_secs(T0 + secs(560)), 160);
        // Leaving WORK resets to zero.
        engine.pause(T0 + secs(560));
        engine.skip(T0 + secs(560));
        assert_eq!(engine.work_elapsed_secs(T0 + secs(560)), 0);
    }

    #[test]
    fn start_with_zero_remaining_is_a_no_op() {
        let mut engine = TimerEngine::from_parts(Phase::Work, 0, false, PresetId::Standard, T0);
        assert!(engine.start(T0).is_empty());
        assert!(!engine.is_running());
    }
}
