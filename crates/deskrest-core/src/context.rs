//! Process-wide timer session.
//!
//! `SessionContext` is the single owner of mutable timer state: the phase
//! engine, the screen-break engine, and their persistence. It is created
//! once per session, hydrated from the persisted snapshots, and dropped at
//! session end. Consumers read state through `status()` and issue the
//! command methods; they never mutate timer fields directly.
//!
//! Concurrency model: single-threaded and cooperative. The caller drives
//! `tick()` from its own scheduling loop (sub-second cadence); commands and
//! ticks therefore interleave atomically. Two concurrent processes are not
//! coordinated: they write the same kv records and the last writer wins.
//!
//! Persistence happens after every state change. Writes are cheap and
//! idempotent, so failures are dropped (reported on the developer channel)
//! and retried naturally on the next change. Habit recording and alert
//! delivery are fire-and-forget for the same reason: the timer keeps
//! functioning when every optional subsystem fails.

use chrono::{Local, Utc};

use crate::alerts::AlertSink;
use crate::error::CoreError;
use crate::events::Event;
use crate::habit::{HabitKind, HabitSink};
use crate::storage::snapshot::{self, TimerSnapshot};
use crate::storage::{Config, Database};
use crate::timer::{
    Countdown, Phase, PresetId, ScreenBreakState, TimerEngine, BREAK_COUNTDOWN_SECS,
};

pub struct SessionContext {
    engine: TimerEngine,
    screen_break: ScreenBreakState,
    /// Wall-clock anchor for the visible 20-second break countdown;
    /// `Some` iff the prompt is open.
    break_anchor: Option<Countdown>,
    db: Database,
    config: Config,
    habits: Box<dyn HabitSink>,
    alerts: Box<dyn AlertSink>,
}

impl SessionContext {
    /// Hydrate a session from persisted state.
    ///
    /// The timer snapshot is reconciled against the time gap since it was
    /// written; the screen-break record is discarded unless it belongs to
    /// today. No events fire during hydration.
    pub fn open(
        db: Database,
        config: Config,
        habits: Box<dyn HabitSink>,
        alerts: Box<dyn AlertSink>,
        now_ms: u64,
    ) -> Self {
        let stored = snapshot::load_timer_snapshot(&db);
        let engine = TimerSnapshot::restore(stored, config.timer.preset, now_ms);
        let today = Local::now().date_naive();
        let mut screen_break = snapshot::load_screen_break(&db, today);
        // A prompt cannot survive a reload open; close it without advancing
        // the trigger mark, like a snoozeless dismiss at the same boundary.
        let break_anchor = None;
        if screen_break.is_open {
            screen_break.is_open = false;
            screen_break.countdown_secs = 0;
        }
        Self {
            engine,
            screen_break,
            break_anchor,
            db,
            config,
            habits,
            alerts,
        }
    }

    /// Open against the default database, config, and local habit log.
    pub fn open_default(
        alerts: Box<dyn AlertSink>,
        now_ms: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open()?;
        let habits: Box<dyn HabitSink> = Box::new(Database::open()?);
        let config = Config::load_or_default();
        Ok(Self::open(db, config, habits, alerts, now_ms))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn remaining_at(&self, now_ms: u64) -> u32 {
        self.engine.remaining_at(now_ms)
    }

    pub fn preset(&self) -> PresetId {
        self.engine.preset()
    }

    pub fn cycle_complete_pending(&self) -> bool {
        self.engine.cycle_complete_pending()
    }

    pub fn screen_break(&self) -> &ScreenBreakState {
        &self.screen_break
    }

    /// The consumer read contract in one record.
    pub fn status(&self, now_ms: u64) -> Event {
        let mut screen_break = self.screen_break.clone();
        if let Some(anchor) = self.break_anchor {
            screen_break.countdown_secs = anchor.remaining_at(now_ms);
        }
        Event::StateSnapshot {
            phase: self.engine.phase(),
            remaining_secs: self.engine.remaining_at(now_ms),
            is_running: self.engine.is_running(),
            preset: self.engine.preset(),
            work_elapsed_secs: self.engine.work_elapsed_secs(now_ms),
            cycle_complete_pending: self.engine.cycle_complete_pending(),
            screen_break,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.start(now_ms);
        self.after_mutation(&events, now_ms);
        events
    }

    pub fn pause(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.pause(now_ms);
        self.after_mutation(&events, now_ms);
        events
    }

    pub fn toggle(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.toggle(now_ms);
        self.after_mutation(&events, now_ms);
        events
    }

    pub fn skip(&mut self, now_ms: u64) -> Vec<Event> {
        let events = self.engine.skip(now_ms);
        self.after_mutation(&events, now_ms);
        events
    }

    /// Change preset and write it through to settings. The engine change is
    /// optimistic: if the settings write fails, both are reverted and the
    /// error is returned for display.
    pub fn set_preset(&mut self, id: PresetId, now_ms: u64) -> Result<Vec<Event>, CoreError> {
        let engine_before = self.engine.clone();
        let events = self.engine.set_preset(id, now_ms)?;
        if let Err(e) = self.config.set("timer.preset", id.as_str()) {
            self.engine = engine_before;
            return Err(e.into());
        }
        self.after_mutation(&events, now_ms);
        Ok(events)
    }

    /// Session-only custom timings; deliberately not written to settings.
    pub fn set_custom_timings(
        &mut self,
        work_min: u32,
        rest_min: u32,
        now_ms: u64,
    ) -> Result<Vec<Event>, CoreError> {
        let events = self.engine.set_custom_timings(work_min, rest_min, now_ms)?;
        self.after_mutation(&events, now_ms);
        Ok(events)
    }

    pub fn dismiss_cycle_complete(&mut self, now_ms: u64) {
        self.engine.dismiss_cycle_complete();
        self.persist(now_ms);
    }

    /// Acknowledge the open screen-break prompt ("done").
    pub fn screen_break_done(&mut self, now_ms: u64) -> Vec<Event> {
        if !self.screen_break.is_open {
            return Vec::new();
        }
        let events = vec![self.close_prompt(true, now_ms)];
        self.after_mutation(&events, now_ms);
        events
    }

    /// Snooze the open prompt for five minutes of work time.
    pub fn screen_break_snooze(&mut self, now_ms: u64) -> Vec<Event> {
        if !self.screen_break.is_open {
            return Vec::new();
        }
        let work_elapsed = self.engine.work_elapsed_secs(now_ms);
        self.screen_break.snooze(work_elapsed);
        self.break_anchor = None;
        let events = vec![Event::ScreenBreakDismissed {
            acknowledged: false,
            at: Utc::now(),
        }];
        self.after_mutation(&events, now_ms);
        events
    }

    /// Update the sound setting with write-through and revert-on-failure.
    pub fn set_sound_enabled(&mut self, enabled: bool) -> Result<(), CoreError> {
        self.config
            .set("alerts.sound_enabled", if enabled { "true" } else { "false" })
            .map_err(Into::into)
    }

    /// Update the notification setting with write-through and
    /// revert-on-failure.
    pub fn set_notifications_enabled(&mut self, enabled: bool) -> Result<(), CoreError> {
        self.config
            .set(
                "alerts.notifications_enabled",
                if enabled { "true" } else { "false" },
            )
            .map_err(Into::into)
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Advance everything. Call at sub-second cadence; the screen-break
    /// countdown derives per-second granularity from its own anchor.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = self.engine.tick(now_ms);

        // Screen breaks only accrue while WORK is actively running.
        if self.engine.phase() == Phase::Work && self.engine.is_running() {
            let work_elapsed = self.engine.work_elapsed_secs(now_ms);
            if self.screen_break.observe_work_elapsed(work_elapsed) {
                self.break_anchor = Some(Countdown::begin(BREAK_COUNTDOWN_SECS, now_ms));
                events.push(Event::ScreenBreakOpened {
                    work_elapsed_secs: work_elapsed,
                    at: Utc::now(),
                });
            }
        }

        if self.screen_break.is_open {
            if let Some(anchor) = self.break_anchor {
                let left = anchor.remaining_at(now_ms);
                self.screen_break.countdown_secs = left;
                if left == 0 {
                    // Countdown expiry dismisses exactly like "done".
                    events.push(self.close_prompt(true, now_ms));
                }
            }
        }

        // An open prompt mutates countdown_secs even while the engine is
        // paused, so it keeps the persistence gate open too.
        if !events.is_empty() || self.engine.is_running() || self.screen_break.is_open {
            self.react(&events);
            self.persist(now_ms);
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Close the prompt and, for acknowledgements, log the screen-break
    /// habit. Does not persist; callers do.
    fn close_prompt(&mut self, acknowledged: bool, now_ms: u64) -> Event {
        let work_elapsed = self.engine.work_elapsed_secs(now_ms);
        self.screen_break.acknowledge(work_elapsed);
        self.break_anchor = None;
        if acknowledged {
            if let Err(e) = self.habits.record(HabitKind::ScreenBreak, Utc::now()) {
                debug_log(&format!("habit record failed: {e}"));
            }
        }
        Event::ScreenBreakDismissed {
            acknowledged,
            at: Utc::now(),
        }
    }

    fn after_mutation(&mut self, events: &[Event], now_ms: u64) {
        self.react(events);
        self.persist(now_ms);
    }

    /// Route events to the fire-and-forget sinks. The habit log receives
    /// exactly one record per `CycleCompleted`, which the engine emits once
    /// per zero-crossing.
    fn react(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::PhaseCompleted { phase, next_phase, .. } => {
                    self.alerts.phase_completed(*phase, *next_phase);
                }
                Event::CycleCompleted { .. } => {
                    if let Err(e) = self.habits.record(HabitKind::RestBreak, Utc::now()) {
                        debug_log(&format!("habit record failed: {e}"));
                    }
                }
                Event::Milestone { seconds_left, .. } => {
                    self.alerts.milestone(*seconds_left);
                }
                Event::ScreenBreakOpened { .. } => {
                    self.alerts.screen_break_opened();
                }
                _ => {}
            }
        }
    }

    fn persist(&self, now_ms: u64) {
        let snap = TimerSnapshot::capture(&self.engine, now_ms);
        if let Err(e) = snapshot::save_timer_snapshot(&self.db, &snap) {
            debug_log(&format!("snapshot write failed: {e}"));
        }
        if let Err(e) = snapshot::save_screen_break(&self.db, &self.screen_break) {
            debug_log(&format!("screen-break write failed: {e}"));
        }
    }
}

/// Developer-only channel; silent unless DESKREST_DEBUG is set.
fn debug_log(msg: &str) {
    if std::env::var("DESKREST_DEBUG").is_ok() {
        eprintln!("deskrest: {msg}");
    }
}
