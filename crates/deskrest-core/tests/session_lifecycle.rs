//! Integration tests for the session context: full work/rest cycles,
//! habit recording, and restart reconciliation.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use deskrest_core::storage::Database;
use deskrest_core::{
    AlertSink, Config, CoreError, Event, HabitKind, HabitSink, Phase, SessionContext,
    AUTO_RESUME_DELAY_MS,
};

const T0: u64 = 1_700_000_000_000;

fn secs(n: u64) -> u64 {
    n * 1000
}

#[derive(Default)]
struct RecordingHabits(Rc<RefCell<Vec<HabitKind>>>);

impl HabitSink for RecordingHabits {
    fn record(&self, kind: HabitKind, _at: DateTime<Utc>) -> Result<(), CoreError> {
        self.0.borrow_mut().push(kind);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingAlerts {
    completions: Rc<RefCell<Vec<(Phase, Phase)>>>,
    milestones: Rc<RefCell<Vec<u32>>>,
}

impl AlertSink for RecordingAlerts {
    fn phase_completed(&self, finished: Phase, next: Phase) {
        self.completions.borrow_mut().push((finished, next));
    }
    fn milestone(&self, seconds_left: u32) {
        self.milestones.borrow_mut().push(seconds_left);
    }
    fn screen_break_opened(&self) {}
}

struct Harness {
    ctx: SessionContext,
    habits: Rc<RefCell<Vec<HabitKind>>>,
    completions: Rc<RefCell<Vec<(Phase, Phase)>>>,
    milestones: Rc<RefCell<Vec<u32>>>,
    _dir: tempfile::TempDir,
}

fn harness(now_ms: u64) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("deskrest.db")).unwrap();
    let habit_sink = RecordingHabits::default();
    let habits = habit_sink.0.clone();
    let alert_sink = RecordingAlerts::default();
    let completions = alert_sink.completions.clone();
    let milestones = alert_sink.milestones.clone();
    let ctx = SessionContext::open(
        db,
        Config::default(),
        Box::new(habit_sink),
        Box::new(alert_sink),
        now_ms,
    );
    Harness {
        ctx,
        habits,
        completions,
        milestones,
        _dir: dir,
    }
}

fn rest_breaks(habits: &Rc<RefCell<Vec<HabitKind>>>) -> usize {
    habits
        .borrow()
        .iter()
        .filter(|k| **k == HabitKind::RestBreak)
        .count()
}

#[test]
fn full_cycle_records_one_habit_and_one_dialog() {
    let mut h = harness(T0);
    h.ctx.set_custom_timings(2, 1, T0).unwrap();
    h.ctx.start(T0);

    // WORK elapses.
    let events = h.ctx.tick(T0 + secs(120));
    assert!(matches!(
        events[0],
        Event::PhaseCompleted { phase: Phase::Work, next_phase: Phase::Rest, .. }
    ));
    assert_eq!(rest_breaks(&h.habits), 0);

    // Debounce passes, REST runs and elapses.
    h.ctx.tick(T0 + secs(120) + AUTO_RESUME_DELAY_MS);
    assert!(h.ctx.is_running());
    let rest_end = T0 + secs(180) + AUTO_RESUME_DELAY_MS;
    let events = h.ctx.tick(rest_end);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::CycleCompleted { .. })));

    // Exactly one habit record and one dialog affordance.
    assert_eq!(rest_breaks(&h.habits), 1);
    assert!(matches!(
        h.ctx.status(rest_end),
        Event::StateSnapshot { cycle_complete_pending: true, .. }
    ));

    // Dismissed, it stays away until the next REST completion.
    h.ctx.dismiss_cycle_complete(rest_end);
    h.ctx.tick(rest_end + AUTO_RESUME_DELAY_MS);
    h.ctx.tick(rest_end + secs(30));
    assert!(matches!(
        h.ctx.status(rest_end + secs(30)),
        Event::StateSnapshot { cycle_complete_pending: false, .. }
    ));
    assert_eq!(rest_breaks(&h.habits), 1);
    assert_eq!(h.completions.borrow().len(), 2);
}

#[test]
fn milestone_cues_fire_once_per_second() {
    let mut h = harness(T0);
    h.ctx.set_custom_timings(2, 1, T0).unwrap();
    h.ctx.start(T0);

    h.ctx.tick(T0 + secs(110)); // 10 left
    h.ctx.tick(T0 + secs(110) + 300); // same second again
    h.ctx.tick(T0 + secs(115)); // 5 left
    h.ctx.tick(T0 + secs(117)); // 3 left
    assert_eq!(*h.milestones.borrow(), vec![10, 5, 3]);
}

#[test]
fn state_survives_restart_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deskrest.db");
    {
        let db = Database::open_at(&path).unwrap();
        let mut ctx = SessionContext::open(
            db,
            Config::default(),
            Box::new(RecordingHabits::default()),
            Box::new(RecordingAlerts::default()),
            T0,
        );
        ctx.start(T0);
        ctx.tick(T0 + secs(10)); // persists {remaining: 1490, running}
    }

    // Reopen 100 seconds after the last persisted tick.
    let db = Database::open_at(&path).unwrap();
    let ctx = SessionContext::open(
        db,
        Config::default(),
        Box::new(RecordingHabits::default()),
        Box::new(RecordingAlerts::default()),
        T0 + secs(110),
    );
    assert_eq!(ctx.phase(), Phase::Work);
    assert!(ctx.is_running());
    assert_eq!(ctx.remaining_at(T0 + secs(110)), 25 * 60 - 110);
}

#[test]
fn phase_completing_while_closed_loads_next_phase_stopped_silently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deskrest.db");
    {
        let db = Database::open_at(&path).unwrap();
        let mut ctx = SessionContext::open(
            db,
            Config::default(),
            Box::new(RecordingHabits::default()),
            Box::new(RecordingAlerts::default()),
            T0,
        );
        ctx.start(T0);
        ctx.tick(T0 + secs(10));
    }

    // The whole WORK phase and then some elapses while the app is closed.
    let habit_sink = RecordingHabits::default();
    let habits = habit_sink.0.clone();
    let alert_sink = RecordingAlerts::default();
    let completions = alert_sink.completions.clone();
    let reopened_at = T0 + secs(25 * 60 + 50);
    let db = Database::open_at(&path).unwrap();
    let mut ctx = SessionContext::open(
        db,
        Config::default(),
        Box::new(habit_sink),
        Box::new(alert_sink),
        reopened_at,
    );
    assert_eq!(ctx.phase(), Phase::Rest);
    assert!(!ctx.is_running());
    assert_eq!(ctx.remaining_at(reopened_at), 5 * 60);

    // No stale auto-resume and no side effects for the missed transition.
    ctx.tick(reopened_at + secs(2));
    assert!(!ctx.is_running());
    assert!(habits.borrow().is_empty());
    assert!(completions.borrow().is_empty());
}

#[test]
fn preset_change_while_running_is_rejected_and_state_untouched() {
    let mut h = harness(T0);
    h.ctx.start(T0);
    h.ctx.tick(T0 + secs(60));

    let before = h.ctx.status(T0 + secs(60));
    assert!(h
        .ctx
        .set_preset(deskrest_core::PresetId::Focus, T0 + secs(60))
        .is_err());
    let after = h.ctx.status(T0 + secs(60));

    let (Event::StateSnapshot { phase: p1, remaining_secs: r1, preset: id1, .. },
         Event::StateSnapshot { phase: p2, remaining_secs: r2, preset: id2, .. }) =
        (before, after)
    else {
        panic!("expected state snapshots");
    };
    assert_eq!((p1, r1, id1), (p2, r2, id2));
}
