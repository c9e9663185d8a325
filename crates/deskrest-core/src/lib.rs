//! # Deskrest Core Library
//!
//! Core business logic for Deskrest, a focus-timer wellness companion for
//! remote workers. All operations are available through a standalone CLI
//! binary; any GUI surface is a thin layer over this same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-based WORK/REST state machine. It has no
//!   internal thread; the caller invokes `tick()` periodically, and
//!   remaining time is always recomputed from the countdown anchor so
//!   scheduling jitter never accumulates drift
//! - **Screen Breaks**: a secondary trigger engine that opens a 20-second
//!   ocular-rest prompt for every 20 minutes of active WORK time, with
//!   snooze semantics, persisted per calendar day
//! - **Storage**: SQLite kv records for the timer and screen-break
//!   snapshots (reconciled across restarts) plus the local habit log, and
//!   TOML-based settings
//! - **Seams**: alert delivery and habit recording are fire-and-forget
//!   traits; the timer keeps running when either fails
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: phase state machine
//! - [`SessionContext`]: single process-wide owner wiring engine, screen
//!   breaks, persistence, and sinks together
//! - [`TimerSnapshot`]: persisted timer state and reload reconciliation
//! - [`Config`]: application settings

pub mod alerts;
pub mod context;
pub mod error;
pub mod events;
pub mod habit;
pub mod storage;
pub mod timer;

pub use alerts::{AlertSink, NullAlerts};
pub use context::SessionContext;
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use habit::{HabitKind, HabitRecord, HabitSink, HabitStore, NullHabitSink};
pub use storage::{Config, Database, TimerSnapshot};
pub use timer::{
    now_ms, CustomTimings, Phase, Preset, PresetId, ScreenBreakState, TimerEngine,
    AUTO_RESUME_DELAY_MS, BREAK_COUNTDOWN_SECS, SCREEN_BREAK_INTERVAL_SECS, SNOOZE_DELAY_SECS,
};
