mod clock;
mod engine;
mod preset;
mod screen_break;

pub use clock::{now_ms, Countdown};
pub use engine::{Phase, TimerEngine, AUTO_RESUME_DELAY_MS};
pub use preset::{CustomTimings, Preset, PresetId};
pub use screen_break::{
    ScreenBreakState, BREAK_COUNTDOWN_SECS, SCREEN_BREAK_INTERVAL_SECS, SNOOZE_DELAY_SECS,
};

pub(crate) use engine::configured_duration_secs;
