//! Habit log seams.
//!
//! The timer core only needs the narrow "record a completed break"
//! operation; richer habit CRUD lives behind the `HabitStore` capability
//! trait so a remote-backed implementation can replace the local SQLite one
//! without touching the state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Break-type tag attached to each habit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitKind {
    /// 20-second ocular rest taken during WORK.
    ScreenBreak,
    /// A full REST phase completed (one WORK+REST cycle).
    RestBreak,
}

impl HabitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HabitKind::ScreenBreak => "screen_break",
            HabitKind::RestBreak => "rest_break",
        }
    }

    /// Lenient parse for stored tags; unknown values count as rest breaks.
    pub fn parse(s: &str) -> Self {
        match s {
            "screen_break" => HabitKind::ScreenBreak,
            _ => HabitKind::RestBreak,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitRecord {
    pub id: i64,
    pub kind: HabitKind,
    pub at: DateTime<Utc>,
}

/// Fire-and-forget break recording. The session context calls this once per
/// fresh cycle completion and drops (never propagates) any error.
pub trait HabitSink {
    fn record(&self, kind: HabitKind, at: DateTime<Utc>) -> Result<(), CoreError>;
}

/// Full habit capability: the local SQLite implementation lives on
/// `storage::Database`; a remote-backed one is interchangeable.
pub trait HabitStore {
    fn fetch(&self) -> Result<Vec<HabitRecord>, CoreError>;
    fn create(&self, kind: HabitKind, at: DateTime<Utc>) -> Result<HabitRecord, CoreError>;
    fn delete(&self, id: i64) -> Result<(), CoreError>;
}

/// Discards every record; for sessions that opt out of habit logging.
pub struct NullHabitSink;

impl HabitSink for NullHabitSink {
    fn record(&self, _kind: HabitKind, _at: DateTime<Utc>) -> Result<(), CoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tag_roundtrip() {
        assert_eq!(HabitKind::parse(HabitKind::ScreenBreak.as_str()), HabitKind::ScreenBreak);
        assert_eq!(HabitKind::parse(HabitKind::RestBreak.as_str()), HabitKind::RestBreak);
        assert_eq!(HabitKind::parse("mystery"), HabitKind::RestBreak);
    }
}
