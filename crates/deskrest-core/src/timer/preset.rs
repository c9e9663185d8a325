//! Work/rest presets and session-only custom timings.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetId {
    Light,
    Standard,
    Focus,
    /// Session-only user override; never part of the persisted catalog.
    Custom,
}

impl PresetId {
    pub fn as_str(self) -> &'static str {
        match self {
            PresetId::Light => "light",
            PresetId::Standard => "standard",
            PresetId::Focus => "focus",
            PresetId::Custom => "custom",
        }
    }
}

impl std::str::FromStr for PresetId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(PresetId::Light),
            "standard" => Ok(PresetId::Standard),
            "focus" => Ok(PresetId::Focus),
            "custom" => Ok(PresetId::Custom),
            other => Err(ValidationError::InvalidDuration {
                field: "preset".into(),
                message: format!("unknown preset '{other}'"),
            }),
        }
    }
}

/// A named (work-minutes, rest-minutes) pair from the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: PresetId,
    pub work_min: u32,
    pub rest_min: u32,
}

impl Preset {
    /// The fixed catalog. `Custom` is deliberately absent: its timings are
    /// supplied per session and never persisted.
    pub fn catalog() -> [Preset; 3] {
        [
            Preset { id: PresetId::Light, work_min: 15, rest_min: 3 },
            Preset { id: PresetId::Standard, work_min: 25, rest_min: 5 },
            Preset { id: PresetId::Focus, work_min: 50, rest_min: 10 },
        ]
    }

    pub fn get(id: PresetId) -> Option<Preset> {
        Self::catalog().into_iter().find(|p| p.id == id)
    }

    pub fn work_secs(&self) -> u32 {
        self.work_min.saturating_mul(60)
    }

    pub fn rest_secs(&self) -> u32 {
        self.rest_min.saturating_mul(60)
    }
}

/// User-supplied work/rest minutes for the current session only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTimings {
    pub work_min: u32,
    pub rest_min: u32,
}

impl CustomTimings {
    /// Both values must be at least one minute.
    pub fn new(work_min: u32, rest_min: u32) -> Result<Self, ValidationError> {
        if work_min < 1 {
            return Err(ValidationError::InvalidDuration {
                field: "work_min".into(),
                message: "must be at least 1 minute".into(),
            });
        }
        if rest_min < 1 {
            return Err(ValidationError::InvalidDuration {
                field: "rest_min".into(),
                message: "must be at least 1 minute".into(),
            });
        }
        Ok(Self { work_min, rest_min })
    }

    pub fn work_secs(&self) -> u32 {
        self.work_min.saturating_mul(60)
    }

    pub fn rest_secs(&self) -> u32 {
        self.rest_min.saturating_mul(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_three_presets() {
        assert_eq!(Preset::catalog().len(), 3);
        assert!(Preset::get(PresetId::Standard).is_some());
        assert!(Preset::get(PresetId::Custom).is_none());
    }

    #[test]
    fn standard_durations() {
        let p = Preset::get(PresetId::Standard).unwrap();
        assert_eq!(p.work_secs(), 25 * 60);
        assert_eq!(p.rest_secs(), 5 * 60);
    }

    #[test]
    fn custom_timings_reject_sub_minute_values() {
        assert!(CustomTimings::new(0, 5).is_err());
        assert!(CustomTimings::new(25, 0).is_err());
        assert!(CustomTimings::new(1, 1).is_ok());
    }

    #[test]
    fn preset_id_parse_roundtrip() {
        for p in Preset::catalog() {
            assert_eq!(p.id.as_str().parse::<PresetId>().unwrap(), p.id);
        }
        assert!("marathon".parse::<PresetId>().is_err());
    }
}
