//! Mood check-in model.
//!
//! # Invariants
//! - `level` lies within `1..=scale.max()`.

use super::{ensure_id, EntityId, ValidationError};
use crate::clock::now_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rating scale a mood entry was recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodScale {
    FivePoint,
    TenPoint,
}

impl MoodScale {
    pub fn max(self) -> u8 {
        match self {
            Self::FivePoint => 5,
            Self::TenPoint => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FivePoint => "five_point",
            Self::TenPoint => "ten_point",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "five_point" => Ok(Self::FivePoint),
            "ten_point" => Ok(Self::TenPoint),
            other => Err(ValidationError::UnknownMoodScale(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: EntityId,
    pub level: u8,
    pub scale: MoodScale,
    pub emoji: Option<String>,
    pub notes: Option<String>,
    pub recorded_at: i64,
}

impl MoodEntry {
    pub fn new(level: u8, scale: MoodScale) -> Result<Self, ValidationError> {
        let entry = Self {
            id: Uuid::new_v4(),
            level,
            scale,
            emoji: None,
            notes: None,
            recorded_at: now_ms(),
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Level mapped onto `0.0..=1.0` so entries on different scales compare.
    pub fn normalized_score(&self) -> f64 {
        let max = f64::from(self.scale.max());
        (f64::from(self.level) - 1.0) / (max - 1.0)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(self.id)?;
        let max = self.scale.max();
        if !(1..=max).contains(&self.level) {
            return Err(ValidationError::LevelOutOfRange {
                level: self.level,
                max,
            });
        }
        Ok(())
    }
}
