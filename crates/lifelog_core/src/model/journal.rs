//! Journal entry model.

use super::{ensure_id, EntityId, ValidationError};
use crate::clock::now_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound of the journal mood slider.
pub const JOURNAL_MOOD_MAX: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntityId,
    pub content: String,
    /// Optional `1..=10` mood rating attached to the entry.
    pub mood_level: Option<u8>,
    pub is_dream: bool,
    pub is_gratitude: bool,
    /// Writing prompt the entry answers, if any.
    pub prompt: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl JournalEntry {
    pub fn new(content: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            mood_level: None,
            is_dream: false,
            is_gratitude: false,
            prompt: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.touch();
    }

    pub fn set_mood(&mut self, mood_level: Option<u8>) {
        self.mood_level = mood_level;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = now_ms().max(self.updated_at);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(self.id)?;
        if let Some(level) = self.mood_level {
            if !(1..=JOURNAL_MOOD_MAX).contains(&level) {
                return Err(ValidationError::LevelOutOfRange {
                    level,
                    max: JOURNAL_MOOD_MAX,
                });
            }
        }
        Ok(())
    }
}
