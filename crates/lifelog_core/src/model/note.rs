//! Note domain model.
//!
//! # Invariants
//! - When `is_encrypted` is true, `content` is a sealed envelope starting with
//!   [`CIPHERTEXT_PREFIX`] and `preview_text` is `None`.
//! - `tags` are lowercase, trimmed and unique; they are persisted through the
//!   note/tag link table rather than the `notes` row.

use super::{ensure_id, EntityId, ValidationError};
use crate::clock::now_ms;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker carried by every sealed note body.
pub const CIPHERTEXT_PREFIX: &str = "lifelog-enc:v1:";

/// Leading bytes of every age-encrypted payload.
const AGE_PAYLOAD_HEADER: &[u8] = b"age-encryption.org/";

/// Title used when a note is created without one.
pub const UNTITLED_NOTE: &str = "Untitled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: EntityId,
    pub title: String,
    /// Markdown body, or a sealed envelope when `is_encrypted`.
    pub content: String,
    /// Plain-text summary derived from `content`; never set for sealed notes.
    pub preview_text: Option<String>,
    pub is_encrypted: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub tags: Vec<String>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::build(Uuid::new_v4(), title.into(), content.into())
    }

    /// Creates a note with a caller-provided id (imports, fixtures).
    pub fn with_id(
        id: EntityId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        ensure_id(id)?;
        Ok(Self::build(id, title.into(), content.into()))
    }

    fn build(id: EntityId, title: String, content: String) -> Self {
        let now = now_ms();
        Self {
            id,
            title: normalize_title(title),
            content,
            preview_text: None,
            is_encrypted: false,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        }
    }

    /// Replaces title and/or content and re-stamps `updated_at`.
    pub fn update(&mut self, title: Option<String>, content: Option<String>) {
        if let Some(title) = title {
            self.title = normalize_title(title);
        }
        if let Some(content) = content {
            self.content = content;
        }
        self.touch();
    }

    /// Stores a sealed envelope in place of the plaintext body.
    pub fn seal(&mut self, sealed_content: String) {
        self.content = sealed_content;
        self.preview_text = None;
        self.is_encrypted = true;
        self.touch();
    }

    /// Restores a plaintext body after decryption.
    pub fn unseal(&mut self, plaintext: String) {
        self.content = plaintext;
        self.is_encrypted = false;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = now_ms().max(self.updated_at);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(self.id)?;
        if self.is_encrypted && (!is_sealed(&self.content) || self.preview_text.is_some()) {
            return Err(ValidationError::UnsealedEncryptedContent);
        }
        Ok(())
    }
}

/// Returns whether `content` is a sealed envelope: the marker followed by a
/// base64 age payload. Text that merely starts with the marker does not count.
pub fn is_sealed(content: &str) -> bool {
    content
        .strip_prefix(CIPHERTEXT_PREFIX)
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .is_some_and(|payload| payload.starts_with(AGE_PAYLOAD_HEADER))
}

fn normalize_title(title: String) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        UNTITLED_NOTE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{is_sealed, Note, ValidationError, CIPHERTEXT_PREFIX, UNTITLED_NOTE};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn fake_envelope() -> String {
        let payload = STANDARD.encode(b"age-encryption.org/v1\n-> X25519 stub\n");
        format!("{CIPHERTEXT_PREFIX}{payload}")
    }

    #[test]
    fn blank_title_falls_back_to_untitled() {
        let note = Note::new("   ", "body");
        assert_eq!(note.title, UNTITLED_NOTE);
    }

    #[test]
    fn encrypted_flag_requires_sealed_content() {
        let mut note = Note::new("diary", "secret");
        note.is_encrypted = true;
        assert_eq!(
            note.validate().unwrap_err(),
            ValidationError::UnsealedEncryptedContent
        );

        note.seal(fake_envelope());
        assert!(note.validate().is_ok());
        assert!(note.preview_text.is_none());
    }

    #[test]
    fn marker_alone_is_not_a_sealed_envelope() {
        assert!(is_sealed(&fake_envelope()));
        assert!(!is_sealed(&format!("{CIPHERTEXT_PREFIX}dear diary, today")));
        assert!(!is_sealed(&format!(
            "{CIPHERTEXT_PREFIX}{}",
            STANDARD.encode(b"just plain words")
        )));
        assert!(!is_sealed(CIPHERTEXT_PREFIX));

        let mut note = Note::new("diary", "secret");
        note.seal(format!("{CIPHERTEXT_PREFIX}aGVsbG8="));
        assert_eq!(
            note.validate().unwrap_err(),
            ValidationError::UnsealedEncryptedContent
        );
    }
}
