//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/update/get/list/delete APIs.
//! - Derive `preview_text` from markdown content.
//! - Seal and open note bodies through a [`ContentCipher`].
//!
//! # Invariants
//! - Encrypted notes never carry a preview and never store plaintext.
//! - `update_note` refuses content edits on encrypted notes; use
//!   `update_encrypted_content` instead.
//! - Tag names are normalized to lowercase and deduplicated.

use crate::config::CoreConfig;
use crate::crypto::{CipherError, ContentCipher};
use crate::model::note::Note;
use crate::model::EntityId;
use crate::repo::note_repo::{
    normalize_note_limit, normalize_tag, normalize_tags, NoteListQuery, NoteRepository,
};
use crate::repo::{RepoError, RepoResult};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const PREVIEW_MAX_CHARS: usize = 100;

static MARKDOWN_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\(([^)]+)\)").expect("valid image regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\*_`#>~\-\[\]\(\)!]+"#).expect("valid markdown symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Tag input contains empty values.
    InvalidTag(String),
    NoteNotFound(EntityId),
    /// Plain content edit attempted on a sealed note.
    EncryptedNote(EntityId),
    AlreadyEncrypted(EntityId),
    NotEncrypted(EntityId),
    Cipher(CipherError),
    Repo(RepoError),
    /// Write succeeded but read-back did not find the note.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::EncryptedNote(id) => {
                write!(f, "note {id} is encrypted; plain content edits are refused")
            }
            Self::AlreadyEncrypted(id) => write!(f, "note {id} is already encrypted"),
            Self::NotEncrypted(id) => write!(f, "note {id} is not encrypted"),
            Self::Cipher(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cipher(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<CipherError> for NoteServiceError {
    fn from(value: CipherError) -> Self {
        Self::Cipher(value)
    }
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResult {
    /// Items sorted by `updated_at DESC, id ASC`.
    pub items: Vec<Note>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
    page_size: u32,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            page_size: normalize_note_limit(None),
        }
    }

    /// Page size used when `list_notes` gets no explicit limit.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = normalize_note_limit(Some(page_size));
        self
    }

    pub fn from_config(repo: R, config: &CoreConfig) -> Self {
        Self::new(repo).with_page_size(config.notes_page_size)
    }

    /// Creates one note from a title and markdown content.
    pub fn create_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Note, NoteServiceError> {
        let mut note = Note::new(title, content);
        note.preview_text = derive_preview_text(&note.content);
        self.repo.save(&note)?;
        self.read_back(note.id, "created note not found in read-back")
    }

    /// Replaces title and/or content and recomputes the preview.
    pub fn update_note(
        &self,
        id: EntityId,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self.require(id)?;
        if note.is_encrypted && content.is_some() {
            return Err(NoteServiceError::EncryptedNote(id));
        }
        note.update(title, content);
        if !note.is_encrypted {
            note.preview_text = derive_preview_text(&note.content);
        }
        self.repo.save(&note)?;
        self.read_back(id, "updated note not found in read-back")
    }

    pub fn get_note(&self, id: EntityId) -> RepoResult<Option<Note>> {
        self.repo.fetch_by_id(id)
    }

    pub fn delete_note(&self, id: EntityId) -> Result<(), NoteServiceError> {
        self.repo.delete(id)?;
        Ok(())
    }

    /// Lists notes using optional single-tag filter and pagination.
    pub fn list_notes(
        &self,
        tag: Option<String>,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<NotesListResult, NoteServiceError> {
        let applied_limit = match limit {
            Some(0) | None => self.page_size,
            explicit => normalize_note_limit(explicit),
        };
        let query = NoteListQuery {
            tag: tag.and_then(|value| normalize_tag(value.as_str())),
            limit: Some(applied_limit),
            offset,
        };
        let items = self.repo.list_notes(&query)?;
        Ok(NotesListResult {
            items,
            applied_limit,
        })
    }

    pub fn search_titles(&self, needle: &str) -> RepoResult<Vec<Note>> {
        self.repo.search_titles(needle)
    }

    /// Atomically replaces the full tag set for one note.
    pub fn set_note_tags(
        &self,
        id: EntityId,
        tags: Vec<String>,
    ) -> Result<Note, NoteServiceError> {
        if let Some(blank) = tags.iter().find(|tag| tag.trim().is_empty()) {
            return Err(NoteServiceError::InvalidTag(blank.clone()));
        }

        self.repo.set_note_tags(id, &normalize_tags(&tags))?;
        self.read_back(id, "note missing after tag replacement")
    }

    pub fn list_tags(&self) -> RepoResult<Vec<String>> {
        self.repo.list_tags()
    }

    /// Seals the note body in place and drops its preview.
    pub fn encrypt_note<C: ContentCipher + ?Sized>(
        &self,
        id: EntityId,
        cipher: &C,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self.require(id)?;
        if note.is_encrypted {
            return Err(NoteServiceError::AlreadyEncrypted(id));
        }
        let sealed = cipher.seal(&note.content)?;
        note.seal(sealed);
        self.repo.save(&note)?;
        info!("event=note_encrypt module=service status=ok");
        self.read_back(id, "encrypted note not found in read-back")
    }

    /// Restores the plaintext body permanently and recomputes the preview.
    pub fn decrypt_note<C: ContentCipher + ?Sized>(
        &self,
        id: EntityId,
        cipher: &C,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self.require(id)?;
        if !note.is_encrypted {
            return Err(NoteServiceError::NotEncrypted(id));
        }
        let plaintext = cipher.open(&note.content)?;
        note.unseal(plaintext);
        note.preview_text = derive_preview_text(&note.content);
        self.repo.save(&note)?;
        info!("event=note_decrypt module=service status=ok");
        self.read_back(id, "decrypted note not found in read-back")
    }

    /// Opens a sealed body for display without persisting the plaintext.
    pub fn reveal_content<C: ContentCipher + ?Sized>(
        &self,
        id: EntityId,
        cipher: &C,
    ) -> Result<String, NoteServiceError> {
        let note = self.require(id)?;
        if !note.is_encrypted {
            return Err(NoteServiceError::NotEncrypted(id));
        }
        Ok(cipher.open(&note.content)?)
    }

    /// Replaces the body of a sealed note, sealing the new plaintext.
    pub fn update_encrypted_content<C: ContentCipher + ?Sized>(
        &self,
        id: EntityId,
        plaintext: &str,
        cipher: &C,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self.require(id)?;
        if !note.is_encrypted {
            return Err(NoteServiceError::NotEncrypted(id));
        }
        note.seal(cipher.seal(plaintext)?);
        self.repo.save(&note)?;
        self.read_back(id, "encrypted note not found in read-back")
    }

    fn require(&self, id: EntityId) -> Result<Note, NoteServiceError> {
        self.repo
            .fetch_by_id(id)?
            .ok_or(NoteServiceError::NoteNotFound(id))
    }

    fn read_back(&self, id: EntityId, details: &'static str) -> Result<Note, NoteServiceError> {
        self.repo
            .fetch_by_id(id)?
            .ok_or(NoteServiceError::InconsistentState(details))
    }
}

/// Derives a plain-text preview from markdown content.
///
/// Images are dropped, links keep their label, markdown symbols are removed,
/// whitespace is collapsed and the first 100 chars are retained.
pub fn derive_preview_text(content: &str) -> Option<String> {
    let without_images = MARKDOWN_IMAGE_RE.replace_all(content, " ");
    let without_links = MARKDOWN_LINK_RE.replace_all(&without_images, "$1");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_links, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_symbols, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::derive_preview_text;

    #[test]
    fn preview_drops_images_and_keeps_link_labels() {
        let preview = derive_preview_text("see ![cat](cat.png) [docs](https://x.dev) now")
            .expect("preview should exist");
        assert_eq!(preview, "see docs now");
    }

    #[test]
    fn preview_strips_markdown_symbols_and_limits_length() {
        let source = format!("# title\n\n- **bold** `code`\n{}", "a".repeat(300));
        let text = derive_preview_text(&source).expect("preview_text should exist");
        assert!(!text.contains('#'));
        assert!(!text.contains('*'));
        assert_eq!(text.chars().count(), 100);
    }

    #[test]
    fn preview_is_none_for_symbol_only_content() {
        assert_eq!(derive_preview_text("  # ** -- "), None);
    }
}
