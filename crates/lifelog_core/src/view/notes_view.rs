//! Notes screen state.

use super::{matches_search, recover, LoadState};
use crate::model::note::Note;
use crate::model::EntityId;
use crate::repo::note_repo::{normalize_tag, NoteRepository};

pub struct NotesViewModel<R: NoteRepository> {
    repo: R,
    notes: Vec<Note>,
    tags: Vec<String>,
    state: LoadState,
    search_text: String,
    tag_filter: Option<String>,
}

impl<R: NoteRepository> NotesViewModel<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            notes: Vec::new(),
            tags: Vec::new(),
            state: LoadState::Idle,
            search_text: String::new(),
            tag_filter: None,
        }
    }

    /// Reloads notes and known tags from storage.
    pub fn load(&mut self) {
        self.state = LoadState::Loading;
        let notes = self.repo.fetch_all();
        self.notes = recover(notes, Vec::new(), "notes", "load", &mut self.state);
        let tags = self.repo.list_tags();
        self.tags = recover(tags, Vec::new(), "notes", "load_tags", &mut self.state);
        if !self.state.is_failed() {
            self.state = LoadState::settled(self.notes.is_empty());
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    pub fn set_tag_filter(&mut self, tag: Option<&str>) {
        self.tag_filter = tag.and_then(normalize_tag);
    }

    /// Notes passing the tag filter and search text.
    ///
    /// Search covers titles, plus content of notes that are not encrypted.
    pub fn visible_notes(&self) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|note| match &self.tag_filter {
                Some(tag) => note.tags.iter().any(|current| current == tag),
                None => true,
            })
            .filter(|note| {
                let mut fields = vec![note.title.as_str()];
                if !note.is_encrypted {
                    fields.push(note.content.as_str());
                }
                matches_search(&fields, &self.search_text)
            })
            .collect()
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Deletes a note; returns `false` and marks the screen failed on error.
    pub fn delete(&mut self, id: EntityId) -> bool {
        let deleted = self.repo.delete(id).map(|()| true);
        if recover(deleted, false, "notes", "delete", &mut self.state) {
            self.notes.retain(|note| note.id != id);
            self.state = LoadState::settled(self.notes.is_empty());
            true
        } else {
            false
        }
    }
}
