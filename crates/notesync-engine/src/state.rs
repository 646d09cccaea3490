//! Session state shared by the engine's operations.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use notesync_core::{Note, NoteInfo, Tag};

/// What the note listing currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Notes of a category path such as `/My Notes/`.
    Category(String),
    /// Notes carrying a tag.
    Tag(String),
    /// Every note (empty category).
    All,
}

impl Selection {
    /// The string persisted as `currentCategory`.
    pub fn as_stored(&self) -> &str {
        match self {
            Selection::Category(c) | Selection::Tag(c) => c,
            Selection::All => "",
        }
    }
}

/// Mutable state of one signed-in session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub kb_guid: Option<String>,
    pub user_id: Option<String>,
    /// Category path or tag GUID the listing shows; empty means all notes.
    pub current_category: String,
    pub active_note: Option<Note>,
    pub listing: Vec<NoteInfo>,
    pub categories: Vec<String>,
    pub tags: Vec<Tag>,
}

impl SessionState {
    /// True when the current selection names a known tag.
    pub fn selection_is_tag(&self) -> bool {
        !self.current_category.is_empty()
            && self
                .tags
                .iter()
                .any(|t| t.tag_guid == self.current_category)
    }

    pub fn selection(&self) -> Selection {
        if self.current_category.is_empty() {
            Selection::All
        } else if self.selection_is_tag() {
            Selection::Tag(self.current_category.clone())
        } else {
            Selection::Category(self.current_category.clone())
        }
    }

    /// True when `doc_guid` is the open note.
    pub fn is_active(&self, doc_guid: &str) -> bool {
        self.active_note
            .as_ref()
            .is_some_and(|n| n.info.doc_guid == doc_guid)
    }
}

/// Lock around [`SessionState`]. Guards are never held across an `.await`;
/// callers copy what they need out and drop the guard.
#[derive(Debug, Default)]
pub(crate) struct StateCell(RwLock<SessionState>);

impl StateCell {
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.0.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.0.write().unwrap_or_else(|e| e.into_inner())
    }
}
