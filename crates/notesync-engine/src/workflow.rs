//! Save workflow for note bodies.
//!
//! Saving Markdown into a note whose title lacks `.md` converts it into a
//! Markdown note, which must be confirmed first. A [`PendingSave`] carries the
//! prepared body through that decision.

use notesync_core::defaults::MARKDOWN_SUFFIX;
use notesync_core::{has_markdown_suffix, Note, NoteType};

/// Where a pending save stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// The title lacks `.md`; saving would convert the note.
    AwaitingConfirmation,
    /// Ready to send.
    Proceeding,
    /// The conversion was declined; nothing will be sent.
    Abandoned,
}

/// A prepared save of Markdown into an existing note.
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub(crate) note: Note,
    pub(crate) html: String,
    pub(crate) title: String,
    pub(crate) note_type: NoteType,
    state: SaveState,
}

impl PendingSave {
    pub(crate) fn new(note: Note, html: String, note_type: NoteType) -> Self {
        let title = note.info.title.clone();
        let state = if has_markdown_suffix(&title) {
            SaveState::Proceeding
        } else {
            SaveState::AwaitingConfirmation
        };
        Self {
            note,
            html,
            title,
            note_type,
            state,
        }
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    /// Title the note will be saved under.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Embedded body that will be sent.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    /// Accept the conversion. Appends `.md` to the title once; a no-op
    /// unless the save is awaiting confirmation.
    pub fn confirm(&mut self) {
        if self.state == SaveState::AwaitingConfirmation {
            if !has_markdown_suffix(&self.title) {
                self.title.push_str(MARKDOWN_SUFFIX);
            }
            self.state = SaveState::Proceeding;
        }
    }

    /// Decline the conversion.
    pub fn abandon(&mut self) {
        if self.state == SaveState::AwaitingConfirmation {
            self.state = SaveState::Abandoned;
        }
    }
}

/// Result of committing a [`PendingSave`].
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The note was saved; carries the new snapshot.
    Saved(Note),
    /// The conversion was declined and nothing was sent.
    Abandoned,
}
