//! Note mutation.
//!
//! Every write goes to the server first; local state (cache, listing, active
//! note) is updated only from what the server accepted. Server errors are
//! returned unchanged and nothing is compensated.

use chrono::Utc;
use notesync_core::category::{
    child_path, coerce_note_type, duplicate_title, is_lite, parent_or_root,
};
use notesync_core::defaults::settings::USER_ID;
use notesync_core::{
    embed_markdown, CreateCategoryRequest, CreateNoteRequest, EmbedOptions, Error, ImageUpload,
    Note, NoteInfo, NoteType, Result, SyncEvent, UpdateNoteRequest, UploadedImage,
};
use tracing::{debug, info, instrument};

use crate::state::Selection;
use crate::workflow::{PendingSave, SaveOutcome, SaveState};
use crate::NoteSync;

/// A note to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub kb_guid: String,
    pub category: String,
    pub title: String,
    pub owner_id: Option<String>,
}

fn body_type(lite: bool) -> NoteType {
    if lite {
        NoteType::LiteMarkdown
    } else {
        NoteType::Document
    }
}

impl NoteSync {
    /// Create a note titled `title` whose body is a `# title` heading, open
    /// it and refresh the listing.
    #[instrument(skip(self, new_note), fields(subsystem = "mutator", op = "create_note", kb_guid = %new_note.kb_guid, category = %new_note.category))]
    pub async fn create_note(&self, new_note: NewNote) -> Result<Note> {
        let lite = is_lite(&new_note.category);
        let html = embed_markdown(
            &format!("# {}", new_note.title),
            &[],
            EmbedOptions::lite(lite),
        );
        let req = CreateNoteRequest {
            kb_guid: new_note.kb_guid.clone(),
            category: new_note.category.clone(),
            title: new_note.title.clone(),
            owner: new_note.owner_id.clone(),
            html,
            note_type: coerce_note_type(&new_note.category, body_type(lite)),
        };
        let created = self.api.create_note(&new_note.kb_guid, &req).await?;

        let kb = Some(created.kb_guid.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(&new_note.kb_guid)
            .to_string();
        let note = self.fetcher.fetch_note_content(&kb, &created.doc_guid).await?;
        info!(doc_guid = %created.doc_guid, "Note created");

        self.set_active_note(note.clone());
        self.refresh_listing_in(&kb).await?;
        Ok(note)
    }

    /// Create a note in the currently selected category, owned by the
    /// stored user. A tag selection creates at the root.
    pub async fn create_note_in_current_category(&self, title: &str) -> Result<Note> {
        let kb_guid = self.require_kb()?;
        let category = match self.state.read().selection() {
            Selection::Category(c) => c,
            Selection::Tag(_) | Selection::All => String::new(),
        };
        let owner_id = self.settings.get_string(USER_ID)?;
        self.create_note(NewNote {
            kb_guid,
            category,
            title: title.to_string(),
            owner_id,
        })
        .await
    }

    /// Prepare a save of `markdown` into `note`.
    ///
    /// Notes whose title lacks `.md` start awaiting confirmation.
    pub fn begin_update(&self, note: Note, markdown: &str) -> PendingSave {
        let lite = is_lite(&note.info.category);
        let html = embed_markdown(markdown, &note.resources, EmbedOptions::lite(lite));
        let pending = PendingSave::new(note, html, body_type(lite));
        debug!(
            subsystem = "mutator",
            doc_guid = %pending.note.info.doc_guid,
            state = ?pending.state(),
            "Prepared save"
        );
        pending
    }

    /// Send a prepared save.
    ///
    /// A save still awaiting confirmation is refused without contacting the
    /// server; an abandoned one is a no-op.
    #[instrument(skip(self, pending), fields(subsystem = "mutator", op = "commit_update", doc_guid = %pending.note.info.doc_guid))]
    pub async fn commit_update(&self, pending: PendingSave) -> Result<SaveOutcome> {
        match pending.state() {
            SaveState::AwaitingConfirmation => {
                return Err(Error::ConfirmationRequired {
                    title: pending.title.clone(),
                })
            }
            SaveState::Abandoned => {
                debug!("Save abandoned");
                return Ok(SaveOutcome::Abandoned);
            }
            SaveState::Proceeding => {}
        }

        let PendingSave {
            note,
            html,
            title,
            note_type,
            ..
        } = pending;
        let kb = note.info.kb_guid.clone();
        let doc = note.info.doc_guid.clone();

        let req = UpdateNoteRequest {
            kb_guid: kb.clone(),
            doc_guid: doc.clone(),
            title,
            category: note.info.category.clone(),
            html: html.clone(),
            resources: note.resources.iter().map(|r| r.name.clone()).collect(),
            note_type,
        };
        let info = self.api.update_note(&kb, &doc, &req).await?;

        let saved = Note {
            info,
            html,
            resources: note.resources,
        };
        let cache = self.fetcher.cache();
        cache.put(&cache.cache_key(&kb, &doc), &saved)?;

        self.refresh_listing_in(&kb).await?;
        self.set_active_note(saved.clone());
        self.emit(SyncEvent::NoteSaved {
            doc_guid: doc,
            title: saved.info.title.clone(),
        });
        info!(title = %saved.info.title, "Note saved");
        Ok(SaveOutcome::Saved(saved))
    }

    /// Save `markdown` into `note`, asking `decide` when the save would
    /// convert the note to Markdown. `decide` returning false abandons.
    pub async fn update_note<F>(&self, note: Note, markdown: &str, decide: F) -> Result<SaveOutcome>
    where
        F: FnOnce(&PendingSave) -> bool,
    {
        let mut pending = self.begin_update(note, markdown);
        if pending.state() == SaveState::AwaitingConfirmation {
            if decide(&pending) {
                pending.confirm();
            } else {
                pending.abandon();
            }
        }
        self.commit_update(pending).await
    }

    /// [`update_note`](Self::update_note) on the active note.
    pub async fn save_active_note<F>(&self, markdown: &str, decide: F) -> Result<SaveOutcome>
    where
        F: FnOnce(&PendingSave) -> bool,
    {
        let note = self.require_active()?;
        self.update_note(note, markdown, decide).await
    }

    /// Delete a note. Its cache entry is left in place.
    #[instrument(skip(self), fields(subsystem = "mutator", op = "delete_note"))]
    pub async fn delete_note(&self, kb_guid: &str, doc_guid: &str) -> Result<()> {
        self.api.delete_note(kb_guid, doc_guid).await?;

        let was_active = {
            let mut state = self.state.write();
            let active = state.is_active(doc_guid);
            if active {
                state.active_note = None;
            }
            active
        };
        if was_active {
            self.emit(SyncEvent::ActiveNoteCleared);
        }
        self.emit(SyncEvent::NoteDeleted {
            doc_guid: doc_guid.to_string(),
        });

        self.refresh_listing_in(kb_guid).await?;
        Ok(())
    }

    /// Move a note by writing its metadata with the destination category.
    #[instrument(skip(self, info), fields(subsystem = "mutator", op = "move_note", doc_guid = %info.doc_guid, category = %info.category))]
    pub async fn move_note(&self, mut info: NoteInfo) -> Result<()> {
        info.note_type = coerce_note_type(&info.category, info.note_type);
        self.api
            .update_note_info(&info.kb_guid, &info.doc_guid, &info)
            .await?;
        self.refresh_listing_in(&info.kb_guid).await?;
        Ok(())
    }

    /// Copy a note into `info.category`.
    ///
    /// The source body is always downloaded fresh. A copy into the source's
    /// own category gets a disambiguated title.
    #[instrument(skip(self, info), fields(subsystem = "mutator", op = "copy_note", doc_guid = %info.doc_guid, category = %info.category))]
    pub async fn copy_note(&self, info: NoteInfo) -> Result<NoteInfo> {
        let kb = info.kb_guid.clone();
        let source = self.fetcher.fetch_uncached(&kb, &info.doc_guid).await?;

        let same_category = info.category == source.info.category;
        let title = if same_category {
            duplicate_title(&info.title, &self.config.duplicate_marker)
        } else {
            info.title.clone()
        };

        let req = CreateNoteRequest {
            kb_guid: kb.clone(),
            category: info.category.clone(),
            title,
            owner: self.settings.get_string(USER_ID)?,
            html: source.html,
            note_type: coerce_note_type(&info.category, info.note_type.clone()),
        };
        let created = self.api.create_note(&kb, &req).await?;
        debug!(new_doc_guid = %created.doc_guid, same_category, "Note copied");

        let nothing_selected = self.state.read().current_category.is_empty();
        if same_category || nothing_selected {
            self.refresh_listing_in(&kb).await?;
        }
        Ok(created)
    }

    /// Write note metadata only. The cache is not touched.
    pub async fn update_note_info(&self, info: &NoteInfo) -> Result<()> {
        self.api
            .update_note_info(&info.kb_guid, &info.doc_guid, info)
            .await?;
        self.refresh_listing_in(&info.kb_guid).await?;
        Ok(())
    }

    /// Create `child` under the current category and select it.
    #[instrument(skip(self), fields(subsystem = "mutator", op = "create_category"))]
    pub async fn create_category(&self, child: &str) -> Result<String> {
        let kb = self.require_kb()?;
        let current = self.state.read().current_category.clone();
        let req = CreateCategoryRequest {
            parent: parent_or_root(&current).to_string(),
            child: child.to_string(),
            pos: Utc::now().timestamp().to_string(),
        };
        self.api.create_category(&kb, &req).await?;

        self.refresh_categories().await?;
        let path = child_path(&current, child);
        self.select(Selection::Category(path.clone())).await?;
        Ok(path)
    }

    /// Delete a category and fall back to the all-notes selection.
    #[instrument(skip(self), fields(subsystem = "mutator", op = "delete_category"))]
    pub async fn delete_category(&self, category: &str) -> Result<()> {
        let kb = self.require_kb()?;
        self.api.delete_category(&kb, category).await?;

        self.refresh_categories().await?;
        self.select(Selection::All).await?;
        self.emit(SyncEvent::CategoryDeleted {
            category: category.to_string(),
        });
        Ok(())
    }

    /// Upload an image for the active note and announce its URL for
    /// insertion. A returned resource record joins the active note.
    #[instrument(skip(self, image), fields(subsystem = "mutator", op = "upload_image", file_name = %image.file_name))]
    pub async fn upload_image(&self, image: ImageUpload) -> Result<UploadedImage> {
        let uploader = self
            .uploader
            .clone()
            .ok_or_else(|| Error::Config("no image uploader configured".to_string()))?;
        let kb = self.require_kb()?;
        let doc = self.require_active()?.info.doc_guid;

        let uploaded = uploader.upload(&kb, &doc, &image).await?;
        self.emit(SyncEvent::ResourceInserted {
            url: uploaded.url.clone(),
        });

        if let Some(resource) = uploaded.resource.clone() {
            let added = {
                let mut state = self.state.write();
                match state.active_note.as_mut() {
                    Some(note) if note.info.doc_guid == doc => {
                        note.resources.push(resource.clone());
                        true
                    }
                    _ => false,
                }
            };
            if added {
                self.emit(SyncEvent::ActiveNoteResourceAdded { resource });
            }
        }
        Ok(uploaded)
    }
}
