//! Listing, selection, category and tag tree refresh.

use notesync_core::defaults::settings::CURRENT_CATEGORY;
use notesync_core::defaults::{PAGE_START, TAG_NOTES_ORDER_BY};
use notesync_core::{
    CategoryNotesQuery, LoadingScope, Note, NoteInfo, Result, SyncEvent, Tag, TagNotesQuery,
};
use serde_json::{json, Map};
use notesync_core::logging::NOTE_COUNT;
use tracing::{debug, field, instrument, warn, Span};

use crate::state::Selection;
use crate::NoteSync;

impl NoteSync {
    /// Reload the listing for the current selection.
    pub async fn refresh_listing(&self) -> Result<Vec<NoteInfo>> {
        let kb = self.require_kb()?;
        self.refresh_listing_in(&kb).await
    }

    pub(crate) async fn refresh_listing_in(&self, kb_guid: &str) -> Result<Vec<NoteInfo>> {
        let selection = self.state.read().selection();
        self.load_listing(kb_guid, &selection).await
    }

    /// Listing refresh whose failure is only logged.
    pub(crate) async fn refresh_listing_logged(&self, kb_guid: &str) {
        if let Err(e) = self.refresh_listing_in(kb_guid).await {
            warn!(subsystem = "listing", kb_guid = %kb_guid, error = %e, "Listing refresh failed");
        }
    }

    #[instrument(skip(self), fields(subsystem = "listing", op = "load", note_count = field::Empty))]
    async fn load_listing(&self, kb_guid: &str, selection: &Selection) -> Result<Vec<NoteInfo>> {
        self.emit(SyncEvent::Loading {
            scope: LoadingScope::Listing,
            active: true,
        });
        let result = match selection {
            Selection::Tag(tag) => {
                let query = TagNotesQuery {
                    tag: tag.clone(),
                    start: PAGE_START,
                    count: self.config.page_size,
                    with_abstract: true,
                    order_by: TAG_NOTES_ORDER_BY.to_string(),
                };
                self.api.get_tag_notes(kb_guid, &query).await
            }
            Selection::Category(_) | Selection::All => {
                let query = CategoryNotesQuery {
                    category: selection.as_stored().to_string(),
                    start: PAGE_START,
                    count: self.config.page_size,
                    with_abstract: true,
                };
                self.api.get_category_notes(kb_guid, &query).await
            }
        };
        self.emit(SyncEvent::Loading {
            scope: LoadingScope::Listing,
            active: false,
        });

        let notes = result?;
        Span::current().record(NOTE_COUNT, notes.len());
        debug!("Listing loaded");
        self.state.write().listing = notes.clone();
        self.emit(SyncEvent::ListingRefreshed {
            notes: notes.clone(),
        });
        Ok(notes)
    }

    /// Show `selection` in the listing and persist it as the current
    /// category.
    pub async fn select(&self, selection: Selection) -> Result<Vec<NoteInfo>> {
        let kb = self.require_kb()?;
        let notes = self.load_listing(&kb, &selection).await?;

        let stored = selection.as_stored().to_string();
        self.state.write().current_category = stored.clone();
        let mut items = Map::new();
        items.insert(CURRENT_CATEGORY.to_string(), json!(stored));
        self.settings.set_many(items)?;
        self.emit(SyncEvent::SelectionChanged { selection: stored });
        Ok(notes)
    }

    /// Reload the category tree.
    pub async fn refresh_categories(&self) -> Result<Vec<String>> {
        let kb = self.require_kb()?;
        let categories = self.api.get_categories(&kb).await?;
        self.state.write().categories = categories.clone();
        self.emit(SyncEvent::CategoriesRefreshed {
            categories: categories.clone(),
        });
        Ok(categories)
    }

    /// Reload the global tag list.
    pub async fn refresh_tags(&self) -> Result<Vec<Tag>> {
        let kb = self.require_kb()?;
        let tags = self.api.get_all_tags(&kb).await?;
        self.state.write().tags = tags.clone();
        self.emit(SyncEvent::TagsRefreshed { tags: tags.clone() });
        Ok(tags)
    }

    /// Full-text search; the results replace the listing.
    pub async fn search(&self, text: &str) -> Result<Vec<NoteInfo>> {
        let kb = self.require_kb()?;
        self.emit(SyncEvent::Loading {
            scope: LoadingScope::Listing,
            active: true,
        });
        let result = self.api.search_notes(&kb, text).await;
        self.emit(SyncEvent::Loading {
            scope: LoadingScope::Listing,
            active: false,
        });
        let notes = result?;
        self.state.write().listing = notes.clone();
        self.emit(SyncEvent::ListingRefreshed {
            notes: notes.clone(),
        });
        Ok(notes)
    }

    /// Open a note of the session's knowledge base as the active note.
    pub async fn open_note(&self, doc_guid: &str) -> Result<Note> {
        let kb = self.require_kb()?;
        self.emit(SyncEvent::Loading {
            scope: LoadingScope::ActiveNote,
            active: true,
        });
        let result = self.fetcher.fetch_note_content(&kb, doc_guid).await;
        self.emit(SyncEvent::Loading {
            scope: LoadingScope::ActiveNote,
            active: false,
        });
        let note = result?;
        self.set_active_note(note.clone());
        Ok(note)
    }
}
