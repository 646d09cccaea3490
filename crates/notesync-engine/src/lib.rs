//! # notesync-engine
//!
//! The note synchronization engine. [`NoteSync`] owns the injected
//! collaborators (knowledge-server API, note cache, settings store, export
//! sink, image uploader), the UI [`EventBus`] and the session state, and
//! exposes every user-level operation:
//!
//! - content fetching through the cache ([`fetcher`]),
//! - note mutation and the Markdown save workflow ([`mutator`], [`workflow`]),
//! - tag membership with optimistic updates ([`tags`]),
//! - Markdown export ([`export`]),
//! - login, listing and selection ([`session`], [`listing`]).

pub mod config;
pub mod export;
pub mod fetcher;
pub mod listing;
pub mod mutator;
pub mod session;
pub mod sink;
pub mod state;
pub mod tags;
pub mod telemetry;
pub mod workflow;

use std::sync::Arc;

use notesync_core::{
    AccountApi, Error, EventBus, EventEnvelope, ExportSink, ImageUploader, Note, NoteApi,
    NoteCache, NoteInfo, Result, SettingsStore, SyncEvent, Tag, TagNode,
};
use tokio::sync::broadcast;

pub use config::SyncConfig;
pub use fetcher::{CacheStatsSnapshot, ContentFetcher};
pub use mutator::NewNote;
pub use session::LoginOptions;
pub use sink::DirectorySink;
pub use state::{Selection, SessionState};
pub use tags::{TagFailurePolicy, TagSyncState, TagUpdate};
pub use workflow::{PendingSave, SaveOutcome, SaveState};

use state::StateCell;

/// Collaborators injected into [`NoteSync`].
pub struct Collaborators {
    pub api: Arc<dyn NoteApi>,
    pub account: Arc<dyn AccountApi>,
    pub cache: Arc<dyn NoteCache>,
    pub settings: Arc<dyn SettingsStore>,
    pub sink: Arc<dyn ExportSink>,
    pub uploader: Option<Arc<dyn ImageUploader>>,
}

/// Synchronization engine for one user session.
pub struct NoteSync {
    api: Arc<dyn NoteApi>,
    account: Arc<dyn AccountApi>,
    settings: Arc<dyn SettingsStore>,
    sink: Arc<dyn ExportSink>,
    uploader: Option<Arc<dyn ImageUploader>>,
    fetcher: ContentFetcher,
    events: EventBus,
    config: SyncConfig,
    state: StateCell,
}

impl NoteSync {
    pub fn new(collaborators: Collaborators, config: SyncConfig) -> Result<Self> {
        config.validate()?;
        let Collaborators {
            api,
            account,
            cache,
            settings,
            sink,
            uploader,
        } = collaborators;

        Ok(Self {
            fetcher: ContentFetcher::new(api.clone(), cache),
            api,
            account,
            settings,
            sink,
            uploader,
            events: EventBus::new(config.event_capacity),
            config,
            state: StateCell::default(),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &ContentFetcher {
        &self.fetcher
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to UI events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// Copy of the session state.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn kb_guid(&self) -> Option<String> {
        self.state.read().kb_guid.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().kb_guid.is_some()
    }

    pub fn active_note(&self) -> Option<Note> {
        self.state.read().active_note.clone()
    }

    pub fn listing(&self) -> Vec<NoteInfo> {
        self.state.read().listing.clone()
    }

    pub fn categories(&self) -> Vec<String> {
        self.state.read().categories.clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.state.read().tags.clone()
    }

    /// Global tags arranged by parent.
    pub fn tag_forest(&self) -> Vec<TagNode> {
        notesync_core::build_tag_forest(&self.state.read().tags)
    }

    pub fn current_category(&self) -> String {
        self.state.read().current_category.clone()
    }

    /// Knowledge base of the session, or `NotLoggedIn`.
    fn require_kb(&self) -> Result<String> {
        self.kb_guid().ok_or(Error::NotLoggedIn)
    }

    /// The open note, or `NoActiveNote`.
    fn require_active(&self) -> Result<Note> {
        self.active_note().ok_or(Error::NoActiveNote)
    }

    fn emit(&self, event: SyncEvent) {
        match self.kb_guid() {
            Some(kb) => self.events.emit_scoped(event, &kb),
            None => self.events.emit(event),
        }
    }

    fn set_active_note(&self, note: Note) {
        self.state.write().active_note = Some(note.clone());
        self.emit(SyncEvent::ActiveNoteReplaced { note });
    }
}
