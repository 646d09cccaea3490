//! UI event types, envelope and event bus.
//!
//! The engine never touches the editor directly. Every state change the UI
//! must reflect (listing refresh, active note replacement, tag membership,
//! loading spinners, notifications) is broadcast as a [`SyncEvent`] wrapped in
//! an [`EventEnvelope`]. UI layers subscribe independently.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Note, NoteInfo, Resource, Tag};

// ============================================================================
// Event Envelope
// ============================================================================

/// Versioned envelope around a [`SyncEvent`].
///
/// `event_type` uses dot-namespaced names (e.g. `"listing.refreshed"`).
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type.
    pub event_type: String,
    /// When the event occurred (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Knowledge base the event belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_guid: Option<String>,
    /// Payload schema version.
    pub payload_version: u32,
    pub payload: SyncEvent,
}

impl EventEnvelope {
    pub fn new(event: SyncEvent) -> Self {
        Self::scoped(event, None)
    }

    /// Envelope tagged with the knowledge base the event belongs to.
    pub fn scoped(event: SyncEvent, kb_guid: Option<String>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            kb_guid,
            payload_version: 1,
            payload: event,
        }
    }
}

// ============================================================================
// Sync Event (domain payloads)
// ============================================================================

/// Which loading indicator a toggle applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingScope {
    /// The note listing.
    Listing,
    /// The active note body.
    ActiveNote,
    /// A batch export.
    Export,
}

/// State changes the UI consumes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SyncEvent {
    /// A loading indicator was switched on or off.
    Loading { scope: LoadingScope, active: bool },
    /// The note listing for the current selection was refreshed.
    ListingRefreshed { notes: Vec<NoteInfo> },
    /// The active note was replaced with a new snapshot.
    ActiveNoteReplaced { note: Note },
    /// The active note was closed (e.g. deleted).
    ActiveNoteCleared,
    /// The active note's encoded tag string changed.
    ActiveNoteTagsChanged { tags: String },
    /// A resource was appended to the active note.
    ActiveNoteResourceAdded { resource: Resource },
    /// An uploaded image should be inserted at the cursor.
    ResourceInserted { url: String },
    /// The current category or tag selection changed.
    SelectionChanged { selection: String },
    /// The category tree was refreshed.
    CategoriesRefreshed { categories: Vec<String> },
    /// The global tag list was refreshed.
    TagsRefreshed { tags: Vec<Tag> },
    /// A note body was saved.
    NoteSaved { doc_guid: String, title: String },
    /// A note was deleted.
    NoteDeleted { doc_guid: String },
    /// A category was deleted.
    CategoryDeleted { category: String },
    /// Notes were handed to the export sink.
    NotesExported { count: usize },
    /// A session was established.
    LoggedIn { user_id: String },
    /// The session was closed.
    LoggedOut,
}

impl SyncEvent {
    /// Namespaced event type for the envelope.
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            SyncEvent::Loading { .. } => "ui.loading",
            SyncEvent::ListingRefreshed { .. } => "listing.refreshed",
            SyncEvent::ActiveNoteReplaced { .. } => "active_note.replaced",
            SyncEvent::ActiveNoteCleared => "active_note.cleared",
            SyncEvent::ActiveNoteTagsChanged { .. } => "active_note.tags_changed",
            SyncEvent::ActiveNoteResourceAdded { .. } => "active_note.resource_added",
            SyncEvent::ResourceInserted { .. } => "editor.resource_inserted",
            SyncEvent::SelectionChanged { .. } => "selection.changed",
            SyncEvent::CategoriesRefreshed { .. } => "categories.refreshed",
            SyncEvent::TagsRefreshed { .. } => "tags.refreshed",
            SyncEvent::NoteSaved { .. } => "note.saved",
            SyncEvent::NoteDeleted { .. } => "note.deleted",
            SyncEvent::CategoryDeleted { .. } => "category.deleted",
            SyncEvent::NotesExported { .. } => "notes.exported",
            SyncEvent::LoggedIn { .. } => "session.logged_in",
            SyncEvent::LoggedOut => "session.logged_out",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast-based event bus.
///
/// Uses `tokio::sync::broadcast`. Slow receivers that fall behind get a
/// `Lagged` error and miss events; UI state is always re-derivable from the
/// next refresh.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    ///
    /// Recommended: 256 for production, 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: SyncEvent) {
        self.send(EventEnvelope::new(event));
    }

    /// Emit an event tagged with its knowledge base.
    pub fn emit_scoped(&self, event: SyncEvent, kb_guid: &str) {
        let kb = (!kb_guid.is_empty()).then(|| kb_guid.to_string());
        self.send(EventEnvelope::scoped(event, kb));
    }

    fn send(&self, envelope: EventEnvelope) {
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive enveloped events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_CAPACITY)
    }
}
