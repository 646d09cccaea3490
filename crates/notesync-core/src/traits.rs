//! Core traits for notesync collaborators.
//!
//! The engine talks to the knowledge server, the local stores, the export
//! destination and image hosts only through these traits, so each can be
//! swapped for a fake in tests.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::models::*;

// =============================================================================
// REMOTE API TRAITS
// =============================================================================

/// Knowledge-base operations on the remote server.
#[async_trait]
pub trait NoteApi: Send + Sync {
    /// Download a note; `opts` selects metadata only or metadata and body.
    async fn get_note_content(
        &self,
        kb_guid: &str,
        doc_guid: &str,
        opts: DownloadOptions,
    ) -> Result<Note>;

    /// Create a note and return its metadata.
    async fn create_note(&self, kb_guid: &str, req: &CreateNoteRequest) -> Result<NoteInfo>;

    /// Save a note body and return the updated metadata.
    async fn update_note(
        &self,
        kb_guid: &str,
        doc_guid: &str,
        req: &UpdateNoteRequest,
    ) -> Result<NoteInfo>;

    /// Save metadata only.
    async fn update_note_info(&self, kb_guid: &str, doc_guid: &str, info: &NoteInfo)
        -> Result<()>;

    async fn delete_note(&self, kb_guid: &str, doc_guid: &str) -> Result<()>;

    async fn get_category_notes(
        &self,
        kb_guid: &str,
        query: &CategoryNotesQuery,
    ) -> Result<Vec<NoteInfo>>;

    async fn get_categories(&self, kb_guid: &str) -> Result<Vec<String>>;

    async fn get_all_tags(&self, kb_guid: &str) -> Result<Vec<Tag>>;

    async fn get_tag_notes(&self, kb_guid: &str, query: &TagNotesQuery) -> Result<Vec<NoteInfo>>;

    async fn create_tag(&self, kb_guid: &str, req: &CreateTagRequest) -> Result<Tag>;

    async fn rename_tag(&self, kb_guid: &str, tag_guid: &str, name: &str) -> Result<()>;

    async fn move_tag(
        &self,
        kb_guid: &str,
        tag_guid: &str,
        parent_tag_guid: Option<&str>,
    ) -> Result<()>;

    async fn delete_tag(&self, kb_guid: &str, tag_guid: &str) -> Result<()>;

    async fn create_category(&self, kb_guid: &str, req: &CreateCategoryRequest) -> Result<()>;

    async fn delete_category(&self, kb_guid: &str, category: &str) -> Result<()>;

    /// Full-text search.
    async fn search_notes(&self, kb_guid: &str, text: &str) -> Result<Vec<NoteInfo>>;
}

/// Account server operations.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult>;

    async fn logout(&self) -> Result<()>;
}

// =============================================================================
// LOCAL STORE TRAITS
// =============================================================================

/// Local cache of note snapshots.
///
/// Entries are never expired by time; a snapshot is replaced only when a newer
/// one is written under the same key.
pub trait NoteCache: Send + Sync {
    /// Key under which the note `(kb_guid, doc_guid)` is cached.
    fn cache_key(&self, kb_guid: &str, doc_guid: &str) -> CacheKey {
        CacheKey::new(kb_guid, doc_guid)
    }

    fn get(&self, key: &CacheKey) -> Result<Option<Note>>;

    /// Replace the snapshot stored under `key`.
    fn put(&self, key: &CacheKey, note: &Note) -> Result<()>;

    /// Drop a snapshot. Returns whether one was present.
    fn remove(&self, key: &CacheKey) -> Result<bool>;
}

/// Generic key/value settings (`userId`, `url`, `currentCategory`, ...).
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<JsonValue>>;

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<JsonValue>>> {
        keys.iter().map(|k| self.get(k)).collect()
    }

    fn set_many(&self, items: Map<String, JsonValue>) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn remove(&self, key: &str) -> Result<()>;

    /// String value of `key`, ignoring non-string values.
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get(key)?
            .and_then(|v| v.as_str().map(String::from)))
    }
}

// =============================================================================
// OUTPUT TRAITS
// =============================================================================

/// Destination for exported Markdown. Path selection and filename
/// sanitising belong to the sink.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn export_one(&self, content: String) -> Result<()>;

    /// Export a batch in one request.
    async fn export_many(&self, artifacts: Vec<MarkdownArtifact>) -> Result<()>;
}

/// Image host used by the editor's insert-image action.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, kb_guid: &str, doc_guid: &str, image: &ImageUpload)
        -> Result<UploadedImage>;
}
