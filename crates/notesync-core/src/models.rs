//! Core data models for notesync.
//!
//! These types mirror the records exchanged with the knowledge server and are
//! shared by the client, store and engine crates. Wire names are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::defaults::{MARKDOWN_SUFFIX, RESOURCE_DIR};

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Storage mode of a note body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NoteType {
    /// Native HTML document.
    #[default]
    Document,
    /// Markdown source embedded in a `<pre>` envelope.
    LiteMarkdown,
    /// Any other server value, kept verbatim.
    Other(String),
}

impl NoteType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Document => "document",
            Self::LiteMarkdown => "lite/markdown",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for NoteType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "document" | "" => Self::Document,
            "lite/markdown" => Self::LiteMarkdown,
            _ => Self::Other(s),
        }
    }
}

impl From<NoteType> for String {
    fn from(t: NoteType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Note metadata as returned by the knowledge server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    #[serde(default)]
    pub kb_guid: String,
    #[serde(default)]
    pub doc_guid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub note_type: NoteType,
    /// Tag GUIDs joined by `*`. See [`crate::tags::TagList`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_modified: Option<i64>,
    #[serde(
        rename = "abstractText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub abstract_text: Option<String>,
    /// Server fields this client does not model, sent back unchanged on
    /// metadata writes.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl NoteInfo {
    /// True when the title selects Markdown authoring mode.
    pub fn is_markdown_titled(&self) -> bool {
        has_markdown_suffix(&self.title)
    }

    /// Cache key for this note's identity.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.kb_guid, &self.doc_guid)
    }
}

/// True when `title` ends with the Markdown suffix.
pub fn has_markdown_suffix(title: &str) -> bool {
    title.ends_with(MARKDOWN_SUFFIX)
}

/// Title without a single trailing Markdown suffix.
pub fn strip_markdown_suffix(title: &str) -> &str {
    title.strip_suffix(MARKDOWN_SUFFIX).unwrap_or(title)
}

/// A binary resource (usually an image) referenced from the note body as
/// `index_files/<name>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Base64-encoded payload when the resource travels inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Resource {
    /// Reference used for this resource inside stored HTML.
    pub fn storage_ref(&self) -> String {
        format!("{}{}", RESOURCE_DIR, self.name)
    }
}

/// Complete note: metadata, HTML body and resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub info: NoteInfo,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Note {
    /// A snapshot with neither identity nor content counts as absent.
    pub fn is_empty(&self) -> bool {
        self.info.doc_guid.is_empty() && self.html.is_empty() && self.resources.is_empty()
    }

    pub fn cache_key(&self) -> CacheKey {
        self.info.cache_key()
    }
}

// =============================================================================
// CACHE KEY
// =============================================================================

/// Identity of a cached note snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub kb_guid: String,
    pub doc_guid: String,
}

impl CacheKey {
    pub fn new(kb_guid: impl Into<String>, doc_guid: impl Into<String>) -> Self {
        Self {
            kb_guid: kb_guid.into(),
            doc_guid: doc_guid.into(),
        }
    }

    /// Parse the string form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("note/")?;
        let (kb, doc) = rest.split_once('/')?;
        if kb.is_empty() || doc.is_empty() {
            return None;
        }
        Some(Self::new(kb, doc))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "note/{}/{}", self.kb_guid, self.doc_guid)
    }
}

// =============================================================================
// TAGS
// =============================================================================

/// A tag record; tags form a forest through `parent_tag_guid`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub tag_guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tag_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<i64>,
}

/// A tag with its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagNode {
    pub tag: Tag,
    pub children: Vec<TagNode>,
}

/// Arrange a flat tag list into a forest. Tags whose parent is missing from
/// the list become roots. Sibling order follows input order.
pub fn build_tag_forest(tags: &[Tag]) -> Vec<TagNode> {
    fn children_of(parent: &str, tags: &[Tag], depth: usize) -> Vec<TagNode> {
        if depth > tags.len() {
            return Vec::new();
        }
        tags.iter()
            .filter(|t| t.parent_tag_guid.as_deref() == Some(parent))
            .map(|t| TagNode {
                tag: t.clone(),
                children: children_of(&t.tag_guid, tags, depth + 1),
            })
            .collect()
    }

    tags.iter()
        .filter(|t| match t.parent_tag_guid.as_deref() {
            None | Some("") => true,
            Some(parent) => !tags.iter().any(|p| p.tag_guid == parent),
        })
        .map(|t| TagNode {
            tag: t.clone(),
            children: children_of(&t.tag_guid, tags, 1),
        })
        .collect()
}

// =============================================================================
// ACCOUNT
// =============================================================================

/// Credentials for the account server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub user_id: String,
    pub password: String,
    /// Account server URL; `None` means the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// User profile returned by login.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub user_guid: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
}

/// Session established by login.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    pub kb_guid: String,
    pub kb_server: String,
    #[serde(default)]
    pub user: UserProfile,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Which parts of a note to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadOptions {
    pub download_info: bool,
    pub download_data: bool,
}

impl DownloadOptions {
    /// Metadata probe without the body.
    pub fn info_only() -> Self {
        Self {
            download_info: true,
            download_data: false,
        }
    }

    /// Metadata and body.
    pub fn full() -> Self {
        Self {
            download_info: true,
            download_data: true,
        }
    }
}

/// Payload for creating a note.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub kb_guid: String,
    pub category: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub html: String,
    #[serde(rename = "type")]
    pub note_type: NoteType,
}

/// Payload for saving a note body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub kb_guid: String,
    pub doc_guid: String,
    pub title: String,
    pub category: String,
    pub html: String,
    /// Names of the resources the body references.
    pub resources: Vec<String>,
    #[serde(rename = "type")]
    pub note_type: NoteType,
}

/// Query for a category listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNotesQuery {
    pub category: String,
    pub start: u32,
    pub count: u32,
    pub with_abstract: bool,
}

/// Query for a tag listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagNotesQuery {
    pub tag: String,
    pub start: u32,
    pub count: u32,
    pub with_abstract: bool,
    pub order_by: String,
}

/// Payload for creating a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_tag_guid: Option<String>,
}

/// Payload for creating a category under `parent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCategoryRequest {
    pub parent: String,
    pub child: String,
    /// Sort position; the client uses the creation time in unix seconds.
    pub pos: String,
}

/// An image to upload as a note resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of an image upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    /// URL to insert into the editor.
    pub url: String,
    /// Resource record when the upload was stored on the note itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

// =============================================================================
// EXPORT
// =============================================================================

/// A Markdown file ready for the export sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownArtifact {
    pub title: String,
    pub content: String,
}
