//! Tag membership of the active note and tag tree maintenance.
//!
//! Attaching or removing a tag is applied to the active note before the
//! server sees it. The outcome of the server write is reported as a
//! [`TagSyncState`] instead of an error, and [`TagFailurePolicy`] decides
//! whether a rejected change stays visible.

use std::str::FromStr;

use notesync_core::{
    CreateTagRequest, Error, ErrorReport, Result, SyncEvent, Tag, TagList,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::NoteSync;

/// What to do with an optimistic tag change the server rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagFailurePolicy {
    /// Keep the local value and report it as unconfirmed.
    #[default]
    KeepOptimistic,
    /// Restore the previous value.
    Rollback,
}

impl FromStr for TagFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" | "keep_optimistic" => Ok(Self::KeepOptimistic),
            "rollback" => Ok(Self::Rollback),
            other => Err(Error::Config(format!(
                "unknown tag failure policy '{}' (expected keep or rollback)",
                other
            ))),
        }
    }
}

/// Progress of an optimistic tag change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TagSyncState {
    /// Applied locally, server write outstanding.
    Pending,
    /// The server accepted the change.
    Confirmed,
    /// The server rejected the change; the local value was kept.
    Unconfirmed { error: ErrorReport },
    /// The server rejected the change; the previous value was restored.
    RolledBack { error: ErrorReport },
}

/// Result of [`NoteSync::attach_tag`] and [`NoteSync::remove_tag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUpdate {
    /// Tags of the active note after the operation.
    pub tags: TagList,
    pub state: TagSyncState,
}

#[derive(Debug, Clone, Copy)]
enum Membership {
    Attach,
    Remove,
}

impl Membership {
    fn as_str(self) -> &'static str {
        match self {
            Membership::Attach => "attach_tag",
            Membership::Remove => "remove_tag",
        }
    }
}

impl NoteSync {
    /// Add `tag_guid` to the active note. Attaching a tag twice keeps both
    /// entries.
    pub async fn attach_tag(&self, tag_guid: &str) -> Result<TagUpdate> {
        self.change_membership(tag_guid, Membership::Attach).await
    }

    /// Remove every occurrence of `tag_guid` from the active note.
    pub async fn remove_tag(&self, tag_guid: &str) -> Result<TagUpdate> {
        self.change_membership(tag_guid, Membership::Remove).await
    }

    #[instrument(skip(self), fields(subsystem = "tags", op = change.as_str()))]
    async fn change_membership(&self, tag_guid: &str, change: Membership) -> Result<TagUpdate> {
        let (previous, info) = {
            let mut state = self.state.write();
            let note = state.active_note.as_mut().ok_or(Error::NoActiveNote)?;
            let previous = note.info.tags.clone();
            let mut tags = TagList::decode(previous.as_deref());
            match change {
                Membership::Attach => tags.attach(tag_guid)?,
                Membership::Remove => {
                    let removed = tags.remove(tag_guid);
                    debug!(removed, "Filtered tag occurrences");
                }
            }
            note.info.tags = Some(tags.encode());
            (previous, note.info.clone())
        };
        let kb = info.kb_guid.clone();
        let doc = info.doc_guid.clone();
        let encoded = info.tags.clone().unwrap_or_default();
        self.emit(SyncEvent::ActiveNoteTagsChanged {
            tags: encoded.clone(),
        });
        debug!(doc_guid = %doc, tags = %encoded, state = ?TagSyncState::Pending, "Applied tag change locally");

        let state = match self.api.update_note_info(&kb, &doc, &info).await {
            Ok(()) => {
                self.refresh_listing_logged(&kb).await;
                TagSyncState::Confirmed
            }
            Err(e) => {
                let report = e.report();
                match self.config.tag_failure_policy {
                    TagFailurePolicy::KeepOptimistic => {
                        warn!(doc_guid = %doc, error = %e, "Tag change not confirmed by server");
                        TagSyncState::Unconfirmed { error: report }
                    }
                    TagFailurePolicy::Rollback => {
                        warn!(doc_guid = %doc, error = %e, "Tag change rejected, rolling back");
                        self.restore_tags(&doc, previous);
                        TagSyncState::RolledBack { error: report }
                    }
                }
            }
        };

        self.refresh_tags_logged().await;

        let tags = {
            let state = self.state.read();
            match state.active_note.as_ref().filter(|n| n.info.doc_guid == doc) {
                Some(note) => TagList::decode(note.info.tags.as_deref()),
                None => TagList::decode(Some(&encoded)),
            }
        };
        Ok(TagUpdate { tags, state })
    }

    fn restore_tags(&self, doc_guid: &str, previous: Option<String>) {
        let restored = {
            let mut state = self.state.write();
            match state.active_note.as_mut() {
                Some(note) if note.info.doc_guid == doc_guid => {
                    note.info.tags = previous;
                    Some(note.info.tags.clone().unwrap_or_default())
                }
                _ => None,
            }
        };
        if let Some(tags) = restored {
            self.emit(SyncEvent::ActiveNoteTagsChanged { tags });
        }
    }

    async fn refresh_tags_logged(&self) {
        if let Err(e) = self.refresh_tags().await {
            warn!(subsystem = "tags", error = %e, "Tag list refresh failed");
        }
    }

    /// Create a tag, optionally under `parent_tag_guid`.
    #[instrument(skip(self), fields(subsystem = "tags", op = "create_tag"))]
    pub async fn create_tag(&self, name: &str, parent_tag_guid: Option<&str>) -> Result<Tag> {
        let kb = self.require_kb()?;
        let req = CreateTagRequest {
            name: name.to_string(),
            parent_tag_guid: parent_tag_guid.map(String::from),
        };
        let tag = self.api.create_tag(&kb, &req).await?;
        info!(tag_guid = %tag.tag_guid, "Tag created");
        self.refresh_tags_logged().await;
        Ok(tag)
    }

    #[instrument(skip(self), fields(subsystem = "tags", op = "rename_tag"))]
    pub async fn rename_tag(&self, tag_guid: &str, name: &str) -> Result<()> {
        let kb = self.require_kb()?;
        self.api.rename_tag(&kb, tag_guid, name).await?;
        self.refresh_tags_logged().await;
        Ok(())
    }

    /// Re-parent a tag; `None` moves it to the top level.
    #[instrument(skip(self), fields(subsystem = "tags", op = "move_tag"))]
    pub async fn move_tag(&self, tag_guid: &str, parent_tag_guid: Option<&str>) -> Result<()> {
        let kb = self.require_kb()?;
        self.api.move_tag(&kb, tag_guid, parent_tag_guid).await?;
        self.refresh_tags_logged().await;
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "tags", op = "delete_tag"))]
    pub async fn delete_tag(&self, tag_guid: &str) -> Result<()> {
        let kb = self.require_kb()?;
        self.api.delete_tag(&kb, tag_guid).await?;
        self.refresh_tags_logged().await;
        Ok(())
    }
}
