//! Tag membership of a single note.
//!
//! The server stores a note's tags as one string of tag GUIDs joined by `*`.
//! [`TagList`] is the ordered in-memory form; encoding happens only when the
//! list is written back into [`NoteInfo::tags`](crate::NoteInfo).
//!
//! Attaching does not de-duplicate: attaching the same GUID twice yields two
//! entries, and removing filters every occurrence.

use serde::{Deserialize, Serialize};

use crate::defaults::TAG_DELIMITER;
use crate::error::{Error, Result};

/// Ordered tag GUIDs of one note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagList(Vec<String>);

impl TagList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Decode the server representation. Absent and empty strings decode to
    /// an empty list.
    pub fn decode(encoded: Option<&str>) -> Self {
        match encoded {
            None | Some("") => Self::new(),
            Some(s) => Self(s.split(TAG_DELIMITER).map(String::from).collect()),
        }
    }

    /// Encode for the server.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, guid) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(TAG_DELIMITER);
            }
            out.push_str(guid);
        }
        out
    }

    /// Append a tag GUID.
    pub fn attach(&mut self, tag_guid: &str) -> Result<()> {
        validate_tag_guid(tag_guid)?;
        self.0.push(tag_guid.to_string());
        Ok(())
    }

    /// Remove every occurrence of a tag GUID. Returns how many were removed.
    pub fn remove(&mut self, tag_guid: &str) -> usize {
        let before = self.0.len();
        self.0.retain(|t| t != tag_guid);
        before - self.0.len()
    }

    pub fn contains(&self, tag_guid: &str) -> bool {
        self.0.iter().any(|t| t == tag_guid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for TagList {
    fn from(v: Vec<String>) -> Self {
        Self(v)
    }
}

/// A tag GUID must be non-empty and must not contain the delimiter.
pub fn validate_tag_guid(tag_guid: &str) -> Result<()> {
    if tag_guid.is_empty() {
        return Err(Error::InvalidInput("tag GUID is empty".to_string()));
    }
    if tag_guid.contains(TAG_DELIMITER) {
        return Err(Error::InvalidInput(format!(
            "tag GUID {:?} contains the '{}' delimiter",
            tag_guid, TAG_DELIMITER
        )));
    }
    Ok(())
}
