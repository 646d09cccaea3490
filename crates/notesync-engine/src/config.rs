//! Engine configuration.

use notesync_core::defaults::{DUPLICATE_MARKER, EVENT_CAPACITY, PAGE_SIZE, STORE_PATH};
use notesync_core::{Error, Result};

use crate::tags::TagFailurePolicy;

/// Engine settings, read from `NOTESYNC_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Marker inserted into the title of a same-category copy.
    pub duplicate_marker: String,
    /// Listing page size.
    pub page_size: u32,
    /// Event bus buffer capacity.
    pub event_capacity: usize,
    /// What happens to an optimistic tag change the server rejects.
    pub tag_failure_policy: TagFailurePolicy,
    /// Knowledge-server base URL for exported resource links.
    pub resource_base_url: Option<String>,
    /// Path of the JSON store used by the binary.
    pub store_path: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            duplicate_marker: DUPLICATE_MARKER.to_string(),
            page_size: PAGE_SIZE,
            event_capacity: EVENT_CAPACITY,
            tag_failure_policy: TagFailurePolicy::default(),
            resource_base_url: None,
            store_path: STORE_PATH.to_string(),
        }
    }
}

impl SyncConfig {
    /// Create from environment variables.
    ///
    /// Unparseable numbers fall back to their defaults; an unknown tag
    /// failure policy is a configuration error.
    pub fn from_env() -> Result<Self> {
        let tag_failure_policy = match std::env::var("NOTESYNC_TAG_FAILURE_POLICY") {
            Ok(v) => v.parse()?,
            Err(_) => TagFailurePolicy::default(),
        };

        Ok(Self {
            duplicate_marker: std::env::var("NOTESYNC_DUPLICATE_MARKER")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DUPLICATE_MARKER.to_string()),
            page_size: std::env::var("NOTESYNC_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(PAGE_SIZE),
            event_capacity: std::env::var("NOTESYNC_EVENT_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(EVENT_CAPACITY),
            tag_failure_policy,
            resource_base_url: std::env::var("NOTESYNC_RESOURCE_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            store_path: std::env::var("NOTESYNC_STORE_PATH")
                .unwrap_or_else(|_| STORE_PATH.to_string()),
        })
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.duplicate_marker.is_empty() {
            return Err(Error::Config("duplicate marker must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page size must be positive".to_string()));
        }
        Ok(())
    }
}
