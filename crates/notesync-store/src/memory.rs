//! In-memory stores, used by tests and by sessions that should leave nothing
//! on disk.

use std::collections::HashMap;
use std::sync::RwLock;

use notesync_core::{CacheKey, Error, Note, NoteCache, Result, SettingsStore};
use serde_json::{Map, Value as JsonValue};

fn poisoned<T>(_: T) -> Error {
    Error::Store("memory store lock poisoned".to_string())
}

/// Note cache and settings held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    notes: RwLock<HashMap<CacheKey, Note>>,
    settings: RwLock<Map<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached note snapshots.
    pub fn note_count(&self) -> usize {
        self.notes.read().map(|n| n.len()).unwrap_or(0)
    }
}

impl NoteCache for MemoryStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Note>> {
        Ok(self.notes.read().map_err(poisoned)?.get(key).cloned())
    }

    fn put(&self, key: &CacheKey, note: &Note) -> Result<()> {
        self.notes
            .write()
            .map_err(poisoned)?
            .insert(key.clone(), note.clone());
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.notes.write().map_err(poisoned)?.remove(key).is_some())
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        Ok(self.settings.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set_many(&self, items: Map<String, JsonValue>) -> Result<()> {
        self.settings.write().map_err(poisoned)?.extend(items);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.settings.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}
