//! JSON file-backed store.
//!
//! The store is a directory:
//!
//! ```text
//! <root>/settings.json           settings map
//! <root>/notes/<kb>/<doc>.json   one cached note snapshot per file
//! ```
//!
//! Every file is written through a temp file + rename, so a crash never
//! leaves a half-written entry. A cache write touches only its own note file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use notesync_core::{CacheKey, Error, Note, NoteCache, Result, SettingsStore};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

const SETTINGS_FILE: &str = "settings.json";
const NOTES_DIR: &str = "notes";
const NOTE_EXTENSION: &str = "json";

/// Note cache and settings persisted under one directory.
pub struct JsonFileStore {
    root: PathBuf,
    settings: RwLock<Map<String, JsonValue>>,
    /// Serializes note file writes so concurrent puts never share a temp file.
    note_writes: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store rooted at `root`, creating the directory when missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.is_file() {
            return Err(Error::Store(format!(
                "{}: store path is a file, expected a directory",
                root.display()
            )));
        }
        fs::create_dir_all(root.join(NOTES_DIR))?;

        let settings_path = root.join(SETTINGS_FILE);
        let settings = match fs::read(&settings_path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Map::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::Store(format!("{}: corrupt settings file: {}", settings_path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(
            subsystem = "store",
            root = %root.display(),
            setting_count = settings.len(),
            "Opened store directory"
        );
        Ok(Self {
            root,
            settings: RwLock::new(settings),
            note_writes: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of cached note snapshots on disk.
    pub fn note_count(&self) -> Result<usize> {
        let mut count = 0;
        for kb_dir in fs::read_dir(self.root.join(NOTES_DIR))? {
            let kb_dir = kb_dir?;
            if !kb_dir.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(kb_dir.path())? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == NOTE_EXTENSION) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// File holding the snapshot for `key`.
    fn note_path(&self, key: &CacheKey) -> Result<PathBuf> {
        let kb = path_component(&key.kb_guid)?;
        let doc = path_component(&key.doc_guid)?;
        Ok(self
            .root
            .join(NOTES_DIR)
            .join(kb)
            .join(format!("{}.{}", doc, NOTE_EXTENSION)))
    }

    fn settings_lock_error() -> Error {
        Error::Store("settings lock poisoned".to_string())
    }

    /// Apply `f` to a copy of the settings and persist it. The in-memory map
    /// only changes when the write succeeds.
    fn mutate_settings(&self, f: impl FnOnce(&mut Map<String, JsonValue>)) -> Result<()> {
        let mut settings = self
            .settings
            .write()
            .map_err(|_| Self::settings_lock_error())?;
        let mut next = settings.clone();
        f(&mut next);
        write_atomic(&self.root.join(SETTINGS_FILE), &serde_json::to_vec(&next)?)?;
        *settings = next;
        Ok(())
    }
}

/// A guid used as a single path component.
fn path_component(guid: &str) -> Result<&str> {
    let unsafe_component = guid.is_empty()
        || guid == "."
        || guid == ".."
        || guid.contains(['/', '\\', '\0']);
    if unsafe_component {
        return Err(Error::Store(format!("invalid guid for a store path: {:?}", guid)));
    }
    Ok(guid)
}

/// Atomic write: temp file + rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            warn!(subsystem = "store", parent = %parent.display(), error = %e, "create_dir_all failed");
            e
        })?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).map_err(|e| {
        warn!(subsystem = "store", temp_path = %temp_path.display(), error = %e, "File::create failed");
        e
    })?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| {
        warn!(subsystem = "store", from = %temp_path.display(), to = %path.display(), error = %e, "rename failed");
        e
    })?;
    Ok(())
}

impl NoteCache for JsonFileStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Note>> {
        let path = self.note_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                Error::Store(format!("{}: corrupt note snapshot: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &CacheKey, note: &Note) -> Result<()> {
        let path = self.note_path(key)?;
        let bytes = serde_json::to_vec(note)?;
        let _guard = self
            .note_writes
            .lock()
            .map_err(|_| Error::Store("note write lock poisoned".to_string()))?;
        write_atomic(&path, &bytes)?;
        debug!(subsystem = "store", cache_key = %key, bytes = bytes.len(), "Cached note snapshot");
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<bool> {
        let path = self.note_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        let settings = self
            .settings
            .read()
            .map_err(|_| Self::settings_lock_error())?;
        Ok(settings.get(key).cloned())
    }

    fn set_many(&self, items: Map<String, JsonValue>) -> Result<()> {
        self.mutate_settings(|settings| settings.extend(items))
    }

    fn remove(&self, key: &str) -> Result<()> {
        if SettingsStore::get(self, key)?.is_none() {
            return Ok(());
        }
        self.mutate_settings(|settings| {
            settings.remove(key);
        })
    }
}
