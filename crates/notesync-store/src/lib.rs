//! # notesync-store
//!
//! Local persistence for notesync: the note snapshot cache and the settings
//! key/value store. Both stores implement [`notesync_core::NoteCache`] and
//! [`notesync_core::SettingsStore`], so one instance can back both.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
