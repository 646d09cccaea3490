//! # notesync-core
//!
//! Core types, traits and codec for the notesync synchronization layer.
//!
//! This crate holds the note model, the collaborator traits the engine is
//! written against, the UI event bus and the HTML/Markdown codec. It performs
//! no I/O of its own.

pub mod category;
pub mod codec;
pub mod defaults;
pub mod error;
pub mod events;
pub mod file_safety;
pub mod logging;
pub mod models;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use codec::{
    embed_markdown, export_markdown, extract_markdown, html_to_markdown, to_artifact,
    EmbedOptions, ExportPath, ResourceContext,
};
pub use error::{Error, ErrorReport, Result};
pub use events::{EventBus, EventEnvelope, LoadingScope, SyncEvent};
pub use file_safety::{markdown_filename, sanitize_filename, unique_markdown_filenames};
pub use models::*;
pub use tags::{validate_tag_guid, TagList};
pub use traits::*;
