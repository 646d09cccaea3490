//! # notesync-client
//!
//! HTTP client for the knowledge server. [`WizClient`] implements
//! [`notesync_core::NoteApi`], [`notesync_core::AccountApi`] and
//! [`notesync_core::ImageUploader`] over the server's JSON envelope protocol.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::WizClient;
pub use config::WizClientConfig;
pub use error::WizErrorCode;
