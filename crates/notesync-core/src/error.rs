//! Error types for notesync.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using notesync's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notesync operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The knowledge server answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The knowledge server answered 200 but the envelope carried an error code.
    #[error("API error {code}: {message}")]
    Api {
        code: i64,
        message: String,
        extern_code: Option<String>,
    },

    /// HTTP/network request failed before a response was received
    #[error("Request error: {0}")]
    Request(String),

    /// Authentication failed or the session token expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No session is established yet
    #[error("Not logged in")]
    NotLoggedIn,

    /// Operation needs an active note but none is open
    #[error("No active note")]
    NoActiveNote,

    /// A save was committed while still waiting on the rename confirmation
    #[error("Confirmation required before saving \"{title}\" as a Markdown note")]
    ConfirmationRequired { title: String },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local cache or settings store failed
    #[error("Store error: {0}")]
    Store(String),

    /// HTML/Markdown conversion failed
    #[error("Codec error: {0}")]
    Codec(String),

    /// Export sink rejected the artifacts
    #[error("Export error: {0}")]
    Export(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    /// True for failures raised by the transport rather than by the server.
    pub fn is_network_error(&self) -> bool {
        matches!(self, Error::Request(_) | Error::Http { .. })
    }

    /// Short machine-readable code for UI notification wiring.
    pub fn code(&self) -> String {
        match self {
            Error::Http { status, .. } => format!("http_{}", status),
            Error::Api { code, .. } => code.to_string(),
            Error::Request(_) => "request".to_string(),
            Error::Unauthorized(_) => "unauthorized".to_string(),
            Error::NotLoggedIn => "not_logged_in".to_string(),
            Error::NoActiveNote => "no_active_note".to_string(),
            Error::ConfirmationRequired { .. } => "confirmation_required".to_string(),
            Error::NotFound(_) => "not_found".to_string(),
            Error::InvalidInput(_) => "invalid_input".to_string(),
            Error::Serialization(_) => "serialization".to_string(),
            Error::Config(_) => "config".to_string(),
            Error::Store(_) => "store".to_string(),
            Error::Codec(_) => "codec".to_string(),
            Error::Export(_) => "export".to_string(),
            Error::Io(_) => "io".to_string(),
        }
    }

    /// Flatten into a serialisable report a caller can render.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
            extern_code: match self {
                Error::Api { extern_code, .. } => extern_code.clone(),
                _ => None,
            },
            is_network_error: self.is_network_error(),
            network_status: self.status(),
        }
    }
}

/// Serialisable view of an [`Error`] for notification surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extern_code: Option<String>,
    pub is_network_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_status: Option<u16>,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Error::Http {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => Error::Request(e.to_string()),
        }
    }
}
