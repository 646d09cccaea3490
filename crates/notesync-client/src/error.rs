//! Knowledge-server error handling.

use notesync_core::Error;

/// Knowledge-server return codes the client distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizErrorCode {
    /// Session token missing, invalid or expired.
    TokenInvalid,
    /// Wrong user id or password.
    InvalidCredentials,
    /// Note, category or tag does not exist.
    NotFound,
    /// Request rejected as malformed.
    InvalidRequest,
    /// Anything else.
    Other,
}

impl WizErrorCode {
    /// Classify an envelope `returnCode`.
    pub fn from_return_code(code: i64) -> Self {
        match code {
            301 => Self::TokenInvalid,
            31001 | 31002 => Self::InvalidCredentials,
            404 | 31004 => Self::NotFound,
            400 => Self::InvalidRequest,
            _ => Self::Other,
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::TokenInvalid,
            404 => Self::NotFound,
            400 => Self::InvalidRequest,
            _ => Self::Other,
        }
    }

    /// True when re-authenticating may fix the failure.
    pub fn needs_login(&self) -> bool {
        matches!(self, Self::TokenInvalid)
    }
}

/// Convert an envelope error to a notesync [`Error`].
pub fn envelope_error(code: i64, message: &str, extern_code: Option<String>) -> Error {
    match WizErrorCode::from_return_code(code) {
        WizErrorCode::TokenInvalid => Error::Unauthorized(format!("token invalid: {}", message)),
        WizErrorCode::InvalidCredentials => {
            Error::Unauthorized(format!("login rejected: {}", message))
        }
        WizErrorCode::NotFound => Error::NotFound(message.to_string()),
        WizErrorCode::InvalidRequest | WizErrorCode::Other => Error::Api {
            code,
            message: message.to_string(),
            extern_code,
        },
    }
}

/// Convert a non-success HTTP response to a notesync [`Error`].
pub fn status_error(status: u16, message: &str) -> Error {
    match WizErrorCode::from_status(status) {
        WizErrorCode::TokenInvalid => Error::Unauthorized(message.to_string()),
        _ => Error::Http {
            status,
            message: message.to_string(),
        },
    }
}
