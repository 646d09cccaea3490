//! Client configuration.

use notesync_core::defaults::{ACCOUNT_URL, REQUEST_TIMEOUT_SECS};

/// Configuration for [`crate::WizClient`].
#[derive(Debug, Clone)]
pub struct WizClientConfig {
    /// Account server base URL, used for login and logout.
    pub account_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Skip TLS verification (self-hosted servers with self-signed certs).
    pub skip_tls_verify: bool,
}

impl Default for WizClientConfig {
    fn default() -> Self {
        Self {
            account_url: ACCOUNT_URL.to_string(),
            timeout_seconds: REQUEST_TIMEOUT_SECS,
            skip_tls_verify: false,
        }
    }
}

impl WizClientConfig {
    /// Read `NOTESYNC_ACCOUNT_URL`, `NOTESYNC_TIMEOUT_SECS` and
    /// `NOTESYNC_SKIP_TLS_VERIFY`, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            account_url: std::env::var("NOTESYNC_ACCOUNT_URL")
                .unwrap_or_else(|_| ACCOUNT_URL.to_string()),
            timeout_seconds: std::env::var("NOTESYNC_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            skip_tls_verify: std::env::var("NOTESYNC_SKIP_TLS_VERIFY")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WizClientConfig::default();
        assert_eq!(config.account_url, "https://as.wiz.cn");
        assert_eq!(config.timeout_seconds, 60);
        assert!(!config.skip_tls_verify);
    }
}
