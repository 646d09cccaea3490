//! Centralized default constants for notesync.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! strings and numbers.

// =============================================================================
// NOTE CONVENTIONS
// =============================================================================

/// Title suffix marking a note whose body is embedded Markdown.
pub const MARKDOWN_SUFFIX: &str = ".md";

/// Category path whose notes are always stored as lite Markdown.
pub const LITE_CATEGORY: &str = "/Lite/";

/// Delimiter-stripped name of [`LITE_CATEGORY`].
pub const LITE_CATEGORY_NAME: &str = "Lite";

/// Separator between tag GUIDs in the encoded `tags` field.
pub const TAG_DELIMITER: char = '*';

/// Root of the category tree.
pub const ROOT_CATEGORY: &str = "/";

/// Relative directory the server uses for resource references inside note HTML.
pub const RESOURCE_DIR: &str = "index_files/";

/// Marker appended to a copied note's title when copied within its own category.
pub const DUPLICATE_MARKER: &str = "duplicate";

// =============================================================================
// KNOWLEDGE SERVER
// =============================================================================

/// Default account server.
pub const ACCOUNT_URL: &str = "https://as.wiz.cn";

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "X-Wiz-Token";

/// Envelope `returnCode` for success.
pub const RETURN_CODE_OK: i64 = 200;

/// Transport timeout for knowledge-server requests (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for note listings.
pub const PAGE_SIZE: u32 = 100;

/// Default page offset.
pub const PAGE_START: u32 = 0;

/// Sort order requested for tag listings.
pub const TAG_NOTES_ORDER_BY: &str = "modified";

// =============================================================================
// RUNTIME
// =============================================================================

/// Broadcast buffer for the UI event bus.
pub const EVENT_CAPACITY: usize = 256;

/// Default directory of the JSON file store.
pub const STORE_PATH: &str = "notesync-store";

// =============================================================================
// SETTINGS KEYS
// =============================================================================

/// Settings-store keys shared by the session layer.
pub mod settings {
    pub const USER_ID: &str = "userId";
    pub const PASSWORD: &str = "password";
    pub const URL: &str = "url";
    pub const AUTO_LOGIN: &str = "autoLogin";
    pub const CURRENT_CATEGORY: &str = "currentCategory";
    pub const TOKEN: &str = "token";
}
