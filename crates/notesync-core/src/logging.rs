//! Structured logging field names for notesync.
//!
//! Spans declare these fields as `tracing::field::Empty` and fill them in
//! through `Span::record` once the value is known, so the names live here
//! instead of being repeated as string literals.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Operation failed and nothing downstream will recover it |
//! | WARN  | Recoverable issue, fallback applied (cache read failure, refresh after tag change) |
//! | INFO  | Lifecycle events (login, logout), operation completions (save, export) |
//! | DEBUG | Decision points (cache hit/miss, save state, export path) |
//! | TRACE | Per-item iteration (batch export loop, per-resource rewrites) |

/// Derived cache key of a fetched note.
pub const CACHE_KEY: &str = "cache_key";

/// Whether the cache answered the read.
pub const CACHE_HIT: &str = "cache_hit";

/// Byte length of a downloaded note body.
pub const HTML_LEN: &str = "html_len";

/// Number of notes in a listing or batch.
pub const NOTE_COUNT: &str = "note_count";
