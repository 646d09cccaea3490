//! Cache-aside note content fetching.
//!
//! Every read probes the server for metadata first, then serves the body from
//! the local cache when a snapshot exists. Only a miss downloads the body,
//! and a miss writes exactly one cache entry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use notesync_core::logging::{CACHE_HIT, CACHE_KEY, HTML_LEN};
use notesync_core::{CacheKey, DownloadOptions, Note, NoteApi, NoteCache, Result};
use tracing::{debug, field, instrument, warn, Span};

/// Hit/miss counters of a [`ContentFetcher`].
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStatsSnapshot {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of reads served from cache; 0 before the first read.
    pub fn hit_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

impl CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Reads notes through the local cache.
pub struct ContentFetcher {
    api: Arc<dyn NoteApi>,
    cache: Arc<dyn NoteCache>,
    stats: CacheStats,
}

impl ContentFetcher {
    pub fn new(api: Arc<dyn NoteApi>, cache: Arc<dyn NoteCache>) -> Self {
        Self {
            api,
            cache,
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn cache(&self) -> &Arc<dyn NoteCache> {
        &self.cache
    }

    /// Fetch a note, serving the body from cache when a snapshot exists.
    ///
    /// API errors propagate unchanged. A failing cache read counts as a miss;
    /// a failing cache write is returned.
    #[instrument(
        skip(self),
        fields(
            subsystem = "fetcher",
            op = "fetch_note_content",
            cache_key = field::Empty,
            cache_hit = field::Empty,
            html_len = field::Empty
        )
    )]
    pub async fn fetch_note_content(&self, kb_guid: &str, doc_guid: &str) -> Result<Note> {
        let start = Instant::now();
        let probe = self
            .api
            .get_note_content(kb_guid, doc_guid, DownloadOptions::info_only())
            .await?;

        let key = probe_cache_key(self.cache.as_ref(), &probe, kb_guid, doc_guid);
        let span = Span::current();
        span.record(CACHE_KEY, field::display(&key));

        let cached = match self.cache.get(&key) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(cache_key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        };

        if let Some(note) = cached.filter(|n| !n.is_empty()) {
            self.stats.record_hit();
            span.record(CACHE_HIT, true);
            debug!(
                duration_ms = start.elapsed().as_millis() as u64,
                "Served note from cache"
            );
            return Ok(note);
        }

        self.stats.record_miss();
        span.record(CACHE_HIT, false);
        let note = self
            .api
            .get_note_content(kb_guid, doc_guid, DownloadOptions::full())
            .await?;
        self.cache.put(&key, &note)?;
        span.record(HTML_LEN, note.html.len());
        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched note body and cached it"
        );
        Ok(note)
    }

    /// Full download with no cache interaction.
    pub async fn fetch_uncached(&self, kb_guid: &str, doc_guid: &str) -> Result<Note> {
        self.api
            .get_note_content(kb_guid, doc_guid, DownloadOptions::full())
            .await
    }
}

/// Cache key from the probe's identity, falling back to the requested ids
/// when the server left them out.
fn probe_cache_key(cache: &dyn NoteCache, probe: &Note, kb_guid: &str, doc_guid: &str) -> CacheKey {
    let kb = Some(probe.info.kb_guid.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(kb_guid);
    let doc = Some(probe.info.doc_guid.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(doc_guid);
    cache.cache_key(kb, doc)
}
