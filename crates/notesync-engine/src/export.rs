//! Markdown export.
//!
//! Batches are all-or-nothing: every note is fetched and decoded before the
//! sink sees anything, and the first failure aborts the batch.

use notesync_core::defaults::PAGE_START;
use notesync_core::{
    export_markdown, to_artifact, CategoryNotesQuery, LoadingScope, MarkdownArtifact, Note,
    Result, SyncEvent,
};
use tracing::{info, instrument, trace};

use crate::NoteSync;

impl NoteSync {
    /// Decode one note to Markdown and hand it to the sink.
    #[instrument(skip(self), fields(subsystem = "export", op = "export_note"))]
    pub async fn export_note(&self, kb_guid: &str, doc_guid: &str) -> Result<()> {
        let note = self.fetcher.fetch_note_content(kb_guid, doc_guid).await?;
        let content = export_markdown(&note, self.config.resource_base_url.as_deref())?;
        self.sink.export_one(content).await?;
        info!(doc_guid = %doc_guid, "Note exported");
        self.emit(SyncEvent::NotesExported { count: 1 });
        Ok(())
    }

    /// Export several notes in one sink request. Returns how many were
    /// exported.
    #[instrument(skip(self, doc_guids), fields(subsystem = "export", op = "export_notes", note_count = doc_guids.len()))]
    pub async fn export_notes(&self, kb_guid: &str, doc_guids: &[String]) -> Result<usize> {
        self.emit(SyncEvent::Loading {
            scope: LoadingScope::Export,
            active: true,
        });
        let result = self.collect_artifacts(kb_guid, doc_guids).await;
        self.emit(SyncEvent::Loading {
            scope: LoadingScope::Export,
            active: false,
        });

        let artifacts = result?;
        let count = artifacts.len();
        self.sink.export_many(artifacts).await?;
        info!(note_count = count, "Notes exported");
        self.emit(SyncEvent::NotesExported { count });
        Ok(count)
    }

    /// Export every note listed under `category`.
    pub async fn export_category(&self, category: &str) -> Result<usize> {
        let kb = self.require_kb()?;
        let query = CategoryNotesQuery {
            category: category.to_string(),
            start: PAGE_START,
            count: self.config.page_size,
            with_abstract: false,
        };
        let docs: Vec<String> = self
            .api
            .get_category_notes(&kb, &query)
            .await?
            .into_iter()
            .map(|info| info.doc_guid)
            .collect();
        self.export_notes(&kb, &docs).await
    }

    async fn collect_artifacts(
        &self,
        kb_guid: &str,
        doc_guids: &[String],
    ) -> Result<Vec<MarkdownArtifact>> {
        let mut notes: Vec<Note> = Vec::with_capacity(doc_guids.len());
        for doc in doc_guids {
            trace!(doc_guid = %doc, "Fetching note for export");
            notes.push(self.fetcher.fetch_note_content(kb_guid, doc).await?);
        }
        let base_url = self.config.resource_base_url.as_deref();
        notes
            .iter()
            .map(|note| to_artifact(note, base_url))
            .collect()
    }
}
