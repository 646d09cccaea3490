//! Filesystem export sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::try_join_all;
use notesync_core::{unique_markdown_filenames, Error, ExportSink, MarkdownArtifact, Result};
use tracing::debug;

/// Writes exported Markdown into a directory.
///
/// Single exports go to one fixed file; batches write one `<title>.md` per
/// artifact, numbering titles that would share a file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    single_file: String,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            single_file: "export.md".to_string(),
        }
    }

    /// File name used by [`ExportSink::export_one`].
    pub fn with_single_file(mut self, name: impl Into<String>) -> Self {
        self.single_file = name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::Export(format!(
                "cannot create export directory {}: {}",
                self.dir.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl ExportSink for DirectorySink {
    async fn export_one(&self, content: String) -> Result<()> {
        self.ensure_dir().await?;
        let path = self.dir.join(&self.single_file);
        tokio::fs::write(&path, content).await?;
        debug!(subsystem = "export", path = %path.display(), "Wrote export file");
        Ok(())
    }

    async fn export_many(&self, artifacts: Vec<MarkdownArtifact>) -> Result<()> {
        self.ensure_dir().await?;
        let names = unique_markdown_filenames(artifacts.iter().map(|a| a.title.as_str()));
        let writes = artifacts.into_iter().zip(names).map(|(artifact, name)| {
            let path = self.dir.join(name);
            async move {
                tokio::fs::write(&path, artifact.content).await?;
                debug!(subsystem = "export", path = %path.display(), "Wrote export file");
                Ok::<_, Error>(())
            }
        });
        try_join_all(writes).await?;
        Ok(())
    }
}
