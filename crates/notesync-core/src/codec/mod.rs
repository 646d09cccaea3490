//! HTML/Markdown codec used for storage and export.
//!
//! A note's export path depends only on its title: `.md` titles store
//! embedded Markdown that is extracted verbatim, everything else is native
//! HTML converted structurally.

pub mod embed;
pub mod entities;
pub mod html2md;
pub mod resources;

use once_cell::sync::Lazy;
use regex::Regex;

pub use embed::{embed_markdown, extract_markdown, normalize_markdown, EmbedOptions};
pub use entities::{decode_entities, escape_html};
pub use html2md::html_to_markdown;
pub use resources::{rewrite_for_export, rewrite_for_storage, ResourceContext};

use crate::error::Result;
use crate::models::{has_markdown_suffix, strip_markdown_suffix, MarkdownArtifact, Note};

static BODY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").unwrap());

/// Content of `<body>`, or the whole input for fragments.
pub(crate) fn body_inner(html: &str) -> &str {
    BODY_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map_or(html, |m| m.as_str())
}

/// Which decoding a note takes on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPath {
    /// Native HTML, converted structurally.
    ConvertHtml,
    /// Embedded Markdown, extracted verbatim.
    ExtractMarkdown,
}

impl ExportPath {
    /// Chosen from the title suffix alone; the note type is not consulted.
    pub fn for_title(title: &str) -> Self {
        if has_markdown_suffix(title) {
            Self::ExtractMarkdown
        } else {
            Self::ConvertHtml
        }
    }
}

/// Decode a note to Markdown along its export path.
pub fn export_markdown(note: &Note, base_url: Option<&str>) -> Result<String> {
    let ctx = ResourceContext::new(&note.info.kb_guid, &note.info.doc_guid, &note.resources)
        .with_base_url(base_url);
    match ExportPath::for_title(&note.info.title) {
        ExportPath::ExtractMarkdown => extract_markdown(&note.html, &ctx),
        ExportPath::ConvertHtml => html_to_markdown(&note.html, &ctx),
    }
}

/// Title used for the exported file. Only extracted notes lose their `.md`
/// suffix; a converted note keeps its title as-is.
pub fn export_title(note: &Note) -> String {
    match ExportPath::for_title(&note.info.title) {
        ExportPath::ExtractMarkdown => strip_markdown_suffix(&note.info.title).to_string(),
        ExportPath::ConvertHtml => note.info.title.clone(),
    }
}

/// Decode a note into an export artifact.
pub fn to_artifact(note: &Note, base_url: Option<&str>) -> Result<MarkdownArtifact> {
    Ok(MarkdownArtifact {
        title: export_title(note),
        content: export_markdown(note, base_url)?,
    })
}
