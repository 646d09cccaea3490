//! Structural HTML to Markdown conversion for native HTML notes.
//!
//! The document is parsed and converted by `htmd`, which keeps nesting of
//! lists and block quotes and renders tables. The Markdown it produces then
//! has its `index_files/` references rewritten to their export targets.

use htmd::HtmlToMarkdown;
use tracing::trace;

use super::resources::{rewrite_for_export, ResourceContext};
use crate::error::{Error, Result};

/// Elements dropped together with their content.
const SKIPPED_TAGS: [&str; 5] = ["head", "script", "style", "noscript", "template"];

fn converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build()
}

/// Convert a native HTML note body to Markdown.
pub fn html_to_markdown(html: &str, ctx: &ResourceContext<'_>) -> Result<String> {
    let markdown = converter()
        .convert(html)
        .map_err(|e| Error::Codec(format!("HTML conversion failed: {}", e)))?;
    trace!(
        subsystem = "codec",
        html_len = html.len(),
        markdown_len = markdown.len(),
        "Converted HTML note"
    );
    rewrite_for_export(markdown.trim(), ctx)
}
