//! Embedding Markdown source into its HTML storage form and extracting it
//! back out.
//!
//! Two envelopes exist. Lite notes keep the whole source inside one `<pre>`;
//! other Markdown notes store one `<div>` per source line so the server's
//! HTML editor still renders them line by line. `extract_markdown` is the
//! exact inverse of `embed_markdown` for any input after newline
//! normalisation.

use once_cell::sync::Lazy;
use regex::Regex;

use super::body_inner;
use super::entities::{decode_entities, escape_html, strip_tags};
use super::resources::{rewrite_for_export, rewrite_for_storage, ResourceContext};
use crate::error::{Error, Result};
use crate::models::Resource;

static PRE_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<pre\b[^>]*>").unwrap());
static PRE_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</pre\s*>").unwrap());
static TAG_GAP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r">[ \t]*\r?\n\s*<").unwrap());
static EMPTY_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<div\b[^>]*>\s*<br\s*/?>\s*</div\s*>").unwrap());
static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static BLOCK_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</(?:div|p)\s*>").unwrap());

const DOC_HEAD: &str = r#"<!DOCTYPE html><html><head><meta charset="utf-8"></head><body>"#;
const DOC_TAIL: &str = "</body></html>";

/// How Markdown is wrapped for storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Use the single `<pre>` envelope of lite notes.
    pub wrap_with_pre: bool,
}

impl EmbedOptions {
    pub fn lite(lite: bool) -> Self {
        Self {
            wrap_with_pre: lite,
        }
    }
}

/// `\r\n` to `\n`, trailing newlines removed.
pub fn normalize_markdown(markdown: &str) -> String {
    markdown.replace("\r\n", "\n").trim_end_matches('\n').to_string()
}

/// Wrap Markdown source in its HTML storage envelope.
///
/// Absolute URLs of `resources` are rewritten to `index_files/<name>` first
/// so stored bodies never depend on a particular host.
pub fn embed_markdown(markdown: &str, resources: &[Resource], opts: EmbedOptions) -> String {
    let source = rewrite_for_storage(&normalize_markdown(markdown), resources);

    let mut html = String::with_capacity(DOC_HEAD.len() + source.len() * 2 + DOC_TAIL.len());
    html.push_str(DOC_HEAD);
    if opts.wrap_with_pre {
        html.push_str("<pre>");
        html.push_str(&escape_html(&source));
        html.push_str("</pre>");
    } else {
        for line in source.split('\n') {
            if line.is_empty() {
                html.push_str("<div><br/></div>");
            } else {
                html.push_str("<div>");
                html.push_str(&escape_html(line));
                html.push_str("</div>");
            }
        }
    }
    html.push_str(DOC_TAIL);
    html
}

/// Recover the Markdown source stored in `html`.
///
/// A body containing `<pre>` is read as the lite envelope; anything else as
/// line-per-block HTML. Resource references are rewritten to their export
/// targets.
pub fn extract_markdown(html: &str, ctx: &ResourceContext<'_>) -> Result<String> {
    let body = body_inner(html);

    let text = match PRE_OPEN_RE.find(body) {
        Some(open) => {
            let rest = &body[open.end()..];
            let close = PRE_CLOSE_RE
                .find_iter(rest)
                .last()
                .ok_or_else(|| Error::Codec("unterminated <pre> envelope".to_string()))?;
            decode_entities(&strip_tags(&rest[..close.start()]))
        }
        None => {
            let compact = TAG_GAP_RE.replace_all(body.trim(), "><");
            let lines = EMPTY_LINE_RE.replace_all(&compact, "\n");
            let lines = BR_RE.replace_all(&lines, "\n");
            let lines = BLOCK_END_RE.replace_all(&lines, "\n");
            decode_entities(&strip_tags(&lines))
        }
    };

    let markdown = normalize_markdown(&text);
    rewrite_for_export(&markdown, ctx)
}
