//! Category path rules.
//!
//! Categories are slash-delimited paths such as `/My Notes/Work/`. Notes under
//! the `/Lite/` category are stored as lite Markdown.

use crate::defaults::{LITE_CATEGORY, LITE_CATEGORY_NAME, MARKDOWN_SUFFIX, ROOT_CATEGORY};
use crate::models::NoteType;

/// Lite check used when building a body: the category with every `/`
/// removed equals `Lite`.
pub fn is_lite(category: &str) -> bool {
    category.replace('/', "") == LITE_CATEGORY_NAME
}

/// Lite check used for destination categories: exactly `/Lite/`.
pub fn is_lite_path(category: &str) -> bool {
    category == LITE_CATEGORY
}

/// Note type for a note landing in `category`; `/Lite/` overrides `requested`.
pub fn coerce_note_type(category: &str, requested: NoteType) -> NoteType {
    if is_lite_path(category) {
        NoteType::LiteMarkdown
    } else {
        requested
    }
}

/// Path of a new child category under `parent` (root when `parent` is empty).
pub fn child_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        format!("/{}/", child)
    } else {
        format!("{}{}/", parent, child)
    }
}

/// Parent used when creating a category under the current selection.
pub fn parent_or_root(current: &str) -> &str {
    if current.is_empty() {
        ROOT_CATEGORY
    } else {
        current
    }
}

/// Title for a copy placed in the same category as its source: the marker is
/// inserted before a trailing `.md` so the extension stays last.
pub fn duplicate_title(title: &str, marker: &str) -> String {
    match title.strip_suffix(MARKDOWN_SUFFIX) {
        Some(stem) => format!("{}-{}{}", stem, marker, MARKDOWN_SUFFIX),
        None => format!("{}-{}", title, marker),
    }
}
