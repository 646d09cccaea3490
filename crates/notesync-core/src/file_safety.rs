//! Filename handling for exported notes.

use std::collections::HashSet;

use crate::defaults::MARKDOWN_SUFFIX;

/// Maximum filename length in bytes on common filesystems.
const MAX_FILENAME_LEN: usize = 255;

/// Sanitize a note title for use as a filename.
///
/// Path separators and characters rejected by common filesystems are replaced
/// with `_`; leading dots are dropped so exports never become hidden files.
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim().trim_start_matches('.').trim();
    if sanitized.is_empty() {
        return "untitled".to_string();
    }

    truncate_at_char_boundary(sanitized, MAX_FILENAME_LEN).to_string()
}

/// Filename for an exported note: the sanitized title plus `.md`, keeping the
/// whole name within the filesystem limit.
pub fn markdown_filename(title: &str) -> String {
    let stem = sanitize_filename(title);
    let stem = truncate_at_char_boundary(&stem, MAX_FILENAME_LEN - MARKDOWN_SUFFIX.len());
    format!("{}{}", stem, MARKDOWN_SUFFIX)
}

/// Filenames for a batch of exported notes, one per title, in order.
///
/// Titles that map to the same file (compared case-insensitively) get
/// ` (2)`, ` (3)`, ... before the suffix, so no export overwrites another.
pub fn unique_markdown_filenames<'a, I>(titles: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken = HashSet::new();
    titles
        .into_iter()
        .map(|title| {
            let mut name = markdown_filename(title);
            let mut n = 2;
            while !taken.insert(name.to_lowercase()) {
                let marker = format!(" ({})", n);
                let stem = sanitize_filename(title);
                let stem = truncate_at_char_boundary(
                    &stem,
                    MAX_FILENAME_LEN - MARKDOWN_SUFFIX.len() - marker.len(),
                );
                name = format!("{}{}{}", stem, marker, MARKDOWN_SUFFIX);
                n += 1;
            }
            name
        })
        .collect()
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
