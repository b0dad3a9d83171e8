//! Preferred filename generation from extracted metadata.

use std::collections::HashMap;

use super::AcademicMetadata;

/// Maximum length of a sanitized filename segment.
const MAX_SEGMENT_LEN: usize = 50;

/// Extension used when the URL carries none.
const DEFAULT_EXTENSION: &str = "pdf";

/// Builds a preferred filename for an academic resource.
///
/// Returns `Some("Author_Year_Title.ext")` when the first author, the year,
/// and the title are all present; `None` otherwise, signalling "use default
/// naming". No side effects, never fails: absent data degrades to `None`.
#[must_use]
pub fn generate_filename(url: &str, metadata: &AcademicMetadata) -> Option<String> {
    let author = metadata.authors.first().map(String::as_str).unwrap_or("");
    if author.is_empty() || metadata.year.is_empty() || metadata.title.is_empty() {
        return None;
    }

    let extension = extension_from_url(url).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    Some(format!(
        "{}_{}_{}.{}",
        sanitize_component(author),
        metadata.year,
        sanitize_component(&metadata.title),
        extension
    ))
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_` and truncates
/// to 50 characters.
#[must_use]
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_SEGMENT_LEN)
        .collect()
}

/// Tracks filenames claimed within one batch and rewrites repeats so a
/// later file cannot overwrite an earlier one.
///
/// Candidates on the same page derive their names from the same page
/// metadata, so repeats are common. The first claim of a name keeps it;
/// subsequent claims get a counter suffix before the extension
/// (`A.pdf`, `A_2.pdf`, `A_3.pdf`).
#[derive(Debug, Default)]
pub struct UniqueNames {
    seen: HashMap<String, usize>,
}

impl UniqueNames {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `name`, rewriting it when it was already claimed.
    pub fn claim(&mut self, name: String) -> String {
        let n = self.seen.entry(name.clone()).or_insert(0);
        *n += 1;
        if *n == 1 {
            return name;
        }
        match name.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem}_{}.{ext}", *n),
            None => format!("{name}_{}", *n),
        }
    }
}

/// Extracts the extension from a URL: the segment after the last `.` in the
/// path, before any query or fragment. `None` when the path has no usable
/// extension.
fn extension_from_url(url: &str) -> Option<String> {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    let (_, ext) = path.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') {
        return None;
    }
    Some(ext.to_string())
}
