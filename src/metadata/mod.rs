//! Best-effort bibliographic metadata extraction.
//!
//! [`extract`] reads the fixed set of structured citation tags a publisher
//! page may carry and degrades to empty defaults when tags are absent; it
//! is total and never fails. [`generate_filename`] turns extracted metadata
//! into a preferred `Author_Year_Title.ext` filename when enough of it is
//! present.

mod filename;

pub use filename::{UniqueNames, generate_filename, sanitize_component};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::page::DocumentTree;

/// Minimum text length for an abstract-container candidate to qualify.
const MIN_ABSTRACT_LEN: usize = 100;

/// Candidate selectors probed for abstract text, in order.
const ABSTRACT_SELECTORS: &[&str] = &[
    ".abstract",
    "#abstract",
    "[id*=\"abstract\"]",
    "[class*=\"abstract\"]",
    ".summary",
    "#summary",
    "[id*=\"summary\"]",
    "[class*=\"summary\"]",
];

/// Bibliographic metadata for an academic page.
///
/// Every field defaults to an empty string or list; there are no partial
/// objects. Multi-valued fields preserve document order and are not
/// deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicMetadata {
    /// Article title, falling back to the document title.
    pub title: String,
    /// Authors in document order.
    pub authors: Vec<String>,
    /// Journal name.
    pub journal: String,
    /// Volume number.
    pub volume: String,
    /// Issue number.
    pub issue: String,
    /// Page range (`first-last`), empty when neither page tag is present.
    pub pages: String,
    /// Publication year or date.
    pub year: String,
    /// DOI.
    pub doi: String,
    /// PubMed identifier.
    pub pmid: String,
    /// arXiv identifier.
    pub arxiv_id: String,
    /// Direct PDF URL when advertised.
    pub pdf_url: String,
    /// Abstract text.
    pub abstract_text: String,
    /// Keywords in document order.
    pub keywords: Vec<String>,
}

/// General page-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Document title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// Host of the page URL, empty when unparseable.
    pub domain: String,
    /// Document language, `"unknown"` when unset.
    pub language: String,
    /// Description meta tag.
    pub description: String,
    /// Keywords meta tag.
    pub keywords: String,
    /// Author meta tag.
    pub author: String,
}

/// Extracts academic metadata from a document tree.
///
/// Total and non-throwing: each field is looked up in its structured
/// citation tag and defaults to empty when the tag is missing. The abstract
/// falls back to probing abstract/summary-style containers, accepting the
/// first whose text exceeds [`MIN_ABSTRACT_LEN`] characters.
#[instrument(skip_all)]
#[must_use]
pub fn extract(tree: &dyn DocumentTree) -> AcademicMetadata {
    let meta = |name: &str| tree.query_meta(name).unwrap_or_default();

    let title = tree
        .query_meta("citation_title")
        .unwrap_or_else(|| tree.title());
    let year = tree
        .query_meta("citation_publication_date")
        .or_else(|| tree.query_meta("citation_year"))
        .or_else(|| tree.query_meta("date"))
        .unwrap_or_default();
    let abstract_text = tree
        .query_meta("citation_abstract")
        .unwrap_or_else(|| extract_abstract_text(tree));

    AcademicMetadata {
        title,
        authors: tree.query_all_meta("citation_author"),
        journal: meta("citation_journal_title"),
        volume: meta("citation_volume"),
        issue: meta("citation_issue"),
        pages: compose_pages(
            &meta("citation_firstpage"),
            &meta("citation_lastpage"),
        ),
        year,
        doi: meta("citation_doi"),
        pmid: meta("citation_pmid"),
        arxiv_id: meta("citation_arxiv_id"),
        pdf_url: meta("citation_pdf_url"),
        abstract_text,
        keywords: tree.query_all_meta("citation_keywords"),
    }
}

/// Extracts general page metadata.
#[must_use]
pub fn extract_page_metadata(tree: &dyn DocumentTree) -> PageMetadata {
    let location = tree.location();
    let domain = Url::parse(&location)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();

    PageMetadata {
        title: tree.title(),
        url: location,
        domain,
        language: tree.language(),
        description: tree.query_meta("description").unwrap_or_default(),
        keywords: tree.query_meta("keywords").unwrap_or_default(),
        author: tree.query_meta("author").unwrap_or_default(),
    }
}

/// Joins first/last page tags into a range; empty when both are absent.
fn compose_pages(first: &str, last: &str) -> String {
    if first.is_empty() && last.is_empty() {
        String::new()
    } else {
        format!("{first}-{last}")
    }
}

/// Probes abstract-container selectors in order, accepting the first whose
/// text is long enough to plausibly be an abstract.
fn extract_abstract_text(tree: &dyn DocumentTree) -> String {
    for selector in ABSTRACT_SELECTORS {
        if let Some(text) = tree.query_text(selector) {
            if text.len() > MIN_ABSTRACT_LEN {
                debug!(selector, len = text.len(), "abstract found by selector probe");
                return text;
            }
        }
    }
    String::new()
}
