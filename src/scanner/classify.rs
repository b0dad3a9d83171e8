//! Extension tables and classification predicates.
//!
//! Classification matches the lowercased URL against an ordered table of
//! extension groups; the first matching group wins. The table order is the
//! tie-break for URLs that match more than one group.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use url::Url;

/// Sentinel returned when no size hint is found near a link.
pub const SIZE_UNKNOWN: &str = "Unknown";

/// Regex pattern for size-hint tokens: a magnitude followed by a unit.
#[allow(clippy::expect_used)]
static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?\s*(?:KB|MB|GB|bytes?))").expect("size regex is valid") // Static pattern, safe to panic
});

/// Coarse file-type class assigned to a candidate link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeClass {
    /// PDF documents.
    Pdf,
    /// Word-processor documents.
    Document,
    /// Spreadsheets.
    Spreadsheet,
    /// Slide decks.
    Presentation,
    /// Compressed archives.
    Archive,
    /// Audio/video files.
    Media,
    /// Raster/vector images.
    Image,
    /// Plain data formats.
    Data,
    /// Bibliographic citation exports.
    Citation,
    /// Downloadable, but none of the known groups.
    File,
}

impl MimeClass {
    /// Returns the display label for this class.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Document => "Document",
            Self::Spreadsheet => "Spreadsheet",
            Self::Presentation => "Presentation",
            Self::Archive => "Archive",
            Self::Media => "Media",
            Self::Image => "Image",
            Self::Data => "Data",
            Self::Citation => "Citation",
            Self::File => "File",
        }
    }
}

impl fmt::Display for MimeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered classification table. First matching group wins.
const CLASS_TABLE: &[(MimeClass, &[&str])] = &[
    (MimeClass::Pdf, &[".pdf"]),
    (MimeClass::Document, &[".doc", ".docx"]),
    (MimeClass::Spreadsheet, &[".xls", ".xlsx"]),
    (MimeClass::Presentation, &[".ppt", ".pptx"]),
    (
        MimeClass::Archive,
        &[".zip", ".rar", ".tar", ".gz", ".7z", ".bz2"],
    ),
    (
        MimeClass::Media,
        &[".mp3", ".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm"],
    ),
    (
        MimeClass::Image,
        &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp"],
    ),
    (
        MimeClass::Data,
        &[".txt", ".csv", ".xml", ".json", ".dat", ".sql"],
    ),
    (
        MimeClass::Citation,
        &[".bib", ".ris", ".enw", ".nbib", ".ciw"],
    ),
];

/// Fixed media-extension set, independent of the academic predicate.
const MEDIA_EXTENSIONS: &[&str] = &[".mp3", ".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm"];

/// Extensions considered downloadable when found in embedded elements.
pub(crate) const EMBEDDED_EXTENSIONS: &[&str] =
    &[".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"];

/// Structured-metadata tags that mark a page as academic.
const ACADEMIC_TAG_INDICATORS: &[&str] = &[
    "citation_title",
    "citation_author",
    "citation_doi",
    "dc.title",
    "dc.creator",
    "dc.identifier.doi",
];

/// Scanner configuration: extension sets and academic match rules.
///
/// The defaults reproduce the stock extension and pattern tables; callers
/// may build their own for narrower scans. Classification is deterministic
/// for a fixed configuration.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Extensions that make a link a download candidate on their own.
    pub downloadable_extensions: Vec<String>,
    /// URL patterns (DOI resolvers, known repositories) marking academic links.
    pub academic_patterns: Vec<Regex>,
    /// Case-insensitive keywords in link text marking academic links.
    pub academic_keywords: Vec<String>,
    /// Domains treated as academic sites for page-level detection.
    pub academic_sites: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let downloadable = [
            ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".tar",
            ".gz", ".7z", ".bz2", ".mp3", ".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm", ".jpg",
            ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp", ".txt", ".csv", ".xml", ".json",
            ".dat", ".sql", ".epub", ".mobi", ".djvu", ".ps", ".eps",
            // citation exports
            ".bib", ".ris", ".enw", ".nbib", ".ciw",
        ];
        let patterns = [
            r"(?i)doi\.org",
            r"(?i)arxiv\.org",
            r"(?i)pubmed",
            r"(?i)researchgate",
            r"(?i)scholar\.google",
            r"(?i)jstor",
            r"(?i)wiley",
            r"(?i)springer",
            r"(?i)sciencedirect",
            r"(?i)ieee\.org",
            r"(?i)acm\.org",
        ];
        let keywords = [
            "download pdf",
            "full text",
            "supplementary",
            "dataset",
            "citation",
            "bibtex",
            "endnote",
            "ris",
            "references",
        ];
        let sites = [
            "arxiv.org",
            "pubmed.ncbi.nlm.nih.gov",
            "scholar.google.com",
            "researchgate.net",
            "ieee.org",
            "acm.org",
            "springer.com",
            "sciencedirect.com",
            "jstor.org",
            "wiley.com",
        ];

        Self {
            downloadable_extensions: downloadable.iter().map(ToString::to_string).collect(),
            academic_patterns: compile_patterns(&patterns),
            academic_keywords: keywords.iter().map(ToString::to_string).collect(),
            academic_sites: sites.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Compiles a list of pattern literals, dropping any that fail to compile.
fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

/// Classifies a URL into a [`MimeClass`].
///
/// Case-insensitive: the URL is lowercased before matching. URLs matching
/// no group classify as [`MimeClass::File`].
#[must_use]
pub fn classify(url: &str) -> MimeClass {
    let url = url.to_lowercase();
    for (class, extensions) in CLASS_TABLE {
        if extensions.iter().any(|ext| url.contains(ext)) {
            return *class;
        }
    }
    MimeClass::File
}

/// Returns true when a link should be offered as a download candidate.
///
/// A candidate matches a configured extension, carries an explicit
/// force-download marker, or looks academic. Any one condition suffices.
#[must_use]
pub fn is_download_candidate(
    url: &str,
    has_download_attr: bool,
    text: &str,
    config: &ScanConfig,
) -> bool {
    let lowered = url.to_lowercase();
    let has_extension = config
        .downloadable_extensions
        .iter()
        .any(|ext| lowered.contains(ext.as_str()));
    has_extension || has_download_attr || is_academic(url, text, config)
}

/// Returns true when a link looks academic.
///
/// Pure OR of a URL pattern match and a case-insensitive keyword match on
/// the visible text; either alone is sufficient.
#[must_use]
pub fn is_academic(url: &str, text: &str, config: &ScanConfig) -> bool {
    let pattern_match = config.academic_patterns.iter().any(|p| p.is_match(url));
    let lowered_text = text.to_lowercase();
    let keyword_match = config
        .academic_keywords
        .iter()
        .any(|kw| lowered_text.contains(kw.as_str()));
    pattern_match || keyword_match
}

/// Membership test against the fixed media-extension set.
#[must_use]
pub fn is_media(url: &str) -> bool {
    let url = url.to_lowercase();
    MEDIA_EXTENSIONS.iter().any(|ext| url.contains(ext))
}

/// Searches the element's own text, then its parent's text, for a
/// magnitude + unit token. Returns the first match in that order, or
/// [`SIZE_UNKNOWN`].
#[must_use]
pub fn estimate_size(text: &str, parent_text: Option<&str>) -> String {
    SIZE_PATTERN
        .find(text)
        .or_else(|| parent_text.and_then(|p| SIZE_PATTERN.find(p)))
        .map_or_else(|| SIZE_UNKNOWN.to_string(), |m| m.as_str().to_string())
}

/// Returns true when an embedded element's URL matches a downloadable
/// extension.
#[must_use]
pub fn is_embedded_candidate(url: &str) -> bool {
    let url = url.to_lowercase();
    EMBEDDED_EXTENSIONS.iter().any(|ext| url.contains(ext))
}

/// Detects whether a document is an academic page.
///
/// True when any structured citation/Dublin Core indicator tag is present,
/// or when the page's host is in the configured academic site list. Only
/// the host is matched, never the path or query.
#[must_use]
pub fn detect_academic_page(tree: &dyn crate::page::DocumentTree, config: &ScanConfig) -> bool {
    let has_indicator_tag = ACADEMIC_TAG_INDICATORS
        .iter()
        .any(|tag| tree.query_meta(tag).is_some());
    if has_indicator_tag {
        return true;
    }

    let host = Url::parse(&tree.location())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    config
        .academic_sites
        .iter()
        .any(|site| host.contains(site.as_str()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== classify Tests ====================

    #[test]
    fn test_classify_known_groups() {
        assert_eq!(classify("https://x.com/a.pdf"), MimeClass::Pdf);
        assert_eq!(classify("https://x.com/a.docx"), MimeClass::Document);
        assert_eq!(classify("https://x.com/a.xlsx"), MimeClass::Spreadsheet);
        assert_eq!(classify("https://x.com/a.pptx"), MimeClass::Presentation);
        assert_eq!(classify("https://x.com/a.tar.gz"), MimeClass::Archive);
        assert_eq!(classify("https://x.com/a.mp4"), MimeClass::Media);
        assert_eq!(classify("https://x.com/a.png"), MimeClass::Image);
        assert_eq!(classify("https://x.com/a.csv"), MimeClass::Data);
        assert_eq!(classify("https://x.com/a.bib"), MimeClass::Citation);
    }

    #[test]
    fn test_classify_unknown_is_file() {
        assert_eq!(classify("https://x.com/page.html"), MimeClass::File);
        assert_eq!(classify("https://x.com/"), MimeClass::File);
    }

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(classify("https://x.com/A.PDF"), classify("https://x.com/a.pdf"));
        assert_eq!(classify("https://x.com/A.PDF"), MimeClass::Pdf);
    }

    #[test]
    fn test_classify_first_group_wins() {
        // Matches both Pdf and Archive substrings: table order decides
        assert_eq!(classify("https://x.com/bundle.pdf.zip"), MimeClass::Pdf);
        // Archive comes before Data in the table
        assert_eq!(classify("https://x.com/data.csv.zip"), MimeClass::Archive);
    }

    #[test]
    fn test_classify_deterministic() {
        let url = "https://x.com/report.pdf?session=42";
        assert_eq!(classify(url), classify(url));
    }

    // ==================== is_academic Tests ====================

    #[test]
    fn test_is_academic_pattern_only() {
        let config = ScanConfig::default();
        assert!(is_academic("https://doi.org/10.1000/182", "", &config));
        assert!(is_academic("https://arxiv.org/abs/2301.00001", "", &config));
    }

    #[test]
    fn test_is_academic_keyword_only() {
        let config = ScanConfig::default();
        assert!(is_academic("https://example.com/x", "Full Text (PDF)", &config));
        assert!(is_academic("https://example.com/x", "Export BibTeX", &config));
    }

    #[test]
    fn test_is_academic_neither_is_false() {
        let config = ScanConfig::default();
        assert!(!is_academic("https://example.com/x", "click here", &config));
    }

    #[test]
    fn test_is_academic_keyword_case_insensitive() {
        let config = ScanConfig::default();
        assert!(is_academic("https://example.com/x", "SUPPLEMENTARY material", &config));
    }

    // ==================== is_media Tests ====================

    #[test]
    fn test_is_media_matches_media_extensions() {
        assert!(is_media("https://x.com/clip.mp4"));
        assert!(is_media("https://x.com/CLIP.WEBM"));
        assert!(!is_media("https://x.com/report.pdf"));
    }

    #[test]
    fn test_is_media_independent_of_academic() {
        // A media file on an academic domain is still media
        assert!(is_media("https://arxiv.org/talk.mp3"));
    }

    // ==================== is_download_candidate Tests ====================

    #[test]
    fn test_candidate_by_extension() {
        let config = ScanConfig::default();
        assert!(is_download_candidate("https://x.com/a.pdf", false, "", &config));
    }

    #[test]
    fn test_candidate_by_download_attribute() {
        let config = ScanConfig::default();
        assert!(is_download_candidate("https://x.com/page", true, "", &config));
    }

    #[test]
    fn test_candidate_by_academic_match() {
        let config = ScanConfig::default();
        assert!(is_download_candidate(
            "https://doi.org/10.1/x",
            false,
            "",
            &config
        ));
    }

    #[test]
    fn test_not_a_candidate() {
        let config = ScanConfig::default();
        assert!(!is_download_candidate(
            "https://x.com/about",
            false,
            "About us",
            &config
        ));
    }

    // ==================== estimate_size Tests ====================

    #[test]
    fn test_estimate_size_from_own_text() {
        assert_eq!(estimate_size("Report (2.5 MB)", None), "2.5 MB");
    }

    #[test]
    fn test_estimate_size_own_text_wins_over_parent() {
        assert_eq!(
            estimate_size("Paper 300 KB", Some("archive 12 GB")),
            "300 KB"
        );
    }

    #[test]
    fn test_estimate_size_falls_back_to_parent() {
        assert_eq!(estimate_size("Download", Some("file.zip (12 GB)")), "12 GB");
    }

    #[test]
    fn test_estimate_size_bytes_unit() {
        assert_eq!(estimate_size("tiny file, 512 bytes", None), "512 bytes");
        assert_eq!(estimate_size("1 byte left", None), "1 byte");
    }

    #[test]
    fn test_estimate_size_unknown() {
        assert_eq!(estimate_size("Download", None), SIZE_UNKNOWN);
        assert_eq!(estimate_size("Download", Some("no sizes here")), SIZE_UNKNOWN);
    }

    // ==================== embedded / page detection Tests ====================

    #[test]
    fn test_is_embedded_candidate() {
        assert!(is_embedded_candidate("https://x.com/view.pdf"));
        assert!(is_embedded_candidate("https://x.com/deck.PPTX"));
        assert!(!is_embedded_candidate("https://x.com/player.html"));
    }

    #[test]
    fn test_detect_academic_page_by_tag() {
        use crate::page::HtmlPage;
        let page = HtmlPage::parse(
            r#"<meta name="citation_doi" content="10.1/x">"#,
            "https://example.com/",
        );
        assert!(detect_academic_page(&page, &ScanConfig::default()));
    }

    #[test]
    fn test_detect_academic_page_by_domain() {
        use crate::page::HtmlPage;
        let page = HtmlPage::parse("<html></html>", "https://arxiv.org/abs/2301.00001");
        assert!(detect_academic_page(&page, &ScanConfig::default()));
    }

    #[test]
    fn test_detect_academic_page_matches_host_not_path() {
        use crate::page::HtmlPage;
        // A site name appearing in the path must not count
        let page = HtmlPage::parse(
            "<html></html>",
            "https://example.com/blog/springer-roundup",
        );
        assert!(!detect_academic_page(&page, &ScanConfig::default()));

        let page = HtmlPage::parse(
            "<html></html>",
            "https://link.springer.com/article/10.1/x",
        );
        assert!(detect_academic_page(&page, &ScanConfig::default()));
    }

    #[test]
    fn test_detect_academic_page_negative() {
        use crate::page::HtmlPage;
        let page = HtmlPage::parse("<html></html>", "https://news.example.com/");
        assert!(!detect_academic_page(&page, &ScanConfig::default()));
    }
}
