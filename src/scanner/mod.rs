//! Page scanning: discover and classify candidate downloadable resources.
//!
//! The scanner walks a document tree once, in traversal order, and produces
//! a [`ScanResult`] of classified links, embedded resources, and page-level
//! metadata. Scanning is pure with respect to its inputs: the same tree and
//! the same configuration always produce the same result.
//!
//! # Example
//!
//! ```
//! use harvester_core::page::HtmlPage;
//! use harvester_core::scanner::{scan, ScanConfig};
//!
//! let page = HtmlPage::parse(
//!     r#"<a href="/paper.pdf">Paper</a>"#,
//!     "https://example.com/",
//! );
//! let result = scan(&page, &ScanConfig::default());
//! assert_eq!(result.stats.downloadable, 1);
//! ```

mod classify;

pub use classify::{
    MimeClass, SIZE_UNKNOWN, ScanConfig, classify, detect_academic_page, estimate_size,
    is_academic, is_download_candidate, is_embedded_candidate, is_media,
};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::metadata::{self, AcademicMetadata, PageMetadata};
use crate::page::DocumentTree;

/// A classified candidate downloadable link.
///
/// Identity is `(url, source_index)`; links are produced fresh per scan and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLink {
    /// Absolute URL of the resource.
    pub url: String,
    /// Visible link text, `"Download"` when the element had none.
    pub display_text: String,
    /// Coarse file-type class.
    pub mime_class: MimeClass,
    /// Whether the link matched an academic pattern or keyword.
    pub is_academic: bool,
    /// Whether the link matched the media-extension set.
    pub is_media: bool,
    /// Size hint found near the link, or [`SIZE_UNKNOWN`].
    pub size_hint: String,
    /// Position of the element in document traversal order.
    pub source_index: usize,
}

/// An embedded frame/object resource. Structural record only; embedded
/// resources carry no classification fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedResource {
    /// Element kind label (`"iframe"` or `"embedded"`).
    pub kind: String,
    /// Absolute source URL.
    pub url: String,
    /// Element title, or a kind-specific placeholder.
    pub title: String,
}

/// Exact cardinalities of the scan result lists, recomputed each scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Total anchor elements seen, candidates or not.
    pub total_links: usize,
    /// Number of candidate links.
    pub downloadable: usize,
    /// Number of academic candidate links.
    pub academic: usize,
    /// Number of media candidate links.
    pub media: usize,
    /// Number of embedded resources.
    pub embedded: usize,
}

/// Everything one scan pass found on a page.
///
/// `academic_links` and `media_links` are filtered subsets of `links`.
/// The result and its nested lists are owned by the caller; the scanner
/// keeps no state between calls.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// All candidate links in traversal order.
    pub links: Vec<ResourceLink>,
    /// Candidates flagged academic.
    pub academic_links: Vec<ResourceLink>,
    /// Candidates flagged media.
    pub media_links: Vec<ResourceLink>,
    /// Embedded frame/object resources.
    pub embedded: Vec<EmbeddedResource>,
    /// Page-level metadata.
    pub page_metadata: PageMetadata,
    /// Best-effort academic metadata.
    pub academic_metadata: AcademicMetadata,
    /// Exact counts of the lists above.
    pub stats: ScanStats,
}

/// Scans a document tree for downloadable resources.
///
/// Walks every anchor once, keeps the ones that qualify as download
/// candidates, classifies them, and collects embedded resources plus page
/// and academic metadata. Link order follows document traversal order.
/// Malformed URLs never reach this function (the tree drops them), and
/// nothing here raises: scanning arbitrary untrusted markup is best-effort.
#[instrument(skip_all, fields(location = %tree.location()))]
#[must_use]
pub fn scan(tree: &dyn DocumentTree, config: &ScanConfig) -> ScanResult {
    let elements = tree.query_links();
    let total_links = elements.len();

    let mut links = Vec::new();
    for (source_index, element) in elements.into_iter().enumerate() {
        if !is_download_candidate(
            &element.url,
            element.has_download_attr,
            &element.text,
            config,
        ) {
            continue;
        }

        let size_hint = estimate_size(&element.text, element.parent_text.as_deref());
        let display_text = if element.text.is_empty() {
            "Download".to_string()
        } else {
            element.text.clone()
        };

        links.push(ResourceLink {
            mime_class: classify(&element.url),
            is_academic: is_academic(&element.url, &element.text, config),
            is_media: is_media(&element.url),
            url: element.url,
            display_text,
            size_hint,
            source_index,
        });
    }

    let academic_links: Vec<ResourceLink> = links
        .iter()
        .filter(|link| link.is_academic)
        .cloned()
        .collect();
    let media_links: Vec<ResourceLink> =
        links.iter().filter(|link| link.is_media).cloned().collect();

    let embedded = scan_embedded(tree);

    let stats = ScanStats {
        total_links,
        downloadable: links.len(),
        academic: academic_links.len(),
        media: media_links.len(),
        embedded: embedded.len(),
    };

    info!(
        total = stats.total_links,
        downloadable = stats.downloadable,
        academic = stats.academic,
        media = stats.media,
        embedded = stats.embedded,
        "scan complete"
    );

    ScanResult {
        links,
        academic_links,
        media_links,
        embedded,
        page_metadata: metadata::extract_page_metadata(tree),
        academic_metadata: metadata::extract(tree),
        stats,
    }
}

/// Collects frame/object elements whose source URL matches a downloadable
/// extension.
#[must_use]
pub fn scan_embedded(tree: &dyn DocumentTree) -> Vec<EmbeddedResource> {
    tree.query_embedded()
        .into_iter()
        .filter(|element| is_embedded_candidate(&element.url))
        .map(|element| {
            let placeholder = match element.kind {
                crate::page::EmbeddedKind::Frame => "Embedded content",
                crate::page::EmbeddedKind::Object => "Embedded object",
            };
            debug!(url = %element.url, kind = element.kind.as_str(), "embedded resource");
            EmbeddedResource {
                kind: element.kind.as_str().to_string(),
                url: element.url,
                title: element.title.unwrap_or_else(|| placeholder.to_string()),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::page::HtmlPage;

    const PAGE: &str = r#"<!DOCTYPE html>
        <html lang="en">
        <head><title>Downloads</title></head>
        <body>
            <p><a href="/docs/report.pdf">Annual report (1.2 MB)</a></p>
            <p><a href="/about.html">About us</a></p>
            <p><a href="https://doi.org/10.1000/182">Full text</a></p>
            <p><a href="/media/talk.mp4">Conference talk</a></p>
            <p><a href="/tool" download>Installer</a></p>
            <p><a href="/archive.zip"></a></p>
            <iframe src="/viewer.pdf"></iframe>
            <iframe src="/player.html"></iframe>
        </body>
        </html>"#;

    fn result() -> ScanResult {
        let page = HtmlPage::parse(PAGE, "https://example.com/");
        scan(&page, &ScanConfig::default())
    }

    #[test]
    fn test_scan_keeps_candidates_in_traversal_order() {
        let result = result();
        let urls: Vec<&str> = result.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/docs/report.pdf",
                "https://doi.org/10.1000/182",
                "https://example.com/media/talk.mp4",
                "https://example.com/tool",
                "https://example.com/archive.zip",
            ]
        );
    }

    #[test]
    fn test_scan_skips_non_candidates() {
        let result = result();
        assert!(result.links.iter().all(|l| !l.url.contains("about.html")));
    }

    #[test]
    fn test_scan_source_index_follows_document_order() {
        let result = result();
        let indexes: Vec<usize> = result.links.iter().map(|l| l.source_index).collect();
        assert_eq!(indexes, vec![0, 2, 3, 4, 5]);
    }

    #[test]
    fn test_scan_classification_fields() {
        let result = result();
        assert_eq!(result.links[0].mime_class, MimeClass::Pdf);
        assert!(!result.links[0].is_academic);
        assert!(result.links[1].is_academic);
        assert_eq!(result.links[2].mime_class, MimeClass::Media);
        assert!(result.links[2].is_media);
        assert_eq!(result.links[3].mime_class, MimeClass::File);
    }

    #[test]
    fn test_scan_size_hint() {
        let result = result();
        assert_eq!(result.links[0].size_hint, "1.2 MB");
        assert_eq!(result.links[1].size_hint, SIZE_UNKNOWN);
    }

    #[test]
    fn test_scan_empty_text_defaults_to_download() {
        let result = result();
        assert_eq!(result.links[4].display_text, "Download");
    }

    #[test]
    fn test_scan_subsets_are_filtered_from_links() {
        let result = result();
        for link in &result.academic_links {
            assert!(result.links.contains(link));
            assert!(link.is_academic);
        }
        for link in &result.media_links {
            assert!(result.links.contains(link));
            assert!(link.is_media);
        }
    }

    #[test]
    fn test_scan_stats_are_exact_cardinalities() {
        let result = result();
        assert_eq!(result.stats.total_links, 6);
        assert_eq!(result.stats.downloadable, result.links.len());
        assert_eq!(result.stats.academic, result.academic_links.len());
        assert_eq!(result.stats.media, result.media_links.len());
        assert_eq!(result.stats.embedded, result.embedded.len());
    }

    #[test]
    fn test_scan_embedded_filters_by_extension() {
        let result = result();
        assert_eq!(result.embedded.len(), 1);
        assert_eq!(result.embedded[0].url, "https://example.com/viewer.pdf");
        assert_eq!(result.embedded[0].kind, "iframe");
        assert_eq!(result.embedded[0].title, "Embedded content");
    }

    #[test]
    fn test_scan_is_deterministic() {
        let page = HtmlPage::parse(PAGE, "https://example.com/");
        let config = ScanConfig::default();
        let first = scan(&page, &config);
        let second = scan(&page, &config);
        assert_eq!(first.links, second.links);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_scan_empty_page() {
        let page = HtmlPage::parse("<html><body></body></html>", "https://example.com/");
        let result = scan(&page, &ScanConfig::default());
        assert!(result.links.is_empty());
        assert_eq!(result.stats, ScanStats::default());
    }
}
