//! HTML-backed implementation of the document tree.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{DocumentTree, EmbeddedElement, EmbeddedKind, LinkElement};

/// A parsed HTML page exposed as a [`DocumentTree`].
///
/// Relative URLs in `href`/`src`/`data` attributes are resolved against the
/// page's base URL. Attributes that resolve to nothing usable are skipped
/// silently; scanning is best-effort over arbitrary untrusted markup.
pub struct HtmlPage {
    document: Html,
    base: Option<Url>,
    location: String,
}

impl HtmlPage {
    /// Parses an HTML document.
    ///
    /// `base_url` is the URL the document was loaded from; it anchors
    /// relative link resolution. An unparseable base disables relative
    /// resolution but absolute links still work.
    #[must_use]
    pub fn parse(html: &str, base_url: &str) -> Self {
        let base = Url::parse(base_url).ok();
        if base.is_none() && !base_url.is_empty() {
            debug!(base_url, "unparseable base URL, relative links will be skipped");
        }
        Self {
            document: Html::parse_document(html),
            base,
            location: base_url.to_string(),
        }
    }

    /// Resolves a raw attribute value to an absolute URL, or `None`.
    fn resolve(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(url) = Url::parse(raw) {
            return Some(url.into());
        }
        self.base
            .as_ref()
            .and_then(|base| base.join(raw).ok())
            .map(Url::into)
    }

    fn select_first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(selector).ok()?;
        self.document.select(&selector).next()
    }

    /// Builds the selector matching both `name=` and `property=` metadata
    /// tags, mirroring how citation tags appear in the wild.
    fn meta_selector(name: &str) -> Option<Selector> {
        Selector::parse(&format!(
            "meta[name=\"{name}\"], meta[property=\"{name}\"]"
        ))
        .ok()
    }
}

impl DocumentTree for HtmlPage {
    fn query_links(&self) -> Vec<LinkElement> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .filter_map(|el| {
                let href = el.value().attr("href")?;
                let url = self.resolve(href)?;
                let parent_text = el
                    .parent()
                    .and_then(ElementRef::wrap)
                    .map(|p| p.text().collect::<String>());
                Some(LinkElement {
                    url,
                    text: el.text().collect::<String>().trim().to_string(),
                    parent_text,
                    has_download_attr: el.value().attr("download").is_some(),
                })
            })
            .collect()
    }

    fn query_meta(&self, name: &str) -> Option<String> {
        let selector = Self::meta_selector(name)?;
        self.document
            .select(&selector)
            .find_map(|el| el.value().attr("content").map(str::to_string))
    }

    fn query_all_meta(&self, name: &str) -> Vec<String> {
        let Some(selector) = Self::meta_selector(name) else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .filter_map(|el| el.value().attr("content").map(str::to_string))
            .collect()
    }

    fn query_embedded(&self) -> Vec<EmbeddedElement> {
        let mut found = Vec::new();

        if let Ok(selector) = Selector::parse("iframe[src]") {
            for el in self.document.select(&selector) {
                let Some(url) = el.value().attr("src").and_then(|s| self.resolve(s)) else {
                    continue;
                };
                found.push(EmbeddedElement {
                    kind: EmbeddedKind::Frame,
                    url,
                    title: el.value().attr("title").map(str::to_string),
                });
            }
        }

        if let Ok(selector) = Selector::parse("object[data], embed[src]") {
            for el in self.document.select(&selector) {
                let raw = el.value().attr("data").or_else(|| el.value().attr("src"));
                let Some(url) = raw.and_then(|s| self.resolve(s)) else {
                    continue;
                };
                found.push(EmbeddedElement {
                    kind: EmbeddedKind::Object,
                    url,
                    title: el.value().attr("title").map(str::to_string),
                });
            }
        }

        found
    }

    fn query_text(&self, selector: &str) -> Option<String> {
        self.select_first(selector)
            .map(|el| el.text().collect::<String>().trim().to_string())
    }

    fn title(&self) -> String {
        self.select_first("title")
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    fn location(&self) -> String {
        self.location.clone()
    }

    fn language(&self) -> String {
        self.select_first("html")
            .and_then(|el| el.value().attr("lang"))
            .filter(|lang| !lang.is_empty())
            .unwrap_or("unknown")
            .to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<!DOCTYPE html>
        <html lang="en">
        <head>
            <title>Sample Page</title>
            <meta name="citation_title" content="A Study of Things">
            <meta name="citation_author" content="Doe, Jane">
            <meta name="citation_author" content="Smith, John">
        </head>
        <body>
            <p>Report: <a href="/files/report.pdf">Annual report</a> (2.5 MB)</p>
            <a href="https://example.org/data.csv" download>Dataset</a>
            <a href="relative/page.html">A page</a>
            <iframe src="/embed/viewer.pdf" title="Viewer"></iframe>
            <object data="slides.ppt"></object>
            <div class="abstract">This is the abstract text.</div>
        </body>
        </html>"#;

    fn page() -> HtmlPage {
        HtmlPage::parse(SAMPLE, "https://example.com/articles/1")
    }

    #[test]
    fn test_query_links_resolves_relative_hrefs() {
        let links = page().query_links();
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].url, "https://example.com/files/report.pdf");
        assert_eq!(links[0].text, "Annual report");
        assert_eq!(links[2].url, "https://example.com/articles/relative/page.html");
    }

    #[test]
    fn test_query_links_parent_text_includes_siblings() {
        let links = page().query_links();
        let parent = links[0].parent_text.as_deref().unwrap();
        assert!(parent.contains("2.5 MB"));
    }

    #[test]
    fn test_query_links_download_attribute() {
        let links = page().query_links();
        assert!(!links[0].has_download_attr);
        assert!(links[1].has_download_attr);
    }

    #[test]
    fn test_query_links_without_base_skips_relative() {
        let page = HtmlPage::parse(SAMPLE, "");
        let links = page.query_links();
        // Only the absolute link survives
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.org/data.csv");
    }

    #[test]
    fn test_query_meta_first_match() {
        assert_eq!(
            page().query_meta("citation_title").as_deref(),
            Some("A Study of Things")
        );
        assert_eq!(
            page().query_meta("citation_author").as_deref(),
            Some("Doe, Jane")
        );
        assert!(page().query_meta("citation_doi").is_none());
    }

    #[test]
    fn test_query_all_meta_preserves_order() {
        let authors = page().query_all_meta("citation_author");
        assert_eq!(authors, vec!["Doe, Jane", "Smith, John"]);
    }

    #[test]
    fn test_query_meta_property_attribute() {
        let page = HtmlPage::parse(
            r#"<meta property="og:title" content="Open Graph Title">"#,
            "https://example.com/",
        );
        assert_eq!(
            page.query_meta("og:title").as_deref(),
            Some("Open Graph Title")
        );
    }

    #[test]
    fn test_query_embedded_collects_frames_and_objects() {
        let embedded = page().query_embedded();
        assert_eq!(embedded.len(), 2);
        assert_eq!(embedded[0].kind, EmbeddedKind::Frame);
        assert_eq!(embedded[0].url, "https://example.com/embed/viewer.pdf");
        assert_eq!(embedded[0].title.as_deref(), Some("Viewer"));
        assert_eq!(embedded[1].kind, EmbeddedKind::Object);
        assert_eq!(embedded[1].url, "https://example.com/articles/slides.ppt");
        assert!(embedded[1].title.is_none());
    }

    #[test]
    fn test_query_text_matches_class_selector() {
        assert_eq!(
            page().query_text(".abstract").as_deref(),
            Some("This is the abstract text.")
        );
        assert!(page().query_text("#missing").is_none());
    }

    #[test]
    fn test_title_and_language() {
        assert_eq!(page().title(), "Sample Page");
        assert_eq!(page().language(), "en");
    }

    #[test]
    fn test_language_defaults_to_unknown() {
        let page = HtmlPage::parse("<html><body></body></html>", "https://example.com/");
        assert_eq!(page.language(), "unknown");
    }

    #[test]
    fn test_malformed_markup_does_not_panic() {
        let page = HtmlPage::parse("<a href=<<<>>>garbage<a href='/x.pdf'>x", "https://example.com/");
        // Best-effort: whatever the parser recovers is fine, no panic
        let _ = page.query_links();
    }
}
