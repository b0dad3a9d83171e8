//! Document-tree capability consumed by the scanner and metadata extractor.
//!
//! The core never walks raw markup itself; it reads pages through the
//! [`DocumentTree`] trait, which exposes link elements, metadata tags, and
//! embedded resources in document order. [`HtmlPage`] is the bundled
//! implementation over parsed HTML.

mod html;

pub use html::HtmlPage;

/// An anchor element as seen by the scanner.
///
/// `url` is already resolved to an absolute URL; elements whose href could
/// not be resolved never reach the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkElement {
    /// Absolute URL the link points to.
    pub url: String,
    /// Visible text of the link, trimmed.
    pub text: String,
    /// Text of the enclosing element, used for size-hint estimation.
    pub parent_text: Option<String>,
    /// Whether the element carries an explicit force-download marker.
    pub has_download_attr: bool,
}

/// Kind of element an embedded resource was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedKind {
    /// An inline frame.
    Frame,
    /// An object or embed element.
    Object,
}

impl EmbeddedKind {
    /// Returns the display label for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frame => "iframe",
            Self::Object => "embedded",
        }
    }
}

/// A frame/object-style element with a resolved source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedElement {
    /// Which element kind carried the resource.
    pub kind: EmbeddedKind,
    /// Absolute source URL.
    pub url: String,
    /// Title attribute, when present.
    pub title: Option<String>,
}

/// Read-only view of a document tree.
///
/// All query methods return elements in document order and are total:
/// missing data yields empty strings or empty lists, never errors.
pub trait DocumentTree {
    /// Returns every anchor element with a resolvable href.
    fn query_links(&self) -> Vec<LinkElement>;

    /// Returns the content of the first `name`/`property` metadata tag
    /// matching `name`, or `None` if absent.
    fn query_meta(&self, name: &str) -> Option<String>;

    /// Returns the content of every metadata tag matching `name`,
    /// preserving document order, not deduplicated.
    fn query_all_meta(&self, name: &str) -> Vec<String>;

    /// Returns frame/object elements with a resolvable source URL.
    fn query_embedded(&self) -> Vec<EmbeddedElement>;

    /// Returns the trimmed text of the first element matching `selector`,
    /// or `None` if nothing matches.
    fn query_text(&self, selector: &str) -> Option<String>;

    /// Returns the document title, empty when absent.
    fn title(&self) -> String;

    /// Returns the document's own URL, empty when unknown.
    fn location(&self) -> String;

    /// Returns the document language, `"unknown"` when unset.
    fn language(&self) -> String;
}
