//! Document parsing seam.
//!
//! The extractor hands raw bytes plus metadata hints to a [`DocumentParser`]
//! and receives the visible text and every anchor-like and image element in
//! document order. Parsers run on a dedicated thread, so implementations must
//! be `Send + Sync` and own everything they return.

use crate::dom;
use crate::encoding;

/// MIME types the built-in HTML parser handles.
pub const HTML_MIME_TYPES: &[&str] = &[
    "text/html",
    "application/xhtml+xml",
    "application/vnd.wap.xhtml+xml",
    "application/x-asp",
];

/// Metadata hints passed to the parser alongside the raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseHints {
    /// Resource name (the document's base URL).
    pub resource_name: String,
    /// Declared content type, parameters included.
    pub content_type: String,
    /// Declared charset, if one could be determined.
    pub charset: Option<String>,
    /// Declared content language.
    pub language: Option<String>,
    /// Base URL for resolving relative references.
    pub content_location: String,
}

/// An anchor-like element. Missing attributes are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    /// `href` attribute.
    pub href: String,
    /// `name` attribute.
    pub name: String,
    /// `rel` attribute.
    pub rel: String,
    /// Trimmed element text.
    pub text: String,
}

/// An `<img>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRef {
    /// `src` attribute.
    pub src: String,
    /// `alt` attribute.
    pub alt: String,
}

/// Parser output for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Visible text content.
    pub content: String,
    /// Anchor-like elements in document order.
    pub anchors: Vec<Anchor>,
    /// Image elements in document order.
    pub images: Vec<ImageRef>,
}

/// Parser-internal failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(pub String);

/// Converts raw document bytes into text and links.
///
/// Formats a parser does not understand should produce an empty
/// [`ParsedDocument`] rather than an error.
pub trait DocumentParser: Send + Sync {
    /// Parses `content` using `hints`.
    fn parse(&self, content: &[u8], hints: &ParseHints) -> Result<ParsedDocument, ParseError>;
}

/// Built-in HTML parser backed by `dom_query`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Whether this parser handles the declared content type.
    ///
    /// An empty content type is accepted when the body looks like markup.
    #[must_use]
    pub fn supports(content_type: &str, content: &[u8]) -> bool {
        let mime = crate::document::mime_essence(content_type);
        if mime.is_empty() {
            return content
                .iter()
                .find(|b| !b.is_ascii_whitespace())
                .is_some_and(|b| *b == b'<');
        }
        HTML_MIME_TYPES.contains(&mime.as_str())
    }
}

impl DocumentParser for HtmlParser {
    fn parse(&self, content: &[u8], hints: &ParseHints) -> Result<ParsedDocument, ParseError> {
        if !Self::supports(&hints.content_type, content) {
            tracing::trace!(
                resource = %hints.resource_name,
                content_type = %hints.content_type,
                "unsupported content type, no content extracted"
            );
            return Ok(ParsedDocument::default());
        }

        let html = encoding::decode(content, hints.charset.as_deref());
        let doc = dom::parse(&html);
        dom::strip_non_content(&doc);

        let anchors = dom::select_all(&doc, "a")
            .iter()
            .map(|a| Anchor {
                href: dom::attribute_or_empty(a, "href"),
                name: dom::attribute_or_empty(a, "name"),
                rel: dom::attribute_or_empty(a, "rel"),
                text: dom::text_trim(a),
            })
            .collect();

        let images = dom::select_all(&doc, "img")
            .iter()
            .map(|img| ImageRef {
                src: dom::attribute_or_empty(img, "src"),
                alt: dom::attribute_or_empty(img, "alt"),
            })
            .collect();

        Ok(ParsedDocument {
            content: dom::body_text(&doc),
            anchors,
            images,
        })
    }
}
