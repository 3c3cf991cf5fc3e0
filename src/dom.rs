//! DOM Operations Adapter
//!
//! Thin helpers over the `dom_query` crate used by the HTML parser. Missing
//! attributes and text map to empty strings, never to absence.

pub use dom_query::{Document, Selection};

/// Parse HTML string into document
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Get an attribute value, or the empty string when it is absent.
#[inline]
#[must_use]
pub fn attribute_or_empty(sel: &Selection, name: &str) -> String {
    get_attribute(sel, name).unwrap_or_default()
}

/// Text content of the node and its descendants, trimmed, with internal
/// whitespace runs collapsed to one space.
#[must_use]
pub fn text_trim(sel: &Selection) -> String {
    collapse_whitespace(&sel.text())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every element matching `selector`, in document order.
#[must_use]
pub fn select_all<'a>(doc: &'a Document, selector: &str) -> Vec<Selection<'a>> {
    doc.select(selector).iter().collect()
}

/// Removes script, style and template elements so they do not leak into text.
pub fn strip_non_content(doc: &Document) {
    doc.select("script, style, noscript, template").remove();
}

/// Visible body text with runs of whitespace collapsed.
///
/// Falls back to the whole document when there is no `<body>`.
#[must_use]
pub fn body_text(doc: &Document) -> String {
    let body = doc.select("body");
    let text = if body.exists() { body.text() } else { doc.select("html").text() };
    collapse_whitespace(&text)
}
