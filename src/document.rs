//! Fetched documents and their response headers.

use serde::{Deserialize, Serialize};

/// Well-known header names used by the extractor.
pub mod headers {
    /// `Content-Location`, used as the base for relative links.
    pub const CONTENT_LOCATION: &str = "content-location";
    /// `Content-Language`, passed to the parser as a hint.
    pub const CONTENT_LANGUAGE: &str = "content-language";
    /// Explicit charset header consulted before the content type.
    pub const CONTENT_ENCODING: &str = "content-encoding";
    /// `Content-Type`.
    pub const CONTENT_TYPE: &str = "content-type";
}

/// Ordered multi-map of response headers.
///
/// Names compare case-insensitively; insertion order is preserved so that
/// [`HeaderMap::first`] returns the first value received for a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value for `name`, keeping earlier values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value recorded for `name`, if any.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A document produced by the fetch stage. The extractor reads it, never mutates it.
#[derive(Debug, Clone, Default)]
pub struct FetchedDocument {
    /// URL as requested, before redirects.
    pub base_url: String,
    /// URL the content was actually served from.
    pub fetched_url: String,
    /// Raw response body.
    pub content: Vec<u8>,
    /// Declared `Content-Type`, possibly with parameters.
    pub content_type: String,
    /// Response headers.
    pub headers: HeaderMap,
}

impl FetchedDocument {
    /// Builds a document whose base and fetched URLs coincide.
    #[must_use]
    pub fn new(url: impl Into<String>, content_type: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let url = url.into();
        Self {
            base_url: url.clone(),
            fetched_url: url,
            content: content.into(),
            content_type: content_type.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// MIME type of the declared content type, lowercased and without parameters.
    #[must_use]
    pub fn mime_type(&self) -> String {
        mime_essence(&self.content_type)
    }
}

/// Lowercased `type/subtype` part of a content-type value.
#[must_use]
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_returns_earliest_value_case_insensitively() {
        let mut map = HeaderMap::new();
        map.append("Content-Location", "/a");
        map.append("content-location", "/b");
        assert_eq!(map.first("CONTENT-LOCATION"), Some("/a"));
        assert_eq!(map.first("missing"), None);
    }

    #[test]
    fn mime_type_strips_parameters() {
        let doc = FetchedDocument::new("https://a.example", "Text/HTML; charset=UTF-8", "");
        assert_eq!(doc.mime_type(), "text/html");
        assert_eq!(mime_essence(""), "");
    }
}
