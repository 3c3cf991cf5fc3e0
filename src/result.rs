//! Result types for extraction output.
//!
//! An [`ExtractionResult`] is produced once per admitted document that parsed
//! within its deadline. Absent data is represented as empty strings rather than
//! omitted entries, so every record downstream has the same shape.

use serde::{Deserialize, Serialize};

use crate::document::HeaderMap;

/// A raw hyperlink found in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outlink {
    /// Value of the `href` attribute.
    pub target_url: String,

    /// Value of the `name` attribute.
    pub name: String,

    /// Value of the `rel` attribute.
    pub rel: String,
}

impl Outlink {
    /// Creates an outlink.
    #[must_use]
    pub fn new(target_url: impl Into<String>, name: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            name: name.into(),
            rel: rel.into(),
        }
    }

    /// Whether the `rel` attribute carries `nofollow`.
    #[must_use]
    pub fn is_nofollow(&self) -> bool {
        self.rel
            .split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("nofollow"))
    }
}

/// A source-to-target relationship mined from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// URL of the document the link was found in.
    pub source_url: String,

    /// Link target.
    pub target_url: String,

    /// Trimmed text of the linking element (or image alt text).
    pub link_text: String,
}

impl PageResult {
    /// Creates a page result.
    #[must_use]
    pub fn new(
        source_url: impl Into<String>,
        target_url: impl Into<String>,
        link_text: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            target_url: target_url.into(),
            link_text: link_text.into(),
        }
    }
}

/// Structured output for one analyzed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Document URL.
    pub url: String,

    /// URL relative links resolve against: the Content-Location header
    /// resolved against the fetched URL, or the fetched URL itself.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_url: String,

    /// Score assigned by the configured page scorer.
    pub page_score: f32,

    /// One entry per anchor, in document order.
    pub outlinks: Vec<Outlink>,

    /// One entry per anchor, in document order.
    pub page_results: Vec<PageResult>,

    /// Headers copied from the source document.
    pub metadata: HeaderMap,
}
