//! Per-worker scratch state.
//!
//! `ExtractionScratch` holds the accumulators the extractor fills for each
//! document. One instance lives inside each extractor and is reused for every
//! document that worker handles, so it must be reset before each document and
//! drained completely when a result is produced.

use url::Url;

use crate::document::HeaderMap;
use crate::parser::ParsedDocument;
use crate::result::{ExtractionResult, Outlink, PageResult};
use crate::url_utils::create_absolute_url;

/// Reusable accumulators for one extractor.
#[derive(Debug, Default)]
pub struct ExtractionScratch {
    content: String,
    outlinks: Vec<Outlink>,
    page_results: Vec<PageResult>,
}

impl ExtractionScratch {
    /// Creates empty scratch state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every accumulator, keeping allocations.
    pub fn reset(&mut self) {
        self.content.clear();
        self.outlinks.clear();
        self.page_results.clear();
    }

    /// Whether every accumulator is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.outlinks.is_empty() && self.page_results.is_empty()
    }

    /// Fills the accumulators from one parsed document.
    ///
    /// Outlinks and page results are derived independently, one of each per
    /// anchor. When `resolve_against` is set, link targets are made absolute.
    pub fn fill(&mut self, source_url: &str, parsed: &ParsedDocument, resolve_against: Option<&Url>) {
        self.content.push_str(&parsed.content);

        let target = |href: &str| match resolve_against {
            Some(base) => create_absolute_url(href, base),
            None => href.to_string(),
        };

        self.outlinks.extend(
            parsed
                .anchors
                .iter()
                .map(|a| Outlink::new(target(&a.href), a.name.clone(), a.rel.clone())),
        );

        self.page_results.extend(
            parsed
                .anchors
                .iter()
                .map(|a| PageResult::new(source_url, target(&a.href), a.text.clone())),
        );
    }

    /// Drains the accumulators into a fully populated result.
    ///
    /// Leaves the scratch empty, so nothing carries over to the next document.
    pub fn take_result(&mut self, url: &str, page_score: f32, metadata: HeaderMap) -> ExtractionResult {
        self.content.clear();
        ExtractionResult {
            url: url.to_string(),
            base_url: String::new(),
            page_score,
            outlinks: std::mem::take(&mut self.outlinks),
            page_results: std::mem::take(&mut self.page_results),
            metadata,
        }
    }
}
