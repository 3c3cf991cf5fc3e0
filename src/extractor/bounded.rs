//! Deadline-bounded, fault-isolated document extraction.

use std::sync::Arc;

use crate::document::{headers, FetchedDocument};
use crate::encoding::declared_charset;
use crate::error::ExtractFault;
use crate::filter::AdmissionFilter;
use crate::options::ExtractorOptions;
use crate::parser::{DocumentParser, HtmlParser, ParseHints, ParsedDocument};
use crate::result::ExtractionResult;
use crate::scoring::{ConstantScorer, PageScorer};
use crate::task::{run_with_deadline, TaskError};
use crate::url_utils::resolve_base_url;

use super::state::ExtractionScratch;

/// Extracts scored links from fetched documents within a wall-clock budget.
///
/// Each worker owns one extractor and reuses it for every document it
/// handles; the extractor is not meant to be shared between threads. The
/// parse itself runs on a fresh thread per call so the deadline can be
/// enforced; a parse that overruns is abandoned (it may keep running in the
/// background) and its output is never observed.
pub struct BoundedExtractor {
    mine_filter: Arc<AdmissionFilter>,
    parser: Arc<dyn DocumentParser>,
    scorer: Arc<dyn PageScorer>,
    options: ExtractorOptions,
    scratch: ExtractionScratch,
    attempts: u64,
}

impl BoundedExtractor {
    /// Creates an extractor with the HTML parser, constant scoring and default options.
    #[must_use]
    pub fn new(mine_filter: Arc<AdmissionFilter>) -> Self {
        Self {
            mine_filter,
            parser: Arc::new(HtmlParser),
            scorer: Arc::new(ConstantScorer::default()),
            options: ExtractorOptions::default(),
            scratch: ExtractionScratch::new(),
            attempts: 0,
        }
    }

    /// Replaces the document parser.
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replaces the page scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn PageScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: ExtractorOptions) -> Self {
        self.options = options;
        self
    }

    /// Clears all per-document scratch state.
    ///
    /// Called at the start of every [`Self::extract`] that passes the mine filter.
    pub fn reset(&mut self) {
        self.scratch.reset();
    }

    /// Extracts one document.
    ///
    /// Returns `Ok(None)` when the mine filter rejects the fetched URL; the
    /// parser is not invoked in that case. Faults are logged and returned as
    /// values; nothing unwinds out of this call.
    pub fn extract(&mut self, doc: &FetchedDocument) -> Result<Option<ExtractionResult>, ExtractFault> {
        if !self.mine_filter.is_admitted(&doc.fetched_url) {
            tracing::trace!(url = %doc.fetched_url, "rejected by mine filter");
            return Ok(None);
        }

        self.reset();

        match self.extract_admitted(doc) {
            Ok(result) => Ok(Some(result)),
            Err(fault) => {
                self.reset();
                tracing::warn!(url = %fault.url(), error = %fault, "dropping document");
                Err(fault)
            }
        }
    }

    fn extract_admitted(&mut self, doc: &FetchedDocument) -> Result<ExtractionResult, ExtractFault> {
        tracing::trace!(url = %doc.base_url, "parsing");

        let base_url = resolve_base_url(&doc.fetched_url, doc.headers.first(headers::CONTENT_LOCATION))
            .map_err(|e| ExtractFault::ParseError {
                url: doc.base_url.clone(),
                message: format!("malformed URL: {e}"),
            })?;

        let hints = ParseHints {
            resource_name: doc.base_url.clone(),
            content_type: doc.content_type.clone(),
            charset: declared_charset(doc).map(ToString::to_string),
            language: doc.headers.first(headers::CONTENT_LANGUAGE).map(ToString::to_string),
            content_location: base_url.to_string(),
        };

        // The worker owns copies of everything it touches; none of it is
        // reachable from this extractor once the deadline passes.
        let parser = Arc::clone(&self.parser);
        let scorer = Arc::clone(&self.scorer);
        let content = doc.content.clone();

        self.attempts += 1;
        let name = format!("webminer-parse-{}", self.attempts);
        let budget = self.options.parse_budget;

        let outcome = run_with_deadline(&name, budget, move || {
            parser.parse(&content, &hints).map(|parsed| {
                let score = scorer.score(&parsed.content);
                (parsed, score)
            })
        });

        let (parsed, score): (ParsedDocument, f32) = match outcome {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => {
                return Err(ExtractFault::ParseError {
                    url: doc.base_url.clone(),
                    message: e.to_string(),
                })
            }
            Err(TaskError::Timeout(budget)) => {
                return Err(ExtractFault::Timeout {
                    url: doc.base_url.clone(),
                    budget,
                })
            }
            Err(e) => {
                return Err(ExtractFault::ParseError {
                    url: doc.base_url.clone(),
                    message: e.to_string(),
                })
            }
        };

        let resolve_against = self.options.resolve_links.then_some(&base_url);
        self.scratch.fill(&doc.base_url, &parsed, resolve_against);

        tracing::debug!(
            url = %doc.base_url,
            outlinks = parsed.anchors.len(),
            score,
            "extracted document"
        );

        let mut result = self.scratch.take_result(&doc.base_url, score, doc.headers.clone());
        result.base_url = base_url.to_string();
        Ok(result)
    }
}

/// Builds identically configured extractors, one per worker.
#[derive(Clone)]
pub struct ExtractorFactory {
    mine_filter: Arc<AdmissionFilter>,
    parser: Arc<dyn DocumentParser>,
    scorer: Arc<dyn PageScorer>,
    options: ExtractorOptions,
}

impl ExtractorFactory {
    /// Factory for extractors with the HTML parser and constant scoring.
    #[must_use]
    pub fn new(mine_filter: Arc<AdmissionFilter>) -> Self {
        Self {
            mine_filter,
            parser: Arc::new(HtmlParser),
            scorer: Arc::new(ConstantScorer::default()),
            options: ExtractorOptions::default(),
        }
    }

    /// Replaces the document parser.
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replaces the page scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn PageScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: ExtractorOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds a fresh extractor with its own scratch state.
    #[must_use]
    pub fn build(&self) -> BoundedExtractor {
        BoundedExtractor::new(Arc::clone(&self.mine_filter))
            .with_parser(Arc::clone(&self.parser))
            .with_scorer(Arc::clone(&self.scorer))
            .with_options(self.options.clone())
    }
}
