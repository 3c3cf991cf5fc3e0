//! # rs-webminer
//!
//! Iterative web mining: crawl a frontier of URLs loop after loop, extract the
//! outbound links and page results of every admitted page, and feed newly
//! discovered links into the next loop.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_webminer::{AdmissionFilter, BoundedExtractor, FetchedDocument};
//!
//! let mine_filter = Arc::new(AdmissionFilter::new([r"^https://a\.example/"])?);
//! let mut extractor = BoundedExtractor::new(mine_filter);
//!
//! let doc = FetchedDocument::new(
//!     "https://a.example/",
//!     "text/html",
//!     r#"<html><body><a href="/next">Next</a></body></html>"#,
//! );
//! let result = extractor.extract(&doc).unwrap().unwrap();
//! assert_eq!(result.outlinks[0].target_url, "/next");
//! # Ok::<(), rs_webminer::Error>(())
//! ```
//!
//! ## Pieces
//!
//! - **Admission filters**: regex gates deciding what is fetched and what is mined
//! - **Bounded extraction**: per-document parse under a wall-clock deadline,
//!   with faults contained to the document
//! - **Loop orchestration**: versioned loop directories chaining crawl state
//!
//! [`run_crawl`] wires all of it together over HTTP.

mod error;
mod options;
mod result;

/// Crawl database of URL entries.
pub mod crawldb;

/// Fetched documents and their response headers.
pub mod document;

/// DOM helpers over `dom_query`.
pub mod dom;

/// Character encoding detection and transcoding.
pub mod encoding;

/// Bounded per-document extraction.
pub mod extractor;

/// Fetch stage seam and HTTP fetcher.
pub mod fetch;

/// Regex admission filters.
pub mod filter;

/// Image page results.
pub mod images;

/// Versioned loop directories.
pub mod loopdir;

/// Loop orchestration.
pub mod orchestrator;

/// Document parser seam and the built-in HTML parser.
pub mod parser;

/// Page scoring.
pub mod scoring;

/// Deadline-bounded background work.
pub mod task;

/// URL utilities for validation, resolution, and normalization.
pub mod url_utils;

/// Per-iteration dataflow stage.
pub mod workflow;

use std::sync::Arc;

// Public API - re-exports
pub use crawldb::{CrawlDbEntry, CrawlState, UrlStatus};
pub use document::{FetchedDocument, HeaderMap};
pub use error::{Error, ExtractFault, Result};
pub use extractor::{BoundedExtractor, ExtractorFactory};
pub use filter::AdmissionFilter;
pub use options::{
    ExtractorOptions, FetchPolicy, FetcherMode, RunConfig, CRAWLDB_SUBDIR_NAME, DEFAULT_PARSE_BUDGET,
};
pub use orchestrator::LoopOrchestrator;
pub use result::{ExtractionResult, Outlink, PageResult};
pub use workflow::{DataflowStage, MiningWorkflow};

use fetch::HttpFetcher;
use scoring::{PhraseRatioScorer, PhraseShingler};

/// Runs a full crawl as described by `config` and returns the final crawl state.
///
/// Both filters are loaded before anything touches the working directory, so
/// a bad pattern file fails the run without deleting earlier loop output.
///
/// # Example
///
/// ```rust,no_run
/// use rs_webminer::{run_crawl, RunConfig};
///
/// let config = RunConfig {
///     working_dir: "work".into(),
///     num_loops: 3,
///     ..RunConfig::default()
/// };
/// let last = run_crawl(&config)?;
/// println!("{}", last.path().display());
/// # Ok::<(), rs_webminer::Error>(())
/// ```
#[allow(clippy::missing_errors_doc)]
pub fn run_crawl(config: &RunConfig) -> Result<CrawlState> {
    let crawl_filter = Arc::new(AdmissionFilter::from_file(&config.crawl_filter_file)?);
    let mine_filter = Arc::new(AdmissionFilter::from_file(&config.mine_filter_file)?);
    for (name, filter) in [("crawl", &crawl_filter), ("mine", &mine_filter)] {
        if filter.is_empty() {
            tracing::warn!(filter = name, "filter has no patterns and admits nothing");
        }
    }

    let mut extractors = ExtractorFactory::new(mine_filter).with_options(config.extractor.clone());
    if let Some((positive, negative)) = &config.phrase_files {
        let scorer = PhraseRatioScorer::from_files(PhraseShingler::default(), positive, negative)?;
        extractors = extractors.with_scorer(Arc::new(scorer));
    }

    let fetcher = Arc::new(HttpFetcher::new(&config.fetch_policy)?);
    let workflow = MiningWorkflow::new(fetcher, config.worker_threads);
    let orchestrator = LoopOrchestrator::new(&config.working_dir, workflow);

    let seed_state = orchestrator.setup_working_dir(&config.seed_urls_file)?;
    orchestrator.run(
        seed_state,
        config.num_loops,
        &config.fetch_policy,
        &crawl_filter,
        &extractors,
    )
}
