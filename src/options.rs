//! Configuration for extraction, fetching and whole runs.
//!
//! All structs have public fields and `Default` impls; override only what
//! you need with struct update syntax.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::parser::HTML_MIME_TYPES;

/// Name of the crawl db sub-directory inside every loop directory.
pub const CRAWLDB_SUBDIR_NAME: &str = "crawldb";

/// Default parse budget per document.
pub const DEFAULT_PARSE_BUDGET: Duration = Duration::from_secs(30);

/// Options for [`BoundedExtractor`](crate::BoundedExtractor).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use rs_webminer::ExtractorOptions;
///
/// let options = ExtractorOptions {
///     parse_budget: Duration::from_secs(5),
///     ..ExtractorOptions::default()
/// };
/// assert!(!options.resolve_links);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorOptions {
    /// Wall-clock budget for parsing one document.
    ///
    /// Default: 30 seconds
    pub parse_budget: Duration,

    /// Resolve outlink and page result targets against the document base URL.
    ///
    /// When disabled, targets are the raw `href` values.
    ///
    /// Default: `false`
    pub resolve_links: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            parse_budget: DEFAULT_PARSE_BUDGET,
            resolve_links: false,
        }
    }
}

/// How aggressively the fetch stage works through its queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetcherMode {
    /// Honor the crawl delay between requests to the same host (default).
    #[default]
    Efficient,
    /// Honor the crawl delay between every request.
    Complete,
    /// Ignore the crawl delay.
    Impolite,
}

/// Fetch policy handed to the fetch stage each iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Delay between requests (see [`FetcherMode`]).
    ///
    /// Default: 1 second
    pub crawl_delay: Duration,

    /// Maximum body size kept per document; longer bodies are truncated.
    ///
    /// Default: 128 KiB
    pub max_content_size: usize,

    /// Politeness mode.
    ///
    /// Default: [`FetcherMode::Efficient`]
    pub mode: FetcherMode,

    /// MIME types worth fetching. Empty means any; an undeclared type always passes.
    ///
    /// Default: the HTML types the built-in parser handles
    pub valid_mime_types: BTreeSet<String>,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Per-request network timeout.
    ///
    /// Default: 20 seconds
    pub request_timeout: Duration,
}

impl FetchPolicy {
    /// Whether documents of `mime` are acceptable.
    ///
    /// An undeclared (empty) type is always accepted; the parser sniffs it.
    #[must_use]
    pub fn accepts_mime(&self, mime: &str) -> bool {
        mime.is_empty() || self.valid_mime_types.is_empty() || self.valid_mime_types.contains(mime)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            crawl_delay: Duration::from_secs(1),
            max_content_size: 128 * 1024,
            mode: FetcherMode::default(),
            valid_mime_types: HTML_MIME_TYPES.iter().map(ToString::to_string).collect(),
            user_agent: concat!("rs-webminer/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(20),
        }
    }
}

/// Everything [`run_crawl`](crate::run_crawl) needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory holding the loop directories.
    pub working_dir: PathBuf,
    /// Seed URL list, one URL per line.
    pub seed_urls_file: PathBuf,
    /// Patterns of URLs eligible for fetching.
    pub crawl_filter_file: PathBuf,
    /// Patterns of URLs eligible for analysis.
    pub mine_filter_file: PathBuf,
    /// Number of loops to run.
    pub num_loops: usize,
    /// Fetch policy for every loop.
    pub fetch_policy: FetchPolicy,
    /// Extractor options for every worker.
    pub extractor: ExtractorOptions,
    /// Extraction worker threads per loop.
    ///
    /// Default: 4
    pub worker_threads: usize,
    /// Optional positive/negative phrase files enabling phrase-ratio scoring.
    pub phrase_files: Option<(PathBuf, PathBuf)>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("working"),
            seed_urls_file: PathBuf::from("seeds.txt"),
            crawl_filter_file: PathBuf::from("crawl-filter.txt"),
            mine_filter_file: PathBuf::from("mine-filter.txt"),
            num_loops: 1,
            fetch_policy: FetchPolicy::default(),
            extractor: ExtractorOptions::default(),
            worker_threads: 4,
            phrase_files: None,
        }
    }
}
