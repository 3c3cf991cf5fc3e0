//! Error types for rs-webminer.
//!
//! Two families live here: [`Error`] covers run-level faults (configuration,
//! storage, iteration) that abort a crawl, while [`ExtractFault`] covers
//! per-document faults that the extractor contains and the caller drops.

use std::path::PathBuf;
use std::time::Duration;

/// Run-level error. Every variant is fatal to the crawl that raised it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A filter pattern failed to compile.
    #[error("invalid URL filter pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Underlying compile error.
        #[source]
        source: regex::Error,
    },

    /// A configuration or input file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The seed list produced no usable URL.
    #[error("seed file {} contains no valid URLs", .0.display())]
    InvalidSeed(PathBuf),

    /// Filesystem operation on the working directory failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A persisted record could not be encoded or decoded.
    #[error("serialization error in {}: {source}", path.display())]
    Serialization {
        /// File holding the record.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// No loop directory exists where one is required.
    #[error("no previous cycle output dirs exist in {}", .0.display())]
    MissingLoopDir(PathBuf),

    /// An iteration finished without producing its crawl db.
    #[error("iteration {index} did not produce a crawl db at {}", path.display())]
    MissingCrawlDb {
        /// Iteration index.
        index: usize,
        /// Expected crawl db location.
        path: PathBuf,
    },

    /// The fetch client could not be built.
    #[error("failed to set up fetcher: {0}")]
    Fetcher(#[from] crate::fetch::FetchError),

    /// The dataflow stage reported a failure for an iteration.
    #[error("iteration {index} failed: {message}")]
    Iteration {
        /// Iteration index.
        index: usize,
        /// Human-readable failure description.
        message: String,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Serialization {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for run-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Per-document extraction fault.
///
/// These never escape the hosting worker as panics; the document is dropped
/// from the pass output and the fault is logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractFault {
    /// The parse did not finish within the deadline.
    #[error("parsing {url} exceeded the {budget:?} budget")]
    Timeout {
        /// Document URL.
        url: String,
        /// Deadline that was exceeded.
        budget: Duration,
    },

    /// The URL, the parser or the handlers failed.
    #[error("error parsing {url}: {message}")]
    ParseError {
        /// Document URL.
        url: String,
        /// Original failure message.
        message: String,
    },
}

impl ExtractFault {
    /// URL of the document that faulted.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. } | Self::ParseError { url, .. } => url,
        }
    }

    /// Whether this fault is a deadline expiry.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
