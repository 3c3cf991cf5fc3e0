//! Regex admission filters.
//!
//! A run builds two independent filters: the crawl filter decides which URLs
//! are fetched at all, the mine filter decides which fetched documents are
//! analyzed. Both are immutable after construction and are shared across
//! workers behind an `Arc`.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};

/// Ordered set of compiled URL patterns.
///
/// A URL is admitted iff at least one pattern matches somewhere in it. An
/// empty set admits nothing.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    patterns: Vec<Regex>,
}

impl AdmissionFilter {
    /// Compiles the given patterns in order.
    ///
    /// Fails on the first malformed pattern; nothing is deferred to match time.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|source| Error::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Loads and compiles a pattern file (see [`load_patterns`]).
    pub fn from_file(path: &Path) -> Result<Self> {
        let patterns = load_patterns(path)?;
        let filter = Self::new(&patterns)?;
        tracing::debug!(path = %path.display(), patterns = filter.len(), "loaded URL filter");
        Ok(filter)
    }

    /// Returns true iff `url` matches at least one pattern.
    #[must_use]
    pub fn is_admitted(&self, url: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(url))
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the set holds no patterns (and so admits nothing).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Reads a newline-delimited pattern file.
///
/// Blank lines and lines starting with `#` (after trimming) are skipped;
/// remaining lines are trimmed.
pub fn load_patterns(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_pattern_lines(&text))
}

pub(crate) fn parse_pattern_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}
