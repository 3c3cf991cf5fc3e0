//! Crawl database: the durable URL state handed from one loop to the next.
//!
//! A crawl db is a directory holding `urls.jsonl`, one [`CrawlDbEntry`] per
//! line. Every loop writes a new crawl db into its own loop directory; earlier
//! ones are never modified in place.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::url_utils::normalize_url;

const ENTRIES_FILE_NAME: &str = "urls.jsonl";

/// Reference to a crawl db directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlState {
    path: PathBuf,
}

impl CrawlState {
    /// Wraps a crawl db directory path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Crawl db directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the crawl db has been written.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.entries_path().is_file()
    }

    fn entries_path(&self) -> PathBuf {
        self.path.join(ENTRIES_FILE_NAME)
    }

    /// Reads every entry in stored order.
    pub fn read(&self) -> Result<Vec<CrawlDbEntry>> {
        let path = self.entries_path();
        let file = File::open(&path).map_err(|e| Error::io(&path, e))?;

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| Error::io(&path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|e| Error::serialization(&path, e))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Replaces the stored entries, creating the directory if needed.
    pub fn write(&self, entries: &[CrawlDbEntry]) -> Result<()> {
        fs::create_dir_all(&self.path).map_err(|e| Error::io(&self.path, e))?;

        let path = self.entries_path();
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            serde_json::to_writer(&mut writer, entry).map_err(|e| Error::serialization(&path, e))?;
            writer.write_all(b"\n").map_err(|e| Error::io(&path, e))?;
        }
        writer.flush().map_err(|e| Error::io(&path, e))
    }
}

/// Crawl status of a URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStatus {
    /// Known but not yet fetched.
    #[default]
    Unfetched,
    /// Fetched successfully.
    Fetched,
    /// Fetched but not acceptable (e.g. MIME type outside the policy).
    Skipped,
    /// Fetch failed.
    Failed,
}

/// One URL and its crawl status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlDbEntry {
    /// Normalized URL.
    pub url: String,
    /// Current status.
    pub status: UrlStatus,
    /// When the URL was last fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fetched: Option<DateTime<Utc>>,
    /// Score of the last extraction, if the page was mined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_score: Option<f32>,
}

impl CrawlDbEntry {
    /// An unfetched entry.
    #[must_use]
    pub fn unfetched(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: UrlStatus::Unfetched,
            last_fetched: None,
            page_score: None,
        }
    }
}

/// Imports a URL list into a new crawl db.
///
/// The source holds one URL per line; blank lines and `#` comments are
/// skipped and invalid URLs are logged and skipped. With `allow_duplicates`
/// false, URLs are deduplicated by their normalized form. Returns the number
/// of entries written; an import that yields no entry is an error.
pub fn import_urls(source: &Path, destination: &CrawlState, allow_duplicates: bool) -> Result<usize> {
    let text = fs::read_to_string(source).map_err(|source_err| Error::ReadFile {
        path: source.to_path_buf(),
        source: source_err,
    })?;

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(url) = normalize_url(line) else {
            tracing::warn!(line, "skipping invalid seed URL");
            continue;
        };

        if !allow_duplicates && !seen.insert(url.clone()) {
            tracing::debug!(%url, "skipping duplicate seed URL");
            continue;
        }
        entries.push(CrawlDbEntry::unfetched(url));
    }

    if entries.is_empty() {
        return Err(Error::InvalidSeed(source.to_path_buf()));
    }

    destination.write(&entries)?;
    tracing::info!(
        count = entries.len(),
        crawl_db = %destination.path().display(),
        "imported seed URLs"
    );
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let state = CrawlState::new(dir.path().join("crawldb"));
        assert!(!state.exists());

        let mut fetched = CrawlDbEntry::unfetched("https://b.example/");
        fetched.status = UrlStatus::Fetched;
        fetched.page_score = Some(0.5);
        let entries = vec![CrawlDbEntry::unfetched("https://a.example/"), fetched];

        state.write(&entries).unwrap();
        assert!(state.exists());
        assert_eq!(state.read().unwrap(), entries);
    }

    #[test]
    fn import_skips_comments_and_invalid_lines() {
        let dir = tempfile::tempdir().unwrap();
        let seeds = dir.path().join("seeds.txt");
        fs::write(&seeds, "# seeds\n\nhttps://a.example\nnot-a-url\nhttps://b.example/x/\n").unwrap();

        let state = CrawlState::new(dir.path().join("crawldb"));
        assert_eq!(import_urls(&seeds, &state, false).unwrap(), 2);

        let urls: Vec<_> = state.read().unwrap().into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["https://a.example/", "https://b.example/x"]);
    }

    #[test]
    fn import_keeps_duplicates_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let seeds = dir.path().join("seeds.txt");
        fs::write(&seeds, "https://a.example\nhttps://a.example\n").unwrap();

        let state = CrawlState::new(dir.path().join("crawldb"));
        assert_eq!(import_urls(&seeds, &state, true).unwrap(), 2);
    }

    #[test]
    fn import_without_valid_urls_fails() {
        let dir = tempfile::tempdir().unwrap();
        let seeds = dir.path().join("seeds.txt");
        fs::write(&seeds, "# nothing\n").unwrap();

        let state = CrawlState::new(dir.path().join("crawldb"));
        assert!(matches!(import_urls(&seeds, &state, false), Err(Error::InvalidSeed(_))));
    }

    #[test]
    fn missing_seed_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = CrawlState::new(dir.path().join("crawldb"));
        let err = import_urls(&dir.path().join("absent.txt"), &state, false).unwrap_err();
        assert!(matches!(err, Error::ReadFile { .. }));
    }
}
