//! Versioned loop directories.
//!
//! Each loop writes into its own `<index>-<timestamp>` directory under the
//! working dir. Every directory created is recorded in a `loops.json` index
//! next to them, and "latest" is answered from that index (highest loop index,
//! later creation winning ties) rather than by probing directory names, so
//! clock skew or colliding names cannot reorder loops.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::crawldb::CrawlState;
use crate::error::{Error, Result};
use crate::options::CRAWLDB_SUBDIR_NAME;

const INDEX_FILE_NAME: &str = "loops.json";

/// Matches loop directory names such as `3-20240101120000123` or `3-20240101120000123-1`.
#[allow(clippy::expect_used)]
static LOOP_DIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-\d{17}(-\d+)?$").expect("LOOP_DIR_RE regex"));

/// One recorded loop directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopDirEntry {
    /// Loop index (0 is the seed loop).
    pub index: usize,
    /// Directory name relative to the working dir.
    pub dir_name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Persistent record of the loop directories in a working dir.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopIndex {
    entries: Vec<LoopDirEntry>,
}

impl LoopIndex {
    /// Loads the index of `root`; a missing index is empty.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(INDEX_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| Error::serialization(&path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    /// Writes the index into `root`.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = root.join(INDEX_FILE_NAME);
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::serialization(&path, e))?;
        fs::write(&path, json).map_err(|e| Error::io(&path, e))
    }

    /// Recorded entries in creation order.
    #[must_use]
    pub fn entries(&self) -> &[LoopDirEntry] {
        &self.entries
    }

    /// Latest entry whose directory still exists under `root`.
    #[must_use]
    pub fn latest(&self, root: &Path) -> Option<&LoopDirEntry> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| root.join(&e.dir_name).is_dir())
            .max_by_key(|(position, e)| (e.index, *position))
            .map(|(_, e)| e)
    }
}

/// Path of the latest loop directory under `root`, if any.
pub fn find_latest_loop_dir(root: &Path) -> Result<Option<PathBuf>> {
    let index = LoopIndex::load(root)?;
    Ok(index.latest(root).map(|e| root.join(&e.dir_name)))
}

/// Creates and records a fresh `<index>-<timestamp>` directory under `root`.
pub fn make_loop_dir(root: &Path, index: usize) -> Result<PathBuf> {
    fs::create_dir_all(root).map_err(|e| Error::io(root, e))?;

    let created_at = Utc::now();
    let stem = format!("{index}-{}", created_at.format("%Y%m%d%H%M%S%3f"));
    let mut dir_name = stem.clone();
    let mut suffix = 1;
    while root.join(&dir_name).exists() {
        dir_name = format!("{stem}-{suffix}");
        suffix += 1;
    }

    let path = root.join(&dir_name);
    fs::create_dir(&path).map_err(|e| Error::io(&path, e))?;

    let mut loop_index = LoopIndex::load(root)?;
    loop_index.entries.push(LoopDirEntry {
        index,
        dir_name,
        created_at,
    });
    loop_index.save(root)?;

    tracing::debug!(loop_dir = %path.display(), index, "created loop dir");
    Ok(path)
}

/// Deletes every loop directory under `root` and empties the index.
///
/// Directories that look like loop directories but are missing from the
/// index (left by a crash before the index was written) are removed too.
/// Returns the number of directories deleted.
pub fn clear_loop_dirs(root: &Path) -> Result<usize> {
    if !root.exists() {
        return Ok(0);
    }

    let index = LoopIndex::load(root)?;
    let mut removed = 0;

    for entry in index.entries() {
        let path = root.join(&entry.dir_name);
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(|e| Error::io(&path, e))?;
            removed += 1;
        }
    }

    for entry in fs::read_dir(root).map_err(|e| Error::io(root, e))? {
        let entry = entry.map_err(|e| Error::io(root, e))?;
        let path = entry.path();
        let is_loop_dir = path.is_dir()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| LOOP_DIR_RE.is_match(n));
        if is_loop_dir {
            fs::remove_dir_all(&path).map_err(|e| Error::io(&path, e))?;
            removed += 1;
        }
    }

    LoopIndex::default().save(root)?;
    Ok(removed)
}

/// Crawl db location inside a loop directory.
#[must_use]
pub fn crawl_state_in(loop_dir: &Path) -> CrawlState {
    CrawlState::new(loop_dir.join(CRAWLDB_SUBDIR_NAME))
}
