//! Per-iteration dataflow stage.
//!
//! The orchestrator dispatches one [`DataflowStage`] execution per loop.
//! [`MiningWorkflow`] is the in-process implementation: it fetches the
//! admitted frontier, runs extraction on a pool of worker threads (each
//! owning its own extractor), writes the extraction records, and merges
//! fetch status and newly discovered links into the loop's crawl db.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{bounded, unbounded};

use crate::crawldb::{CrawlDbEntry, CrawlState, UrlStatus};
use crate::document::FetchedDocument;
use crate::error::{Error, ExtractFault, Result};
use crate::extractor::ExtractorFactory;
use crate::fetch::Fetcher;
use crate::filter::AdmissionFilter;
use crate::loopdir::crawl_state_in;
use crate::options::{FetchPolicy, FetcherMode};
use crate::result::ExtractionResult;
use crate::url_utils::{create_absolute_url, normalize_url, parse_url};

/// Name of the extraction records file inside a loop directory.
pub const RESULTS_FILE_NAME: &str = "results.jsonl";

/// One loop of the crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    /// Loop index, starting at 1.
    pub index: usize,
    /// Crawl state produced by the previous loop (or the seed import).
    pub input_state: CrawlState,
    /// Fresh directory this loop writes into.
    pub output_dir: PathBuf,
}

impl Iteration {
    /// Where this loop must leave its crawl db.
    #[must_use]
    pub fn output_state(&self) -> CrawlState {
        crawl_state_in(&self.output_dir)
    }
}

/// Everything a stage execution is given.
pub struct StageContext<'a> {
    /// The loop being executed.
    pub iteration: &'a Iteration,
    /// Fetch policy.
    pub fetch_policy: &'a FetchPolicy,
    /// Gate applied before fetching.
    pub crawl_filter: &'a Arc<AdmissionFilter>,
    /// Builds one extractor per worker; each carries the mine filter.
    pub extractors: &'a ExtractorFactory,
}

/// Counters reported by a stage execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Documents fetched successfully.
    pub fetched: usize,
    /// URLs whose fetch failed.
    pub failed: usize,
    /// Documents skipped by the fetch policy.
    pub skipped: usize,
    /// Documents turned into extraction records.
    pub extracted: usize,
    /// Documents the mine filter rejected.
    pub not_mined: usize,
    /// Documents dropped on timeout.
    pub timed_out: usize,
    /// Documents dropped on parse error.
    pub parse_errors: usize,
    /// New URLs added to the crawl db.
    pub discovered: usize,
}

/// The per-loop unit of work dispatched by the orchestrator.
///
/// Implementations must block until the loop is finished and, on success,
/// leave a crawl db at [`Iteration::output_state`].
pub trait DataflowStage {
    /// Executes one loop.
    fn execute(&self, ctx: &StageContext<'_>) -> Result<StageReport>;
}

/// In-process fetch, extract and merge stage.
pub struct MiningWorkflow<F> {
    fetcher: Arc<F>,
    worker_threads: usize,
}

impl<F: Fetcher> MiningWorkflow<F> {
    /// Creates a workflow with `worker_threads` extraction workers (at least one).
    pub fn new(fetcher: Arc<F>, worker_threads: usize) -> Self {
        Self {
            fetcher,
            worker_threads: worker_threads.max(1),
        }
    }
}

type Outcome = (String, std::result::Result<Option<ExtractionResult>, ExtractFault>);

impl<F: Fetcher> DataflowStage for MiningWorkflow<F> {
    fn execute(&self, ctx: &StageContext<'_>) -> Result<StageReport> {
        let iteration = ctx.iteration;
        let entries = iteration.input_state.read()?;
        let frontier: Vec<String> = entries
            .iter()
            .filter(|e| e.status == UrlStatus::Unfetched && ctx.crawl_filter.is_admitted(&e.url))
            .map(|e| e.url.clone())
            .collect();

        tracing::info!(
            loop_index = iteration.index,
            known = entries.len(),
            frontier = frontier.len(),
            "starting loop"
        );

        let mut report = StageReport::default();
        let (doc_tx, doc_rx) = bounded::<FetchedDocument>(self.worker_threads * 2);
        let (out_tx, out_rx) = unbounded::<Outcome>();

        let statuses = thread::scope(|scope| {
            for worker_id in 0..self.worker_threads {
                let rx = doc_rx.clone();
                let tx = out_tx.clone();
                let mut extractor = ctx.extractors.build();
                scope.spawn(move || {
                    for doc in rx.iter() {
                        let outcome = extractor.extract(&doc);
                        if tx.send((doc.base_url, outcome)).is_err() {
                            break;
                        }
                    }
                    tracing::trace!(worker_id, "extraction worker finished");
                });
            }
            drop(doc_rx);
            drop(out_tx);

            let mut statuses: HashMap<String, UrlStatus> = HashMap::new();
            let mut politeness = Politeness::new(ctx.fetch_policy);
            for url in &frontier {
                politeness.wait(url);
                let status = match self.fetcher.fetch(url, ctx.fetch_policy) {
                    Ok(doc) if !ctx.fetch_policy.accepts_mime(&doc.mime_type()) => {
                        tracing::debug!(%url, mime = %doc.mime_type(), "skipping unacceptable MIME type");
                        report.skipped += 1;
                        UrlStatus::Skipped
                    }
                    Ok(doc) => {
                        report.fetched += 1;
                        if doc_tx.send(doc).is_err() {
                            tracing::error!("all extraction workers exited");
                            break;
                        }
                        UrlStatus::Fetched
                    }
                    Err(e) => {
                        tracing::warn!(%url, error = %e, "fetch failed");
                        report.failed += 1;
                        UrlStatus::Failed
                    }
                };
                statuses.insert(url.clone(), status);
            }
            drop(doc_tx);
            statuses
        });

        let mut results = Vec::new();
        for (url, outcome) in out_rx.iter() {
            match outcome {
                Ok(Some(result)) => results.push(result),
                Ok(None) => report.not_mined += 1,
                Err(ExtractFault::Timeout { .. }) => report.timed_out += 1,
                Err(ExtractFault::ParseError { .. }) => report.parse_errors += 1,
            }
            tracing::trace!(%url, "collected extraction outcome");
        }
        report.extracted = results.len();

        write_results(&iteration.output_dir.join(RESULTS_FILE_NAME), &results)?;

        let merged = merge(entries, &statuses, &results, &mut report);
        iteration.output_state().write(&merged)?;

        tracing::info!(
            loop_index = iteration.index,
            fetched = report.fetched,
            failed = report.failed,
            skipped = report.skipped,
            extracted = report.extracted,
            timed_out = report.timed_out,
            parse_errors = report.parse_errors,
            discovered = report.discovered,
            "finished loop"
        );
        Ok(report)
    }
}

/// Applies fetch statuses and scores, then appends newly discovered URLs.
fn merge(
    mut entries: Vec<CrawlDbEntry>,
    statuses: &HashMap<String, UrlStatus>,
    results: &[ExtractionResult],
    report: &mut StageReport,
) -> Vec<CrawlDbEntry> {
    let now = Utc::now();
    let scores: HashMap<&str, f32> = results.iter().map(|r| (r.url.as_str(), r.page_score)).collect();

    for entry in &mut entries {
        if let Some(status) = statuses.get(&entry.url) {
            entry.status = *status;
            entry.last_fetched = Some(now);
            entry.page_score = scores.get(entry.url.as_str()).copied();
        }
    }

    let mut known: HashSet<String> = entries.iter().map(|e| e.url.clone()).collect();
    for result in results {
        let Some(base) = parse_url(&result.base_url).or_else(|| parse_url(&result.url)) else {
            continue;
        };
        for link in &result.outlinks {
            let absolute = create_absolute_url(&link.target_url, &base);
            let Some(url) = normalize_url(&absolute) else {
                continue;
            };
            if known.insert(url.clone()) {
                entries.push(CrawlDbEntry::unfetched(url));
                report.discovered += 1;
            }
        }
    }

    entries
}

fn write_results(path: &std::path::Path, results: &[ExtractionResult]) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for result in results {
        serde_json::to_writer(&mut writer, result).map_err(|e| Error::serialization(path, e))?;
        writer.write_all(b"\n").map_err(|e| Error::io(path, e))?;
    }
    writer.flush().map_err(|e| Error::io(path, e))
}

/// Tracks request times to honor the crawl delay.
struct Politeness {
    delay: Duration,
    mode: FetcherMode,
    last_any: Option<Instant>,
    last_by_host: HashMap<String, Instant>,
}

impl Politeness {
    fn new(policy: &FetchPolicy) -> Self {
        Self {
            delay: policy.crawl_delay,
            mode: policy.mode,
            last_any: None,
            last_by_host: HashMap::new(),
        }
    }

    fn wait(&mut self, url: &str) {
        let previous = match self.mode {
            FetcherMode::Impolite => None,
            FetcherMode::Complete => self.last_any,
            FetcherMode::Efficient => self.last_by_host.get(&host_of(url)).copied(),
        };
        if let Some(previous) = previous {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }

        let now = Instant::now();
        self.last_any = Some(now);
        self.last_by_host.insert(host_of(url), now);
    }
}

fn host_of(url: &str) -> String {
    parse_url(url)
        .and_then(|u| u.host_str().map(ToString::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Outlink;

    fn result_with_links(url: &str, links: &[&str]) -> ExtractionResult {
        ExtractionResult {
            url: url.to_string(),
            page_score: 0.5,
            outlinks: links.iter().map(|l| Outlink::new(*l, "", "")).collect(),
            ..ExtractionResult::default()
        }
    }

    #[test]
    fn merge_updates_status_and_discovers_links() {
        let entries = vec![
            CrawlDbEntry::unfetched("https://a.example/"),
            CrawlDbEntry::unfetched("https://b.example/"),
        ];
        let statuses = HashMap::from([
            ("https://a.example/".to_string(), UrlStatus::Fetched),
            ("https://b.example/".to_string(), UrlStatus::Failed),
        ]);
        let results = vec![result_with_links(
            "https://a.example/",
            &["/child", "https://b.example/", "", "mailto:x@y.z", "/child#frag"],
        )];
        let mut report = StageReport::default();

        let merged = merge(entries, &statuses, &results, &mut report);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].status, UrlStatus::Fetched);
        assert_eq!(merged[0].page_score, Some(0.5));
        assert_eq!(merged[1].status, UrlStatus::Failed);
        assert_eq!(merged[1].page_score, None);
        assert_eq!(merged[2], CrawlDbEntry::unfetched("https://a.example/child"));
        assert_eq!(report.discovered, 1);
    }

    #[test]
    fn merge_prefers_recorded_base_url() {
        let mut result = result_with_links("https://a.example/old", &["next"]);
        result.base_url = "https://a.example/new/dir/page".to_string();
        let mut report = StageReport::default();

        let merged = merge(Vec::new(), &HashMap::new(), &[result], &mut report);

        assert_eq!(merged, vec![CrawlDbEntry::unfetched("https://a.example/new/dir/next")]);
    }

    #[test]
    fn impolite_mode_never_waits() {
        let policy = FetchPolicy {
            crawl_delay: Duration::from_secs(60),
            mode: FetcherMode::Impolite,
            ..FetchPolicy::default()
        };
        let mut politeness = Politeness::new(&policy);
        let start = Instant::now();
        politeness.wait("https://a.example/1");
        politeness.wait("https://a.example/2");
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn efficient_mode_only_waits_for_same_host() {
        let policy = FetchPolicy {
            crawl_delay: Duration::from_millis(200),
            mode: FetcherMode::Efficient,
            ..FetchPolicy::default()
        };
        let mut politeness = Politeness::new(&policy);
        let start = Instant::now();
        politeness.wait("https://a.example/1");
        politeness.wait("https://b.example/1");
        assert!(start.elapsed() < Duration::from_millis(150));

        politeness.wait("https://a.example/2");
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
