use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rs_webminer::{run_crawl, ExtractorOptions, FetchPolicy, FetcherMode, RunConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "webminer",
    about = "Crawl a seed list loop by loop and mine links from admitted pages"
)]
struct Cli {
    /// Directory holding the loop directories (cleared at startup)
    #[arg(long, env = "WEBMINER_WORKING_DIR", default_value = "working")]
    working_dir: PathBuf,

    /// Seed URL list, one URL per line
    #[arg(long, env = "WEBMINER_SEED_URLS")]
    seed_urls: PathBuf,

    /// Regex patterns of URLs eligible for fetching
    #[arg(long, env = "WEBMINER_CRAWL_FILTER")]
    crawl_filter: PathBuf,

    /// Regex patterns of URLs eligible for analysis
    #[arg(long, env = "WEBMINER_MINE_FILTER")]
    mine_filter: PathBuf,

    /// Number of crawl loops
    #[arg(long, env = "WEBMINER_NUM_LOOPS", default_value_t = 1)]
    num_loops: usize,

    /// Seconds between requests
    #[arg(long, env = "WEBMINER_CRAWL_DELAY_SECS", default_value_t = 1)]
    crawl_delay_secs: u64,

    /// Maximum bytes kept per document
    #[arg(long, env = "WEBMINER_MAX_CONTENT_SIZE", default_value_t = 128 * 1024)]
    max_content_size: usize,

    /// Politeness mode
    #[arg(long, env = "WEBMINER_FETCHER_MODE", value_enum, default_value_t = Mode::Efficient)]
    fetcher_mode: Mode,

    /// Accept any MIME type instead of HTML only
    #[arg(long, default_value_t = false)]
    any_mime_type: bool,

    /// Per-document parse budget in seconds
    #[arg(long, env = "WEBMINER_PARSE_BUDGET_SECS", default_value_t = 30)]
    parse_budget_secs: u64,

    /// Resolve link targets against the page URL
    #[arg(long, default_value_t = false)]
    resolve_links: bool,

    /// Extraction worker threads per loop
    #[arg(long, env = "WEBMINER_WORKERS", default_value_t = 4)]
    workers: usize,

    /// Positive phrase list; enables phrase-ratio scoring with --negative-phrases
    #[arg(long, requires = "negative_phrases")]
    positive_phrases: Option<PathBuf>,

    /// Negative phrase list
    #[arg(long, requires = "positive_phrases")]
    negative_phrases: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Efficient,
    Complete,
    Impolite,
}

impl From<Mode> for FetcherMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Efficient => Self::Efficient,
            Mode::Complete => Self::Complete,
            Mode::Impolite => Self::Impolite,
        }
    }
}

impl Cli {
    fn into_config(self) -> RunConfig {
        let mut fetch_policy = FetchPolicy {
            crawl_delay: Duration::from_secs(self.crawl_delay_secs),
            max_content_size: self.max_content_size,
            mode: self.fetcher_mode.into(),
            ..FetchPolicy::default()
        };
        if self.any_mime_type {
            fetch_policy.valid_mime_types = BTreeSet::new();
        }

        RunConfig {
            working_dir: self.working_dir,
            seed_urls_file: self.seed_urls,
            crawl_filter_file: self.crawl_filter,
            mine_filter_file: self.mine_filter,
            num_loops: self.num_loops,
            fetch_policy,
            extractor: ExtractorOptions {
                parse_budget: Duration::from_secs(self.parse_budget_secs),
                resolve_links: self.resolve_links,
            },
            worker_threads: self.workers,
            phrase_files: self.positive_phrases.zip(self.negative_phrases),
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("webminer: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rs_webminer=info".parse()?))
        .init();

    let cli = Cli::parse();
    let num_loops = cli.num_loops;
    let config = cli.into_config();

    let last = run_crawl(&config)
        .with_context(|| format!("crawl in {} failed", config.working_dir.display()))?;

    tracing::info!(num_loops, crawl_db = %last.path().display(), "crawl complete");
    println!("{}", last.path().display());
    Ok(())
}
