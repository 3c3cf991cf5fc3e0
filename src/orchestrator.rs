//! Loop orchestration.
//!
//! [`LoopOrchestrator`] owns the working directory. It clears earlier runs,
//! seeds loop 0 and then dispatches one dataflow stage per loop, strictly in
//! sequence, feeding each loop the crawl db produced by the one before.
//! Runs cannot be resumed: a crashed run leaves its loop directories behind
//! and the next run deletes them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::crawldb::{import_urls, CrawlState};
use crate::error::{Error, Result};
use crate::extractor::ExtractorFactory;
use crate::filter::AdmissionFilter;
use crate::loopdir::{clear_loop_dirs, crawl_state_in, find_latest_loop_dir, make_loop_dir};
use crate::options::FetchPolicy;
use crate::workflow::{DataflowStage, Iteration, StageContext};

/// Sequences crawl loops over a working directory.
pub struct LoopOrchestrator<S> {
    working_dir: PathBuf,
    stage: S,
}

impl<S: DataflowStage> LoopOrchestrator<S> {
    /// Creates an orchestrator dispatching `stage` for every loop.
    pub fn new(working_dir: impl Into<PathBuf>, stage: S) -> Self {
        Self {
            working_dir: working_dir.into(),
            stage,
        }
    }

    /// Working directory holding the loop directories.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Deletes any earlier loop directories and seeds loop 0 from `seed_urls`.
    ///
    /// Seeds are deduplicated. Returns the seeded crawl state.
    pub fn setup_working_dir(&self, seed_urls: &Path) -> Result<CrawlState> {
        let removed = clear_loop_dirs(&self.working_dir)?;
        if removed > 0 {
            tracing::info!(
                working_dir = %self.working_dir.display(),
                removed,
                "deleted existing loop dirs"
            );
        }

        let loop_dir = make_loop_dir(&self.working_dir, 0)?;
        let state = crawl_state_in(&loop_dir);
        import_urls(seed_urls, &state, false)?;
        Ok(state)
    }

    /// Crawl state of the latest loop directory.
    pub fn latest_state(&self) -> Result<CrawlState> {
        let latest = find_latest_loop_dir(&self.working_dir)?
            .ok_or_else(|| Error::MissingLoopDir(self.working_dir.clone()))?;
        Ok(crawl_state_in(&latest))
    }

    /// Runs `num_loops` loops starting from `seed_state`.
    ///
    /// Each loop gets a fresh directory and blocks until its stage finishes.
    /// The first failure aborts the run; later loops are never dispatched.
    /// With `num_loops == 0` the seed state is returned unchanged. The
    /// working dir must already hold a loop directory (see
    /// [`Self::setup_working_dir`]); otherwise [`Error::MissingLoopDir`].
    pub fn run(
        &self,
        seed_state: CrawlState,
        num_loops: usize,
        fetch_policy: &FetchPolicy,
        crawl_filter: &Arc<AdmissionFilter>,
        extractors: &ExtractorFactory,
    ) -> Result<CrawlState> {
        self.latest_state()?;
        let mut state = seed_state;

        for index in 1..=num_loops {
            let output_dir = make_loop_dir(&self.working_dir, index)?;
            let iteration = Iteration {
                index,
                input_state: state,
                output_dir,
            };

            let ctx = StageContext {
                iteration: &iteration,
                fetch_policy,
                crawl_filter,
                extractors,
            };

            tracing::debug!(
                loop_index = index,
                input = %iteration.input_state.path().display(),
                output = %iteration.output_dir.display(),
                "dispatching loop"
            );

            let report = self.stage.execute(&ctx).map_err(|e| Error::Iteration {
                index,
                message: e.to_string(),
            })?;

            let produced = iteration.output_state();
            if !produced.exists() {
                return Err(Error::MissingCrawlDb {
                    index,
                    path: produced.path().to_path_buf(),
                });
            }

            tracing::info!(loop_index = index, extracted = report.extracted, "loop complete");
            state = produced;
        }

        Ok(state)
    }
}
