//! Worker pool
//!
//! Spawns a fixed number of workers over one shared frontier and joins them
//! once every worker has observed a quiescent frontier.

use crate::config::Config;
use crate::crawler::fetcher::Fetch;
use crate::crawler::parser::Extract;
use crate::crawler::worker::{run_worker, PageError, PageOutcome, WorkerContext};
use crate::crawler::Frontier;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Per-outcome counters for a crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Pages that passed every check and had their links harvested
    pub crawled: u64,
    /// Transport failures and non-success statuses
    pub fetch_failures: u64,
    pub size_rejected: u64,
    pub extraction_failures: u64,
    pub low_content: u64,
    pub near_duplicates: u64,
    pub storage_failures: u64,
    /// New URLs added to the frontier by crawled pages
    pub links_enqueued: u64,
}

impl CrawlReport {
    /// Counts the outcome of one URL
    pub fn record(&mut self, result: &Result<PageOutcome, PageError>) {
        match result {
            Ok(outcome) => {
                self.crawled += 1;
                self.links_enqueued += outcome.links_enqueued as u64;
            }
            Err(PageError::Fetch(_)) | Err(PageError::Status(_)) => self.fetch_failures += 1,
            Err(PageError::SizeRejected { .. }) => self.size_rejected += 1,
            Err(PageError::Extraction(_)) => self.extraction_failures += 1,
            Err(PageError::LowContent { .. }) => self.low_content += 1,
            Err(PageError::NearDuplicate(_)) => self.near_duplicates += 1,
            Err(PageError::Storage(_)) => self.storage_failures += 1,
        }
    }

    /// Adds another report's counters into this one
    pub fn merge(&mut self, other: &CrawlReport) {
        self.crawled += other.crawled;
        self.fetch_failures += other.fetch_failures;
        self.size_rejected += other.size_rejected;
        self.extraction_failures += other.extraction_failures;
        self.low_content += other.low_content;
        self.near_duplicates += other.near_duplicates;
        self.storage_failures += other.storage_failures;
        self.links_enqueued += other.links_enqueued;
    }

    /// Total URLs handled, whatever their outcome
    pub fn processed(&self) -> u64 {
        self.crawled
            + self.fetch_failures
            + self.size_rejected
            + self.extraction_failures
            + self.low_content
            + self.near_duplicates
            + self.storage_failures
    }
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed: {} crawled, {} fetch failures, {} size rejected, \
             {} extraction failures, {} low content, {} near duplicates, \
             {} storage failures; {} links enqueued",
            self.processed(),
            self.crawled,
            self.fetch_failures,
            self.size_rejected,
            self.extraction_failures,
            self.low_content,
            self.near_duplicates,
            self.storage_failures,
            self.links_enqueued
        )
    }
}

/// Fixed-size pool of workers sharing one frontier
pub struct CrawlPool<F, E> {
    ctx: WorkerContext<F, E>,
    workers: usize,
}

impl<F, E> CrawlPool<F, E>
where
    F: Fetch,
    E: Extract,
{
    /// Creates a pool sized and tuned from the configuration
    ///
    /// # Arguments
    ///
    /// * `frontier` - The shared frontier, already initialized
    /// * `fetcher` - Fetch collaborator
    /// * `extractor` - Extraction collaborator
    /// * `config` - Worker count, delays and content thresholds
    pub fn new(frontier: Arc<Frontier>, fetcher: F, extractor: E, config: &Config) -> Self {
        Self {
            ctx: WorkerContext {
                frontier,
                fetcher: Arc::new(fetcher),
                extractor: Arc::new(extractor),
                content: config.content.clone(),
                time_delay: config.crawler.time_delay(),
            },
            workers: config.crawler.workers.max(1) as usize,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every worker to completion and sums their reports
    ///
    /// A worker task that panics is logged and contributes nothing; the rest of
    /// the pool keeps draining the frontier.
    pub async fn run(self) -> CrawlReport {
        tracing::info!("Starting {} workers", self.workers);

        let mut set = JoinSet::new();
        for id in 0..self.workers {
            set.spawn(run_worker(id, self.ctx.clone()));
        }

        let mut report = CrawlReport::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(worker_report) => report.merge(&worker_report),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        tracing::info!("All workers finished");
        report
    }
}
