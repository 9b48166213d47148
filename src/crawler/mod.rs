//! Crawler module for scheduling, fetching and processing pages
//!
//! This module contains the core crawling logic, including:
//! - The durable frontier with per-domain politeness
//! - HTTP fetching behind the `Fetch` collaborator trait
//! - HTML text and link extraction behind the `Extract` collaborator trait
//! - The per-URL worker loop and the pool that runs it

mod fetcher;
mod frontier;
mod parser;
mod pool;
mod worker;

pub use fetcher::{build_http_client, Fetch, FetchError, HttpFetcher, RawResponse, Response};
pub use frontier::Frontier;
pub use parser::{parse_html, Extract, ExtractError, Extracted, HtmlExtractor};
pub use pool::{CrawlPool, CrawlReport};
pub use worker::{process_page, resolve_link, run_worker, PageError, PageOutcome, WorkerContext};

use crate::config::Config;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the durable store and rebuild or seed the frontier
/// 2. Build the HTTP client
/// 3. Run the worker pool until the frontier is quiescent
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `restart` - Discard the durable store and start from the seeds
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished; per-outcome counters
/// * `Err(CrawlError)` - The store or HTTP client could not be set up
pub async fn crawl(config: &Config, restart: bool) -> crate::Result<CrawlReport> {
    let frontier = Arc::new(Frontier::open(config, restart)?);
    let fetcher = HttpFetcher::new(&config.user_agent)?;

    let pool = CrawlPool::new(frontier, fetcher, HtmlExtractor, config);
    Ok(pool.run().await)
}
