//! Per-URL processing and the worker loop
//!
//! A worker repeatedly takes a URL from the frontier, runs it through
//! [`process_page`], marks it complete whatever the outcome, and sleeps for the
//! configured delay. No per-URL failure ever stops a worker.

use crate::config::ContentConfig;
use crate::crawler::fetcher::{Fetch, FetchError};
use crate::crawler::parser::{Extract, ExtractError};
use crate::crawler::pool::CrawlReport;
use crate::crawler::Frontier;
use crate::dedup::SimHash;
use crate::storage::StorageError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a page was dropped
#[derive(Debug, Error)]
pub enum PageError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("payload of {size} bytes outside {min}..={max}")]
    SizeRejected { size: usize, min: usize, max: usize },

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("only {length} characters of text, need {min}")]
    LowContent { length: usize, min: usize },

    #[error("near-duplicate content ({0})")]
    NearDuplicate(SimHash),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result of a page that was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    /// Links that passed validation and were new to the frontier
    pub links_enqueued: usize,
    pub fingerprint: SimHash,
}

/// Everything one worker needs, shared across the pool
pub struct WorkerContext<F, E> {
    pub frontier: Arc<Frontier>,
    pub fetcher: Arc<F>,
    pub extractor: Arc<E>,
    pub content: ContentConfig,
    pub time_delay: Duration,
}

impl<F, E> Clone for WorkerContext<F, E> {
    fn clone(&self) -> Self {
        Self {
            frontier: Arc::clone(&self.frontier),
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            content: self.content.clone(),
            time_delay: self.time_delay,
        }
    }
}

/// Fetches, filters and harvests one URL
///
/// # Processing Steps
///
/// 1. Fetch; a transport failure drops the page
/// 2. Require a success status
/// 3. Require the payload size within the configured bounds
/// 4. Extract text and links
/// 5. Require the minimum text length
/// 6. Fingerprint the text; drop near-duplicates, otherwise record it
/// 7. Resolve, validate and enqueue each link
///
/// The caller marks the URL complete regardless of the result.
pub async fn process_page<F, E>(
    url: &str,
    fetcher: &F,
    extractor: &E,
    frontier: &Frontier,
    content: &ContentConfig,
) -> Result<PageOutcome, PageError>
where
    F: Fetch,
    E: Extract,
{
    let response = fetcher.fetch(url).await?;

    if !response.is_success() {
        return Err(PageError::Status(response.status));
    }

    let size = response.content_len();
    if size < content.min_content_size || size > content.max_content_size {
        return Err(PageError::SizeRejected {
            size,
            min: content.min_content_size,
            max: content.max_content_size,
        });
    }

    let base = Url::parse(url).map_err(|e| FetchError::Request(e.to_string()))?;
    let extracted = extractor.extract(&response.raw.content, &base)?;

    let length = extracted.text.chars().count();
    if length < content.min_text_length {
        return Err(PageError::LowContent {
            length,
            min: content.min_text_length,
        });
    }

    let fingerprint = SimHash::of(&extracted.text);
    if !frontier.admit_fingerprint(url, fingerprint, content.near_duplicate_threshold)? {
        return Err(PageError::NearDuplicate(fingerprint));
    }

    let mut links_enqueued = 0;
    for link in &extracted.links {
        let Some(resolved) = resolve_link(&base, link) else {
            continue;
        };

        if !frontier.filter().is_valid(&resolved) {
            tracing::trace!("Discarding link {}", resolved);
            continue;
        }

        if frontier.enqueue(&resolved)? {
            links_enqueued += 1;
        }
    }

    Ok(PageOutcome {
        links_enqueued,
        fingerprint,
    })
}

/// Resolves a link against its page and strips the fragment
pub fn resolve_link(base: &Url, link: &str) -> Option<String> {
    let mut resolved = base.join(link.trim()).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Runs one worker until the frontier reports sustained emptiness
///
/// # Arguments
///
/// * `id` - Worker number, used in log lines
/// * `ctx` - Shared frontier, collaborators and thresholds
///
/// # Returns
///
/// Counters for every URL this worker handled
pub async fn run_worker<F, E>(id: usize, ctx: WorkerContext<F, E>) -> CrawlReport
where
    F: Fetch,
    E: Extract,
{
    let mut report = CrawlReport::default();
    tracing::info!("Worker {} started", id);

    while let Some(url) = ctx.frontier.next_url().await {
        tracing::debug!("Worker {} processing {}", id, url);

        let result = process_page(
            &url,
            ctx.fetcher.as_ref(),
            ctx.extractor.as_ref(),
            &ctx.frontier,
            &ctx.content,
        )
        .await;

        match &result {
            Ok(outcome) => tracing::debug!(
                "Crawled {} ({} new links, fingerprint {})",
                url,
                outcome.links_enqueued,
                outcome.fingerprint
            ),
            Err(PageError::Storage(e)) => tracing::error!("Storage failure on {}: {}", url, e),
            Err(e) => tracing::debug!("Dropped {}: {}", url, e),
        }
        report.record(&result);

        if let Err(e) = ctx.frontier.mark_complete(&url) {
            tracing::error!("Failed to mark {} complete: {}", url, e);
        }

        tokio::time::sleep(ctx.time_delay).await;
    }

    tracing::info!("Worker {} stopped after {} URLs", id, report.processed());
    report
}
