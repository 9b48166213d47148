//! Statistics generation from the frontier store
//!
//! This module provides functionality for extracting and displaying
//! frontier statistics from the storage layer.

use crate::storage::{StorageResult, Store};
use crate::url::domain_of;
use std::collections::HashMap;

/// How many domains are listed in the pending breakdown
const TOP_DOMAINS: usize = 10;

/// Frontier statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of URLs ever recorded
    pub total_urls: u64,

    /// URLs processed, whatever their outcome
    pub completed: u64,

    /// URLs still waiting to be crawled
    pub pending: u64,

    /// Content fingerprints recorded
    pub fingerprints: u64,

    /// Number of distinct hosts across all records
    pub unique_domains: u64,

    /// Hosts with the most pending URLs, descending
    pub pending_by_domain: Vec<(String, u64)>,
}

impl CrawlStatistics {
    /// Share of recorded URLs already completed, in percent
    pub fn completion_rate(&self) -> f64 {
        if self.total_urls == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total_urls as f64) * 100.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to scan
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to read the store
pub fn load_statistics(store: &dyn Store) -> StorageResult<CrawlStatistics> {
    let mut stats = CrawlStatistics::default();
    let mut domains: HashMap<String, u64> = HashMap::new();

    for record in store.records()? {
        stats.total_urls += 1;
        let domain = domain_of(&record.canonical_url).unwrap_or_default();
        let pending = domains.entry(domain).or_insert(0);

        if record.completed {
            stats.completed += 1;
        } else {
            stats.pending += 1;
            *pending += 1;
        }
    }

    stats.unique_domains = domains.len() as u64;
    stats.fingerprints = store.fingerprints()?.len() as u64;

    let mut by_domain: Vec<(String, u64)> =
        domains.into_iter().filter(|(_, count)| *count > 0).collect();
    by_domain.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    by_domain.truncate(TOP_DOMAINS);
    stats.pending_by_domain = by_domain;

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Frontier Statistics ===\n");

    println!("Overview:");
    println!("  Total URLs recorded: {}", stats.total_urls);
    println!("  Completed: {}", stats.completed);
    println!("  Pending: {}", stats.pending);
    println!("  Unique domains: {}", stats.unique_domains);
    println!("  Content fingerprints: {}", stats.fingerprints);
    println!();

    if !stats.pending_by_domain.is_empty() {
        println!("Pending by Domain:");
        for (domain, count) in &stats.pending_by_domain {
            println!("  {}: {}", domain, count);
        }
        println!();
    }

    println!(
        "Completion: {:.1}% ({} / {} URLs completed)",
        stats.completion_rate(),
        stats.completed,
        stats.total_urls
    );
}
