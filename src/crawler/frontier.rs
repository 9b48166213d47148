//! Durable crawl frontier
//!
//! The frontier owns everything that decides what gets crawled next:
//! - The durable store, the system of record for every URL ever seen
//! - The in-memory pending queue, rebuilt from the store on restart
//! - The set of URLs handed to workers and not yet completed
//! - Recorded content fingerprints
//! - The per-domain access clock
//!
//! The store, queue, claims and fingerprints sit behind one coarse lock so they
//! always agree on what exists and what is done. The domain clock has its own
//! lock. When both are needed the ledger lock is taken first.

use crate::config::Config;
use crate::dedup::SimHash;
use crate::state::DomainClock;
use crate::storage::{open_store, StorageResult, Store, UrlRecord};
use crate::url::{domain_of, hash_key, UrlFilter};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Longest single sleep inside `next_url`
const POLL_STEP: Duration = Duration::from_millis(50);

/// Most queue entries inspected per politeness pass
const MAX_CANDIDATES: usize = 256;

/// State guarded by the coarse frontier lock
struct Ledger {
    store: Box<dyn Store>,
    pending: VecDeque<String>,
    claimed: HashSet<String>,
    fingerprints: HashMap<String, SimHash>,
}

impl Ledger {
    /// Inserts an unseen canonical URL into the store and the queue
    ///
    /// Returns false if the URL's hash key is already known. Once `put`
    /// succeeds the URL is queued, even if the following `sync` fails.
    fn insert(&mut self, canonical_url: &str) -> StorageResult<bool> {
        let record = UrlRecord::new(canonical_url);
        if self.store.contains(&record.hash_key)? {
            return Ok(false);
        }

        self.store.put(&record)?;
        self.pending.push_back(record.canonical_url);
        self.store.sync()?;
        Ok(true)
    }

    fn is_near_duplicate(&self, fingerprint: SimHash, threshold: u32) -> bool {
        self.fingerprints
            .values()
            .any(|existing| existing.is_near(fingerprint, threshold))
    }

    fn record_fingerprint(&mut self, key: String, fingerprint: SimHash) -> StorageResult<()> {
        if self.fingerprints.contains_key(&key) {
            return Ok(());
        }

        self.store.put_fingerprint(&key, fingerprint)?;
        self.store.sync()?;
        self.fingerprints.insert(key, fingerprint);
        Ok(())
    }
}

/// Outcome of one pass over the pending queue
enum Attempt {
    /// A URL cleared politeness and is now claimed
    Ready(String),
    /// Every inspected candidate is waiting on its domain clock
    Wait(Duration),
    /// The queue is empty
    Idle { in_flight: bool },
}

/// Shared crawl frontier
///
/// One instance is shared by every worker through an `Arc`. All methods take
/// `&self`; no lock is ever held across an await point.
pub struct Frontier {
    ledger: Mutex<Ledger>,
    clock: Mutex<DomainClock>,
    filter: UrlFilter,
    poll_timeout: Duration,
}

impl Frontier {
    /// Creates an empty frontier over `store`
    ///
    /// Nothing is loaded until [`Frontier::initialize`] runs.
    ///
    /// # Arguments
    ///
    /// * `store` - Durable store backing the frontier
    /// * `filter` - Canonicalizer and validator for the configured scope
    /// * `politeness_interval` - Minimum spacing between URLs of one domain
    /// * `poll_timeout` - How long the frontier must stay quiescent before
    ///   `next_url` gives up
    pub fn new<S: Store + 'static>(
        store: S,
        filter: UrlFilter,
        politeness_interval: Duration,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                store: Box::new(store),
                pending: VecDeque::new(),
                claimed: HashSet::new(),
                fingerprints: HashMap::new(),
            }),
            clock: Mutex::new(DomainClock::new(politeness_interval)),
            filter,
            poll_timeout,
        }
    }

    /// Opens the configured SQLite store and initializes a frontier over it
    ///
    /// # Arguments
    ///
    /// * `config` - Full crawler configuration
    /// * `restart` - Discard the store and start again from the seeds
    ///
    /// # Returns
    ///
    /// * `Ok(Frontier)` - Frontier ready to hand out URLs
    /// * `Err(CrawlError)` - The store could not be opened or scanned
    pub fn open(config: &Config, restart: bool) -> crate::Result<Self> {
        let path = Path::new(&config.storage.save_file);
        let store = open_store(path)?;
        tracing::info!("Opened frontier store at {}", path.display());

        let frontier = Self::new(
            store,
            UrlFilter::new(&config.scope),
            config.crawler.politeness_interval(),
            config.crawler.poll_timeout(),
        );
        frontier.initialize(&config.crawler.seeds, restart)?;
        Ok(frontier)
    }

    /// Loads the pending queue from the store, or seeds it
    ///
    /// With `restart` the store is emptied and the seeds are enqueued. Without
    /// it every incomplete record that still passes the validator is queued
    /// and recorded fingerprints are reloaded; if that leaves the queue empty
    /// the seeds are enqueued as well.
    pub fn initialize(&self, seeds: &[String], restart: bool) -> StorageResult<()> {
        let mut ledger = self.lock_ledger();
        ledger.pending.clear();
        ledger.claimed.clear();
        ledger.fingerprints.clear();

        if restart {
            ledger.store.clear()?;
            ledger.store.sync()?;
            tracing::info!("Restart requested, discarded existing frontier");
        } else {
            let mut completed = 0usize;
            let mut discarded = 0usize;

            for record in ledger.store.records()? {
                if record.completed {
                    completed += 1;
                } else if self.filter.is_valid(&record.canonical_url) {
                    ledger.pending.push_back(record.canonical_url);
                } else {
                    discarded += 1;
                }
            }

            ledger.fingerprints = ledger.store.fingerprints()?.into_iter().collect();

            tracing::info!(
                "Recovered frontier: {} pending, {} completed, {} no longer valid, {} fingerprints",
                ledger.pending.len(),
                completed,
                discarded,
                ledger.fingerprints.len()
            );
        }

        if ledger.pending.is_empty() {
            let mut seeded = 0usize;
            for seed in seeds {
                match self.filter.canonicalize(seed) {
                    Ok(canonical) => {
                        if ledger.insert(canonical.as_str())? {
                            seeded += 1;
                        }
                    }
                    Err(e) => tracing::warn!("Skipping seed {}: {}", seed, e),
                }
            }
            tracing::info!("Seeded frontier with {} URLs", seeded);
        }

        Ok(())
    }

    /// Adds a URL to the frontier if its canonical form has never been seen
    ///
    /// The URL is not validated here; callers filter discovered links first.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A new record was persisted and queued
    /// * `Ok(false)` - The URL was already known or could not be canonicalized
    /// * `Err(StorageError)` - The store rejected the write
    pub fn enqueue(&self, url: &str) -> StorageResult<bool> {
        let canonical = match self.filter.canonicalize(url) {
            Ok(canonical) => canonical,
            Err(e) => {
                tracing::debug!("Not enqueuing {}: {}", url, e);
                return Ok(false);
            }
        };

        self.lock_ledger().insert(canonical.as_str())
    }

    /// Hands out the next URL whose domain is clear of the politeness interval
    ///
    /// Candidates that are too soon for their domain go back to the tail of
    /// the queue. Returns `None` once the queue has been empty, with no URL
    /// claimed by any worker, for the whole poll timeout.
    pub async fn next_url(&self) -> Option<String> {
        let mut quiet_since: Option<Instant> = None;

        loop {
            match self.try_next() {
                Attempt::Ready(url) => return Some(url),
                Attempt::Wait(wait) => {
                    quiet_since = None;
                    tokio::time::sleep(wait.min(POLL_STEP)).await;
                }
                Attempt::Idle { in_flight: true } => {
                    quiet_since = None;
                    tokio::time::sleep(POLL_STEP).await;
                }
                Attempt::Idle { in_flight: false } => {
                    let since = *quiet_since.get_or_insert_with(Instant::now);
                    let elapsed = since.elapsed();
                    if elapsed >= self.poll_timeout {
                        return None;
                    }
                    tokio::time::sleep((self.poll_timeout - elapsed).min(POLL_STEP)).await;
                }
            }
        }
    }

    fn try_next(&self) -> Attempt {
        let mut ledger = self.lock_ledger();
        let mut shortest_wait: Option<Duration> = None;
        let candidates = ledger.pending.len().min(MAX_CANDIDATES);

        for _ in 0..candidates {
            let Some(url) = ledger.pending.pop_front() else {
                break;
            };
            let domain = domain_of(&url).unwrap_or_default();

            // The access is stamped only once both locks are held
            let mut clock = self.lock_clock();
            match clock.try_acquire(&domain, Instant::now()) {
                Ok(()) => {
                    ledger.claimed.insert(hash_key(&url));
                    tracing::trace!("Handing out {}", url);
                    return Attempt::Ready(url);
                }
                Err(wait) => {
                    ledger.pending.push_back(url);
                    shortest_wait = Some(shortest_wait.map_or(wait, |w| w.min(wait)));
                }
            }
        }

        match shortest_wait {
            Some(wait) => Attempt::Wait(wait),
            None => Attempt::Idle {
                in_flight: !ledger.claimed.is_empty(),
            },
        }
    }

    /// Marks a URL as done so it is never handed out again
    ///
    /// A URL missing from the store is logged and inserted as completed.
    pub fn mark_complete(&self, url: &str) -> StorageResult<()> {
        let canonical = self
            .filter
            .canonicalize(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        let record = UrlRecord::completed(canonical);

        let mut ledger = self.lock_ledger();
        ledger.claimed.remove(&record.hash_key);

        if !ledger.store.contains(&record.hash_key)? {
            tracing::warn!(
                "Completed URL {} was not in the frontier store, inserting it",
                record.canonical_url
            );
        }

        ledger.store.put(&record)?;
        ledger.store.sync()
    }

    /// True if any recorded fingerprint lies strictly within `threshold` bits
    pub fn is_near_duplicate(&self, fingerprint: SimHash, threshold: u32) -> bool {
        self.lock_ledger().is_near_duplicate(fingerprint, threshold)
    }

    /// Associates a fingerprint with a URL; the first one recorded wins
    pub fn record_fingerprint(&self, url: &str, fingerprint: SimHash) -> StorageResult<()> {
        let key = self.key_of(url);
        self.lock_ledger().record_fingerprint(key, fingerprint)
    }

    /// Checks for a near-duplicate and records the fingerprint in one step
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The page is new content; its fingerprint is now recorded
    /// * `Ok(false)` - The page is a near-duplicate; nothing was recorded
    pub fn admit_fingerprint(
        &self,
        url: &str,
        fingerprint: SimHash,
        threshold: u32,
    ) -> StorageResult<bool> {
        let key = self.key_of(url);
        let mut ledger = self.lock_ledger();

        if ledger.is_near_duplicate(fingerprint, threshold) {
            return Ok(false);
        }

        ledger.record_fingerprint(key, fingerprint)?;
        Ok(true)
    }

    /// The filter used for canonicalization and link validation
    pub fn filter(&self) -> &UrlFilter {
        &self.filter
    }

    /// Looks up the durable record for a URL
    pub fn record(&self, url: &str) -> StorageResult<Option<UrlRecord>> {
        let key = self.key_of(url);
        self.lock_ledger().store.get(&key)
    }

    /// URLs queued and not yet handed out
    pub fn pending(&self) -> Vec<String> {
        self.lock_ledger().pending.iter().cloned().collect()
    }

    pub fn pending_len(&self) -> usize {
        self.lock_ledger().pending.len()
    }

    /// Number of URLs handed out and not yet marked complete
    pub fn in_flight(&self) -> usize {
        self.lock_ledger().claimed.len()
    }

    fn key_of(&self, url: &str) -> String {
        match self.filter.canonicalize(url) {
            Ok(canonical) => hash_key(canonical.as_str()),
            Err(_) => hash_key(url),
        }
    }

    fn lock_ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_clock(&self) -> MutexGuard<'_, DomainClock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
