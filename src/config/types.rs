use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub content: ContentConfig,
    pub scope: ScopeConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URLs used to seed an empty frontier
    pub seeds: Vec<String>,

    /// Number of concurrent workers draining the frontier
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Minimum time between two requests to the same domain (milliseconds)
    #[serde(rename = "politeness-interval", default = "default_politeness_interval")]
    pub politeness_interval: u64,

    /// Per-worker sleep after each processed URL (milliseconds)
    #[serde(rename = "time-delay", default = "default_time_delay")]
    pub time_delay: u64,

    /// How long the frontier must stay idle before a worker gives up (milliseconds)
    #[serde(rename = "poll-timeout", default = "default_poll_timeout")]
    pub poll_timeout: u64,
}

impl CrawlerConfig {
    pub fn politeness_interval(&self) -> Duration {
        Duration::from_millis(self.politeness_interval)
    }

    pub fn time_delay(&self) -> Duration {
        Duration::from_millis(self.time_delay)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout)
    }
}

/// Thresholds applied to fetched payloads and their extracted text
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Smallest payload worth extracting (bytes)
    #[serde(rename = "min-content-size", default = "default_min_content_size")]
    pub min_content_size: usize,

    /// Largest payload the crawler will accept (bytes)
    #[serde(rename = "max-content-size", default = "default_max_content_size")]
    pub max_content_size: usize,

    /// Minimum extracted text length (characters)
    #[serde(rename = "min-text-length", default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Fingerprints closer than this many bits are near-duplicates
    #[serde(
        rename = "near-duplicate-threshold",
        default = "default_near_duplicate_threshold"
    )]
    pub near_duplicate_threshold: u32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            min_content_size: default_min_content_size(),
            max_content_size: default_max_content_size(),
            min_text_length: default_min_text_length(),
            near_duplicate_threshold: default_near_duplicate_threshold(),
        }
    }
}

/// Crawl scope and trap-avoidance configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Root domains; a host is in scope if it equals or is a subdomain of one
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Exact hosts admitted only under a path prefix
    #[serde(default, rename = "exception")]
    pub exceptions: Vec<HostException>,

    /// Navigation-only query parameters dropped during canonicalization
    #[serde(rename = "blocked-query-params", default = "default_blocked_query_params")]
    pub blocked_query_params: Vec<String>,

    /// Highest pagination number followed
    #[serde(rename = "max-page-depth", default = "default_max_page_depth")]
    pub max_page_depth: u32,

    /// Most purely numeric path segments a URL may carry
    #[serde(rename = "max-numeric-segments", default = "default_max_numeric_segments")]
    pub max_numeric_segments: usize,
}

impl ScopeConfig {
    /// Builds a scope over the given root domains with default trap limits
    pub fn new<I, S>(allowed_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_domains: allowed_domains.into_iter().map(Into::into).collect(),
            exceptions: Vec::new(),
            blocked_query_params: default_blocked_query_params(),
            max_page_depth: default_max_page_depth(),
            max_numeric_segments: default_max_numeric_segments(),
        }
    }
}

/// An out-of-scope host that is admitted under a single path prefix
#[derive(Debug, Clone, Deserialize)]
pub struct HostException {
    pub host: String,

    #[serde(rename = "path-prefix")]
    pub path_prefix: String,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Durable store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite file backing the frontier
    #[serde(rename = "save-file")]
    pub save_file: String,
}

fn default_workers() -> u32 {
    4
}

fn default_politeness_interval() -> u64 {
    500
}

fn default_time_delay() -> u64 {
    500
}

fn default_poll_timeout() -> u64 {
    1000
}

fn default_min_content_size() -> usize {
    200
}

fn default_max_content_size() -> usize {
    5_000_000
}

fn default_min_text_length() -> usize {
    200
}

fn default_near_duplicate_threshold() -> u32 {
    3
}

fn default_max_page_depth() -> u32 {
    50
}

fn default_max_numeric_segments() -> usize {
    3
}

pub(crate) fn default_blocked_query_params() -> Vec<String> {
    [
        // tracking
        "utm_source",
        "utm_medium",
        "utm_campaign",
        "utm_term",
        "utm_content",
        "fbclid",
        "gclid",
        "mc_eid",
        // navigation-only
        "share",
        "replytocom",
        "action",
        "do",
        "rev",
        "sid",
        "session",
        "ical",
        "outlook-ical",
        "tab_files",
        "tab_details",
        "redirect_to",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
