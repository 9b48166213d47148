//! HTTP fetch collaborator
//!
//! Workers only see the [`Fetch`] trait; [`HttpFetcher`] is the reqwest-backed
//! implementation used by the binary. Tests substitute their own fetchers.

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Most redirects followed for one request
const MAX_REDIRECTS: usize = 10;

/// Transport-level fetch failure
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// Raw payload of a response
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub content: Vec<u8>,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
}

/// A fetched page, whatever its status
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub raw: RawResponse,
}

impl Response {
    /// Builds a response with a body and no headers
    pub fn new(status: u16, content: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            raw: RawResponse {
                content: content.into(),
                headers: HashMap::new(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_len(&self) -> usize {
        self.raw.content.len()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw
            .headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Fetches one URL
///
/// Any transport failure is an `Err`; a non-success status is still an `Ok`
/// response and is judged by the caller.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Response, FetchError>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use anteater::config::UserAgentConfig;
/// use anteater::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "anteater".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed fetch collaborator
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Response, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let content = response.bytes().await?.to_vec();

        Ok(Response {
            status,
            raw: RawResponse { content, headers },
        })
    }
}
