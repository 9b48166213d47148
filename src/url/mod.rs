//! URL handling module
//!
//! This module provides canonicalization, domain extraction, scope matching
//! and the trap heuristics that together decide whether a discovered link is
//! worth scheduling. Every check is a pure function; failures to parse are
//! reported as rejections, never as errors.

mod domain;
mod matcher;
mod normalize;
mod traps;

use crate::config::{HostException, ScopeConfig};
use crate::UrlResult;
use url::Url;

// Re-export main functions
pub use domain::{domain_of, extract_domain};
pub use matcher::matches_domain;
pub use normalize::{canonicalize, hash_key};
pub use traps::{has_blocked_extension, numeric_segment_count, pagination_number};

/// Reasons a URL is refused by the [`UrlFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Unparseable, or missing a host
    Malformed,
    /// Scheme other than http/https
    Scheme,
    /// Host outside the allowed domains and exceptions
    OutOfScope,
    /// Path names a non-HTML resource
    Extension,
    /// Pagination number above the configured cap
    PaginationTrap,
    /// Too many purely numeric path segments
    NumericTrap,
}

/// Scope-aware URL canonicalizer and validator
///
/// Built once from the [`ScopeConfig`] and shared by the frontier (for
/// canonical keys and the restart scan) and the workers (for link filtering).
#[derive(Debug, Clone)]
pub struct UrlFilter {
    allowed_domains: Vec<String>,
    exceptions: Vec<HostException>,
    blocked_query_params: Vec<String>,
    max_page_depth: u32,
    max_numeric_segments: usize,
}

impl UrlFilter {
    pub fn new(scope: &ScopeConfig) -> Self {
        Self {
            allowed_domains: scope
                .allowed_domains
                .iter()
                .map(|d| d.to_ascii_lowercase())
                .collect(),
            exceptions: scope
                .exceptions
                .iter()
                .map(|e| HostException {
                    host: e.host.to_ascii_lowercase(),
                    path_prefix: e.path_prefix.clone(),
                })
                .collect(),
            blocked_query_params: scope.blocked_query_params.clone(),
            max_page_depth: scope.max_page_depth,
            max_numeric_segments: scope.max_numeric_segments,
        }
    }

    /// Canonical form of `url` under this filter's blocked query parameters
    pub fn canonicalize(&self, url: &str) -> UrlResult<Url> {
        canonicalize(url, &self.blocked_query_params)
    }

    /// Returns true if the URL passes every scope, extension and trap rule
    pub fn is_valid(&self, url: &str) -> bool {
        self.check(url).is_ok()
    }

    /// Canonicalizes and validates a URL, naming the first rule it breaks
    pub fn check(&self, url: &str) -> Result<Url, Rejection> {
        let canonical = self.canonicalize(url).map_err(|e| match e {
            crate::UrlError::InvalidScheme(_) => Rejection::Scheme,
            _ => Rejection::Malformed,
        })?;

        let host = extract_domain(&canonical).ok_or(Rejection::Malformed)?;
        if !self.in_scope(&host, canonical.path()) {
            return Err(Rejection::OutOfScope);
        }

        if has_blocked_extension(canonical.path()) {
            return Err(Rejection::Extension);
        }

        if pagination_number(&canonical).is_some_and(|n| n > u64::from(self.max_page_depth)) {
            return Err(Rejection::PaginationTrap);
        }

        if numeric_segment_count(&canonical) > self.max_numeric_segments {
            return Err(Rejection::NumericTrap);
        }

        Ok(canonical)
    }

    fn in_scope(&self, host: &str, path: &str) -> bool {
        self.allowed_domains
            .iter()
            .any(|root| matches_domain(root, host))
            || self
                .exceptions
                .iter()
                .any(|e| e.host == host && path.starts_with(&e.path_prefix))
    }
}
