use crate::UrlError;
use sha2::{Digest, Sha256};
use url::Url;

/// Produces the canonical form of a URL, used as the dedup key
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject any scheme other than http/https
/// 3. Require a host (the parser lowercases it and resolves dot segments)
/// 4. Remove the fragment
/// 5. Drop blocked query parameters (exact names, plus any `utm_*`)
/// 6. Sort the remaining parameters by name, then value
/// 7. Remove an empty query string
///
/// # Examples
///
/// ```
/// use anteater::url::canonicalize;
///
/// let blocked = vec!["share".to_string()];
/// let url = canonicalize("https://www.ics.uci.edu/a?b=2&share=x&a=1#top", &blocked).unwrap();
/// assert_eq!(url.as_str(), "https://www.ics.uci.edu/a?a=1&b=2");
/// ```
pub fn canonicalize(url_str: &str, blocked_params: &[String]) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url, blocked_params);

        if params.is_empty() {
            url.set_query(None);
        } else {
            let mut serializer = url.query_pairs_mut();
            serializer.clear();
            serializer.extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    Ok(url)
}

/// Computes the durable store key for a canonical URL
///
/// The key is the hex-encoded SHA-256 digest of the canonical string, so it is
/// stable across processes and platforms.
pub fn hash_key(canonical_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_url.as_bytes());
    hex::encode(hasher.finalize())
}

fn filter_and_sort_query_params(url: &Url, blocked_params: &[String]) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !key.is_empty() && !is_blocked_param(key, blocked_params))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_blocked_param(key: &str, blocked_params: &[String]) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || blocked_params.iter().any(|b| b.eq_ignore_ascii_case(&key))
}
