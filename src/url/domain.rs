use url::Url;

/// Extracts the politeness domain of a URL
///
/// The host is lowercased; the port is ignored so that every port on a host
/// shares one access clock.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use anteater::url::extract_domain;
///
/// let url = Url::parse("https://WWW.ICS.UCI.EDU/about").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.ics.uci.edu".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a URL string and extracts its domain, returning None on any failure
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_domain)
}
