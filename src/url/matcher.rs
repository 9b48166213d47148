/// Checks whether a host falls under a root domain
///
/// A root domain admits itself and every subdomain at any depth. The match is
/// label-aligned, so `ics.uci.edu` does not admit `physics.uci.edu`.
///
/// # Examples
///
/// ```
/// use anteater::url::matches_domain;
///
/// assert!(matches_domain("ics.uci.edu", "ics.uci.edu"));
/// assert!(matches_domain("ics.uci.edu", "www.ics.uci.edu"));
/// assert!(matches_domain("ics.uci.edu", "a.b.ics.uci.edu"));
/// assert!(!matches_domain("ics.uci.edu", "physics.uci.edu"));
/// ```
pub fn matches_domain(root: &str, host: &str) -> bool {
    if root.is_empty() {
        return false;
    }

    match host.strip_suffix(root) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}
