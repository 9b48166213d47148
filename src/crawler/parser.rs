//! HTML extraction collaborator
//!
//! This module turns a fetched payload into:
//! - The page's visible text, for length checks and fingerprinting
//! - The outbound links worth considering for the frontier

use scraper::{Html, Node, Selector};
use thiserror::Error;
use url::Url;

/// Elements whose text is never part of the visible page
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// How many leading bytes are sniffed for binary content
const SNIFF_LEN: usize = 1024;

/// Failure to turn a payload into text and links
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("payload is empty")]
    Empty,

    #[error("payload looks binary, not HTML")]
    Binary,

    #[error("invalid selector: {0}")]
    Selector(String),
}

/// Text and links pulled from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Absolute http(s) URLs, in document order
    pub links: Vec<String>,

    /// Visible text, whitespace collapsed to single spaces
    pub text: String,
}

/// Extracts text and candidate links from a payload
pub trait Extract: Send + Sync + 'static {
    fn extract(&self, html: &[u8], base_url: &Url) -> Result<Extracted, ExtractError>;
}

/// scraper-backed extraction collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl Extract for HtmlExtractor {
    fn extract(&self, html: &[u8], base_url: &Url) -> Result<Extracted, ExtractError> {
        parse_html(html, base_url)
    }
}

/// Parses HTML content and extracts its visible text and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// **Note:** `rel="nofollow"` links are followed
///
/// # Arguments
///
/// * `html` - Raw payload, decoded lossily as UTF-8
/// * `base_url` - The base URL for resolving relative links
///
/// # Returns
///
/// * `Ok(Extracted)` - Successfully parsed page
/// * `Err(ExtractError)` - The payload is empty or is not markup
///
/// # Example
///
/// ```
/// use anteater::crawler::parse_html;
/// use url::Url;
///
/// let html = br#"<html><body><p>Hello</p><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://www.ics.uci.edu/").unwrap();
/// let page = parse_html(html, &base_url).unwrap();
/// assert_eq!(page.links, vec!["https://www.ics.uci.edu/page".to_string()]);
/// assert_eq!(page.text, "Hello Link");
/// ```
pub fn parse_html(html: &[u8], base_url: &Url) -> Result<Extracted, ExtractError> {
    if html.iter().all(u8::is_ascii_whitespace) {
        return Err(ExtractError::Empty);
    }

    if html.iter().take(SNIFF_LEN).any(|&b| b == 0) {
        return Err(ExtractError::Binary);
    }

    let source = String::from_utf8_lossy(html);
    let document = Html::parse_document(&source);

    let text = extract_text(&document);
    let links = extract_links(&document, base_url)?;

    Ok(Extracted { links, text })
}

/// Collects visible text nodes, joined by single spaces
fn extract_text(document: &Html) -> String {
    let mut words: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });

        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Result<Vec<String>, ExtractError> {
    let selector =
        Selector::parse("a[href]").map_err(|e| ExtractError::Selector(e.to_string()))?;

    let links = document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect();

    Ok(links)
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only and empty hrefs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    matches!(absolute_url.scheme(), "http" | "https").then(|| absolute_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://www.ics.uci.edu/page").unwrap()
    }

    fn parse(html: &str) -> Extracted {
        parse_html(html.as_bytes(), &base_url()).unwrap()
    }

    #[test]
    fn test_extract_visible_text() {
        let page = parse(
            r#"<html><head><title>ICS</title></head>
               <body><h1>Welcome</h1>
               <p>Donald   Bren
               School</p></body></html>"#,
        );
        assert_eq!(page.text, "ICS Welcome Donald Bren School");
    }

    #[test]
    fn test_hidden_elements_excluded() {
        let page = parse(
            r#"<html><head><style>body { color: red }</style>
               <script>var x = 1;</script></head>
               <body><noscript>enable js</noscript><p>Visible</p></body></html>"#,
        );
        assert_eq!(page.text, "Visible");
    }

    #[test]
    fn test_extract_absolute_link() {
        let page = parse(r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#);
        assert_eq!(page.links, vec!["https://other.com/page".to_string()]);
    }

    #[test]
    fn test_extract_relative_link() {
        let page = parse(r#"<html><body><a href="/other">Link</a></body></html>"#);
        assert_eq!(page.links, vec!["https://www.ics.uci.edu/other".to_string()]);
    }

    #[test]
    fn test_extract_relative_path_link() {
        let page = parse(r#"<html><body><a href="other">Link</a></body></html>"#);
        assert_eq!(page.links, vec!["https://www.ics.uci.edu/other".to_string()]);
    }

    #[test]
    fn test_skip_special_schemes() {
        let page = parse(
            r#"<html><body>
               <a href="javascript:void(0)">a</a>
               <a href="JavaScript:void(0)">b</a>
               <a href="mailto:test@uci.edu">c</a>
               <a href="tel:+1234567890">d</a>
               <a href="data:text/html,<h1>Test</h1>">e</a>
               <a href="ftp://files.uci.edu/">f</a>
               </body></html>"#,
        );
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_skip_download_link() {
        let page = parse(r#"<html><body><a href="/file.pdf" download>Download</a></body></html>"#);
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_skip_fragment_only() {
        let page = parse(r##"<html><body><a href="#section">Jump</a></body></html>"##);
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_follow_nofollow_links() {
        let page = parse(r#"<html><body><a href="/page" rel="nofollow">Link</a></body></html>"#);
        assert_eq!(page.links, vec!["https://www.ics.uci.edu/page".to_string()]);
    }

    #[test]
    fn test_links_in_document_order() {
        let page = parse(
            r#"<html><body>
               <a href="/page1">Link 1</a>
               <a href="/page2">Link 2</a>
               <a href="https://other.com/page3">Link 3</a>
               </body></html>"#,
        );
        assert_eq!(
            page.links,
            vec![
                "https://www.ics.uci.edu/page1".to_string(),
                "https://www.ics.uci.edu/page2".to_string(),
                "https://other.com/page3".to_string(),
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let mut html = b"<html><body><p>caf".to_vec();
        html.push(0xE9);
        html.extend_from_slice(b"</p></body></html>");

        let page = parse_html(&html, &base_url()).unwrap();
        assert!(page.text.starts_with("caf"));
    }

    #[test]
    fn test_empty_payload_fails() {
        assert!(matches!(
            parse_html(b"  \n ", &base_url()),
            Err(ExtractError::Empty)
        ));
    }

    #[test]
    fn test_binary_payload_fails() {
        assert!(matches!(
            parse_html(&[0x89, b'P', b'N', b'G', 0, 0, 0, 13], &base_url()),
            Err(ExtractError::Binary)
        ));
    }

    #[test]
    fn test_html_extractor_delegates() {
        let extracted = HtmlExtractor
            .extract(b"<p>hi</p><a href=\"/x\">x</a>", &base_url())
            .unwrap();
        assert_eq!(extracted.text, "hi x");
        assert_eq!(extracted.links, vec!["https://www.ics.uci.edu/x".to_string()]);
    }
}
