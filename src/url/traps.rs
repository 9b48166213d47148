//! Non-HTML resource and crawler-trap heuristics

use url::Url;

/// File extensions that never carry crawlable HTML
const BLOCKED_EXTENSIONS: &[&str] = &[
    // styles, scripts, images
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "svg", "webp",
    // audio / video
    "mid", "mp2", "mp3", "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv",
    "rm", "smil", "wmv", "swf", "wma",
    // documents
    "pdf", "ps", "eps", "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data",
    "dat", "epub", "rtf", "csv", "arff", "thmx", "mso", "odt", "ods", "odp",
    // archives, executables, disk images
    "exe", "bz2", "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "dll", "cnf", "tgz", "sha1",
    "jar", "zip", "rar", "gz", "apk", "deb", "rpm",
];

/// Returns true if the path ends in a blocked, non-HTML file extension
pub fn has_blocked_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((_, ext)) => BLOCKED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// Returns the pagination number of a URL, if it has one
///
/// Both `/page/<n>` path segments and a numeric `page=<n>` query parameter
/// count; when several are present the largest wins. A number too large for
/// `u64` reads as `u64::MAX`.
pub fn pagination_number(url: &Url) -> Option<u64> {
    let from_path = url.path_segments().and_then(|segments| {
        let segments: Vec<&str> = segments.collect();
        segments
            .windows(2)
            .filter(|pair| pair[0].eq_ignore_ascii_case("page"))
            .filter_map(|pair| page_value(pair[1]))
            .max()
    });

    let from_query = url
        .query_pairs()
        .filter(|(key, _)| key.eq_ignore_ascii_case("page"))
        .filter_map(|(_, value)| page_value(&value))
        .max();

    from_path.max(from_query)
}

fn page_value(s: &str) -> Option<u64> {
    if is_all_digits(s) {
        Some(s.parse().unwrap_or(u64::MAX))
    } else {
        None
    }
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Counts path segments consisting solely of ASCII digits
pub fn numeric_segment_count(url: &Url) -> usize {
    url.path_segments()
        .map(|segments| segments.filter(|s| is_all_digits(s)).count())
        .unwrap_or(0)
}
