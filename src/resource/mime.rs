//! Extension based MIME fallback.
//!
//! Hosts normally supply their own resolver; this table covers what a bundle
//! of web pages typically contains.

use url::Url;

const TABLE: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("xml", "text/xml"),
    ("txt", "text/plain"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("wasm", "application/wasm"),
    ("pdf", "application/pdf"),
];

const DEFAULT: &str = "application/octet-stream";

/// MIME type for a URL path's extension.
///
/// Directory-style paths (empty or trailing `/`) are served as `index.html`
/// and therefore map to `text/html`.
pub fn from_path(path: &str) -> &'static str {
    let last = path.rsplit('/').next().unwrap_or_default();
    if last.is_empty() {
        return "text/html";
    }
    let Some((_, ext)) = last.rsplit_once('.') else {
        return "text/html";
    };
    TABLE
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT)
}

/// Default [`MimeResolver`](crate::resource::MimeResolver) implementation.
pub fn from_url(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    from_path(&path).to_string()
}
