//! Inbound resource request.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::resource::mime;

/// Host-supplied MIME lookup, keyed by the full request URL.
pub type MimeResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Ordered header multimap with case-insensitive lookup.
///
/// Names keep the casing the host gave them; duplicates are preserved in
/// arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name` in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// One part of an upload body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyElement {
    /// Raw bytes posted by the page.
    Bytes(Vec<u8>),
    /// A file the engine will stream from disk.
    File(PathBuf),
}

/// Immutable view of a request made by the rendering engine.
#[derive(Clone)]
pub struct ResourceRequest {
    url: Url,
    method: String,
    headers: HeaderList,
    body: Option<Vec<BodyElement>>,
    mime_resolver: MimeResolver,
}

impl ResourceRequest {
    /// Create a GET request with no headers, using the extension-based
    /// MIME fallback.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: "GET".to_string(),
            headers: HeaderList::new(),
            body: None,
            mime_resolver: Arc::new(mime::from_url),
        }
    }

    /// Parse `url` and create a GET request.
    pub fn get(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(url)?))
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderList) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: Vec<BodyElement>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_mime_resolver(mut self, resolver: MimeResolver) -> Self {
        self.mime_resolver = resolver;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn body(&self) -> Option<&[BodyElement]> {
        self.body.as_deref()
    }

    /// MIME type the host associates with this request's URL.
    pub fn mime_type(&self) -> String {
        (self.mime_resolver)(self.url.as_str())
    }
}

impl fmt::Debug for ResourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRequest")
            .field("url", &self.url.as_str())
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}
