//! Bundled page provider.
//!
//! # Responsibilities
//! - Normalize a request URL to a relative page path
//! - Apply redirect rules to that path
//! - Find the page on disk (debug) or in the startup index (release),
//!   retrying under the host's site key
//! - Serve cached bytes in release mode, reading each page at most once
//!
//! # Design Decisions
//! - Declines anything it cannot find; never errors
//! - `devtools://` is never served from the bundle
//! - Found-but-empty files are served as a single space

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use url::Url;

use crate::domain;
use crate::providers::{is_contained, ContentCache, PageIndex, Provider, PLACEHOLDER_BODY};
use crate::resource::{ResourceRequest, ResourceResponse};
use crate::rewrite::RuleSet;

const INDEX_PAGE: &str = "index.html";

enum Lookup {
    /// Check the filesystem on every request.
    Disk,
    /// Check the startup index, serve through the cache.
    Indexed { index: PageIndex, cache: ContentCache },
}

pub struct StaticPageProvider {
    base: PathBuf,
    redirect: RuleSet,
    lookup: Lookup,
}

impl StaticPageProvider {
    /// Create a provider over `base`. Release mode (`debug == false`)
    /// walks `base` now to build the page index.
    pub fn new(base: impl Into<PathBuf>, debug: bool, redirect: RuleSet) -> Self {
        let base = base.into();
        let lookup = if debug {
            Lookup::Disk
        } else {
            Lookup::Indexed {
                index: PageIndex::build(&base),
                cache: ContentCache::new(),
            }
        };
        Self {
            base,
            redirect,
            lookup,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn is_debug(&self) -> bool {
        matches!(self.lookup, Lookup::Disk)
    }

    /// Startup index; `None` in debug mode.
    pub fn index(&self) -> Option<&PageIndex> {
        match &self.lookup {
            Lookup::Indexed { index, .. } => Some(index),
            Lookup::Disk => None,
        }
    }

    /// Content cache; `None` in debug mode.
    pub fn cache(&self) -> Option<&ContentCache> {
        match &self.lookup {
            Lookup::Indexed { cache, .. } => Some(cache),
            Lookup::Disk => None,
        }
    }

    /// Relative page path for `url` after redirect rules, before lookup.
    pub fn page_path(&self, url: &Url) -> String {
        let page = normalize(url);
        self.redirect.redirect(&page).unwrap_or(page)
    }

    fn find(&mut self, page: &str) -> Option<Bytes> {
        let candidates = candidates(page);
        match &mut self.lookup {
            Lookup::Disk => {
                let found = candidates
                    .into_iter()
                    .find(|c| self.base.join(c).is_file())?;
                Some(read_or_empty(&self.base.join(&found)))
            }
            Lookup::Indexed { index, cache } => {
                let found = candidates.into_iter().find(|c| index.contains(c))?;
                if let Some(bytes) = cache.get(&found) {
                    return Some(bytes);
                }
                let path = self.base.join(&found);
                match fs::read(&path) {
                    Ok(content) => Some(cache.insert(found, Bytes::from(content))),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Indexed page unreadable");
                        Some(Bytes::new())
                    }
                }
            }
        }
    }
}

impl Provider for StaticPageProvider {
    fn name(&self) -> &'static str {
        "pages"
    }

    fn handle(&mut self, request: &ResourceRequest) -> Option<ResourceResponse> {
        let url = request.url();
        if url.scheme() == "devtools" {
            return None;
        }

        let page = self.page_path(url);
        if !is_contained(&page) {
            tracing::debug!(page = %page, "Rejecting page path outside the pages directory");
            return None;
        }

        let mut body = self.find(&page)?;
        if body.is_empty() {
            body = Bytes::from_static(PLACEHOLDER_BODY);
        }

        Some(ResourceResponse::ok(request.mime_type(), body))
    }
}

/// `scheme://host:port/a/b/?q#f` becomes `host/a/b/index.html`.
///
/// The port never reaches the page path. A bare host maps to its index page.
pub fn normalize(url: &Url) -> String {
    let mut page = match url.host_str() {
        Some(host) => format!("{host}{}", url.path()),
        None => url.path().trim_start_matches('/').to_string(),
    };
    if page.ends_with('/') {
        page.push_str(INDEX_PAGE);
    } else if !page.contains('/') {
        page.push('/');
        page.push_str(INDEX_PAGE);
    }
    page
}

/// The page itself, then the page with its host segment replaced by the
/// host's site key.
fn candidates(page: &str) -> Vec<String> {
    let mut out = vec![page.to_string()];
    if let Some((host, rest)) = page.split_once('/') {
        let key = domain::site_key(host);
        if !key.is_empty() && key != host {
            out.push(format!("{key}/{rest}"));
        }
    }
    out
}

fn read_or_empty(path: &Path) -> Bytes {
    match fs::read(path) {
        Ok(content) => Bytes::from(content),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Page unreadable");
            Bytes::new()
        }
    }
}
