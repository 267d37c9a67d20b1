//! Static files under a URL prefix.
//!
//! `https://localhost/app/main.js` with prefix `https://localhost/` maps to
//! `<dir>/app/main.js`. No index, no cache: the directory is read per request.

use std::fs;
use std::path::PathBuf;

use bytes::Bytes;

use crate::providers::{is_contained, Provider, PLACEHOLDER_BODY};
use crate::resource::{ResourceRequest, ResourceResponse};

pub struct DirectoryProvider {
    prefix: String,
    dir: PathBuf,
}

impl DirectoryProvider {
    pub fn new(prefix: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self {
            prefix,
            dir: dir.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn relative<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = url.strip_prefix(self.prefix.as_str())?;
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        if !is_contained(rest) {
            return None;
        }
        Some(rest)
    }
}

impl Provider for DirectoryProvider {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn handle(&mut self, request: &ResourceRequest) -> Option<ResourceResponse> {
        let relative = self.relative(request.url().as_str())?;
        let path = self.dir.join(relative);
        if !path.is_file() {
            return None;
        }

        let body = match fs::read(&path) {
            Ok(content) if !content.is_empty() => Bytes::from(content),
            Ok(_) => Bytes::from_static(PLACEHOLDER_BODY),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Data file unreadable");
                Bytes::from_static(PLACEHOLDER_BODY)
            }
        };
        Some(ResourceResponse::ok(request.mime_type(), body))
    }
}
