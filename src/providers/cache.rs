//! Loaded page content, keyed by resolved relative path.
//!
//! Owned by one provider and touched only from the I/O context, so it is a
//! plain map. Entries are written once and never evicted.

use std::collections::HashMap;

use bytes::Bytes;

use crate::observability::metrics;

#[derive(Debug, Default)]
pub struct ContentCache {
    entries: HashMap<String, Bytes>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached bytes for `path`. Records a hit or miss.
    pub fn get(&self, path: &str) -> Option<Bytes> {
        let found = self.entries.get(path).cloned();
        metrics::record_cache(found.is_some());
        found
    }

    /// Store bytes for `path` unless already present; returns what is cached.
    pub fn insert(&mut self, path: impl Into<String>, content: Bytes) -> Bytes {
        self.entries.entry(path.into()).or_insert(content).clone()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
