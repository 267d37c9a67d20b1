//! Startup index of bundled pages.

use std::collections::HashSet;
use std::path::Path;

use walkdir::WalkDir;

/// Relative paths (always `/`-separated) of every file under a base
/// directory. Built once, immutable afterwards.
#[derive(Debug, Default, Clone)]
pub struct PageIndex {
    pages: HashSet<String>,
}

impl PageIndex {
    /// Walk `base` recursively. A missing or unreadable base yields an
    /// empty index; unreadable entries are skipped.
    pub fn build(base: &Path) -> Self {
        if !base.is_dir() {
            tracing::warn!(base = %base.display(), "Pages directory missing, index is empty");
            return Self::default();
        }

        let mut pages = HashSet::new();
        for entry in WalkDir::new(base).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(base) {
                if let Some(key) = to_key(relative) {
                    pages.insert(key);
                }
            }
        }

        tracing::info!(base = %base.display(), pages = pages.len(), "Page index built");
        Self { pages }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.pages.contains(path)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Sorted listing, for diagnostics.
    pub fn sorted(&self) -> Vec<&str> {
        let mut pages: Vec<&str> = self.pages.iter().map(String::as_str).collect();
        pages.sort_unstable();
        pages
    }
}

fn to_key(relative: &Path) -> Option<String> {
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    parts.map(|p| p.join("/"))
}

impl FromIterator<String> for PageIndex {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}
