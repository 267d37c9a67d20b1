//! Host to site key mapping.

use std::path::{Path, PathBuf};

/// Subdomain conventions collapsed away on three-label hosts.
const WELL_KNOWN_SUBDOMAINS: [&str; 4] = ["www", "ftp", "git", "raw"];

/// Labels at most this long are treated as part of the suffix.
const MAX_SUFFIX_LABEL_LEN: usize = 3;

/// Folder under a site directory holding its injection script.
pub const SCRIPT_DIR: &str = "script";

/// File name of the per-site injection script.
pub const SCRIPT_FILE: &str = "inject.js";

/// Remove a trailing `:port` from a host.
///
/// Only an all-digit suffix counts as a port, so bracketed IPv6 literals
/// without a port are left intact.
pub fn strip_port(host: &str) -> &str {
    match host.rfind(':') {
        Some(idx)
            if idx + 1 < host.len() && host[idx + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &host[..idx]
        }
        _ => host,
    }
}

/// Map a request host to its canonical site key.
///
/// ```
/// use resource_shell::domain::site_key;
///
/// assert_eq!(site_key("www.github.com"), "github.com");
/// assert_eq!(site_key("a.verylongname.io"), "verylongname.io");
/// assert_eq!(site_key("localhost:8080"), "localhost");
/// ```
pub fn site_key(host: &str) -> String {
    let host = strip_port(host);
    if host.is_empty() {
        return String::new();
    }

    let labels: Vec<&str> = host.split('.').collect();

    if labels.len() == 3 && WELL_KNOWN_SUBDOMAINS.contains(&labels[0]) {
        return format!("{}.{}", labels[1], labels[2]);
    }

    if labels.len() == 1 {
        return labels[0].to_string();
    }

    // Walk from the TLD towards the leftmost label. A long label only counts
    // as the registrable name once something has been collected behind it.
    let mut suffix: Vec<&str> = Vec::new();
    for label in labels.iter().rev() {
        if label.len() > MAX_SUFFIX_LABEL_LEN && !suffix.is_empty() {
            suffix.reverse();
            return format!("{}.{}", label, suffix.join("."));
        }
        suffix.push(label);
    }

    let n = labels.len();
    format!("{}.{}", labels[n - 2], labels[n - 1])
}

/// Expected injection script path for a host under `script_root`.
///
/// Returns `None` when the host yields an empty site key.
pub fn script_path(script_root: &Path, host: &str) -> Option<PathBuf> {
    let key = site_key(host);
    if key.is_empty() {
        return None;
    }
    Some(site_script(script_root, &key))
}

/// Script locations to probe for a host, most specific first.
///
/// The exact host folder wins over the site key folder so a bundle can
/// target one subdomain without affecting its siblings.
pub fn script_candidates(script_root: &Path, host: &str) -> Vec<PathBuf> {
    let exact = strip_port(host);
    let mut candidates = Vec::with_capacity(2);
    if !exact.is_empty() {
        candidates.push(site_script(script_root, exact));
    }
    if let Some(by_key) = script_path(script_root, host) {
        if !candidates.contains(&by_key) {
            candidates.push(by_key);
        }
    }
    candidates
}

fn site_script(script_root: &Path, folder: &str) -> PathBuf {
    script_root.join(folder).join(SCRIPT_DIR).join(SCRIPT_FILE)
}
