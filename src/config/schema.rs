//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the shell.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the resource shell.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShellConfig {
    /// Bundled content locations and lookup mode.
    pub content: ContentConfig,

    /// Redirect and replace rules.
    pub rules: RulesConfig,

    /// Dev host listener.
    pub listener: ListenerConfig,

    /// Optional upstream for requests no provider claims.
    pub upstream: Option<UpstreamConfig>,

    /// Rewrite filter settings.
    pub filter: FilterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Where bundled content lives and how it is looked up.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Application root; page and data directories are relative to it.
    pub app_path: PathBuf,

    /// Debug mode: look pages up on disk per request instead of a
    /// startup index, and log filter decisions.
    pub debug: bool,

    /// Bundled pages directory, relative to `app_path`.
    pub pages_dir: String,

    /// Static data directory, relative to `app_path`.
    pub data_dir: String,

    /// URL prefix served from `data_dir`.
    pub data_prefix: String,

    /// Page carrying `<meta>` rules, relative to `pages_dir`.
    pub startup_page: String,

    /// Read additional rules from the startup page.
    pub load_startup_meta: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            app_path: PathBuf::from("."),
            debug: false,
            pages_dir: "page".to_string(),
            data_dir: "data".to_string(),
            data_prefix: "https://localhost/".to_string(),
            startup_page: "startup.html".to_string(),
            load_startup_meta: true,
        }
    }
}

impl ContentConfig {
    /// Base directory for bundled pages and injection scripts.
    pub fn pages_path(&self) -> PathBuf {
        self.app_path.join(&self.pages_dir)
    }

    /// Base directory for the static data provider.
    pub fn data_path(&self) -> PathBuf {
        self.app_path.join(&self.data_dir)
    }

    pub fn startup_page_path(&self) -> PathBuf {
        self.pages_path().join(&self.startup_page)
    }
}

/// Ordered rule lists.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RulesConfig {
    /// Applied to normalized request paths; first match wins.
    pub redirect: Vec<RuleConfig>,

    /// Applied to filtered response text; all rules run in order.
    pub replace: Vec<RuleConfig>,
}

/// A (pattern, replacement) pair. Patterns are case-insensitive regexes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleConfig {
    pub pattern: String,
    pub replacement: String,
}

impl RuleConfig {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Maximum request and buffered response body size in bytes.
    pub max_body_size: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_body_size: 8 * 1024 * 1024, // 8MB
            request_timeout_secs: 30,
        }
    }
}

/// Upstream the dev host forwards unclaimed requests to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Scheme reported to the filter for forwarded responses.
    #[serde(default = "default_upstream_scheme")]
    pub scheme: String,
}

fn default_upstream_scheme() -> String {
    "http".to_string()
}

/// Rewrite filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Destination buffer size offered to the filter. The buffer is never
    /// smaller than the body being filtered.
    pub output_capacity: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            output_capacity: 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
