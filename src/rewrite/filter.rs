//! Per-response rewrite filter.
//!
//! # Responsibilities
//! - Decide which responses are filtered at all
//! - Relay each chunk, rewriting it when replace rules exist
//! - Post the site's injection script (HTML) or a body event (JSON/XML)
//!   to the UI context
//!
//! # Design Decisions
//! - Construction never fails; a missing script only disables injection
//! - Every call consumes the whole input chunk and reports `Done`
//! - Output larger than the destination is cut at its capacity

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::domain;
use crate::observability::metrics;
use crate::rewrite::{Injection, InjectionSender, RuleSet};

/// MIME fragments that make a response eligible for filtering.
const FILTERED_MIME: [&str; 5] = ["html", "json", "xml", "javascript", "text"];

/// Result signal of one filter invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStatus {
    /// The chunk was fully processed.
    Done,
    /// More destination space is needed before input can be consumed.
    NeedMoreOutput,
    /// Filtering failed; the host should abort the response.
    Error,
}

/// What one invocation consumed and produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOutcome {
    pub status: FilterStatus,
    pub consumed: usize,
    pub written: usize,
}

/// Whether a response with this URL and MIME type gets a filter.
pub fn is_filterable(url: &str, mime: &str) -> bool {
    url.get(..4).is_some_and(|s| s.eq_ignore_ascii_case("http"))
        && FILTERED_MIME.iter().any(|m| mime.contains(m))
}

/// Creates filters for eligible responses. Owned by the I/O context.
pub struct FilterFactory {
    replace: Arc<RuleSet>,
    script_root: PathBuf,
    debug: bool,
    injector: InjectionSender,
}

impl FilterFactory {
    pub fn new(
        replace: RuleSet,
        script_root: impl Into<PathBuf>,
        debug: bool,
        injector: InjectionSender,
    ) -> Self {
        Self {
            replace: Arc::new(replace),
            script_root: script_root.into(),
            debug,
            injector,
        }
    }

    /// A filter for this response, or `None` if it passes through untouched.
    pub fn create(&self, url: &str, mime: &str) -> Option<ResponseFilter> {
        if !is_filterable(url, mime) {
            return None;
        }
        Some(ResponseFilter::new(
            url,
            mime,
            self.replace.clone(),
            &self.script_root,
            self.debug,
            self.injector.clone(),
        ))
    }
}

/// Relays one response body.
pub struct ResponseFilter {
    url: String,
    mime: String,
    script: Option<PathBuf>,
    script_exists: bool,
    rules: Arc<RuleSet>,
    injector: InjectionSender,
}

impl ResponseFilter {
    pub fn new(
        url: &str,
        mime: &str,
        rules: Arc<RuleSet>,
        script_root: &Path,
        debug: bool,
        injector: InjectionSender,
    ) -> Self {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let candidates = domain::script_candidates(script_root, &host);
        let existing = candidates.iter().find(|p| p.is_file()).cloned();
        let script_exists = existing.is_some();
        let script = existing.or_else(|| candidates.last().cloned());

        if debug {
            tracing::info!(url = %url, mime = %mime, "Filter attached");
            tracing::info!(
                script = ?script,
                exists = script_exists,
                "Injection script resolved"
            );
        }

        Self {
            url: url.to_string(),
            mime: mime.to_string(),
            script,
            script_exists,
            rules,
            injector,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Injection script location probed at construction.
    pub fn script_path(&self) -> Option<&Path> {
        self.script.as_deref()
    }

    pub fn has_script(&self) -> bool {
        self.script_exists
    }

    /// Process one chunk into `output`.
    pub fn filter(&mut self, input: &[u8], output: &mut [u8]) -> FilterOutcome {
        let consumed = input.len();
        let mut written = consumed.min(output.len());
        if written == 0 {
            return FilterOutcome {
                status: FilterStatus::Done,
                consumed,
                written,
            };
        }

        let chunk = &input[..written];
        if self.rules.is_empty() {
            output[..written].copy_from_slice(chunk);
            if self.script_exists {
                self.inject(trim(chunk));
            }
        } else {
            let content = self.rules.replace_all(trim(chunk));
            if content.len() > output.len() {
                tracing::warn!(
                    url = %self.url,
                    rewritten = content.len(),
                    capacity = output.len(),
                    "Rewritten chunk truncated to destination capacity"
                );
            }
            written = content.len().min(output.len());
            output[..written].copy_from_slice(&content[..written]);
            if self.script_exists {
                self.inject(&content);
            }
        }

        metrics::record_filtered_bytes(written);
        FilterOutcome {
            status: FilterStatus::Done,
            consumed,
            written,
        }
    }

    /// Filter a whole body as one chunk with a destination of at least
    /// `capacity` bytes.
    pub fn relay(&mut self, body: &[u8], capacity: usize) -> Vec<u8> {
        let mut output = vec![0u8; capacity.max(body.len())];
        let outcome = self.filter(body, &mut output);
        output.truncate(outcome.written);
        output
    }

    fn inject(&self, content: &[u8]) {
        let injection = if self.mime.contains("html") {
            let Some(path) = &self.script else { return };
            match fs::read_to_string(path) {
                Ok(source) => Injection::Script {
                    url: self.url.clone(),
                    source,
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Injection script unreadable");
                    return;
                }
            }
        } else if self.mime.contains("json") || self.mime.contains("xml") {
            Injection::event(self.url.clone(), &String::from_utf8_lossy(content))
        } else {
            return;
        };

        let kind = injection.kind();
        tracing::debug!(url = %self.url, kind, "Posting injection");
        if self.injector.send(injection).is_err() {
            tracing::debug!(url = %self.url, "UI context closed, injection dropped");
            return;
        }
        metrics::record_injection(kind);
    }
}

fn trim(chunk: &[u8]) -> &[u8] {
    let keep = |b: &u8| !matches!(b, b'\r' | b'\n' | b'\t' | b' ');
    let start = chunk.iter().position(keep).unwrap_or(chunk.len());
    let end = chunk.iter().rposition(keep).map_or(start, |i| i + 1);
    &chunk[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::Rule;
    use tokio::sync::mpsc;

    struct Fixture {
        dir: tempfile::TempDir,
        rx: mpsc::UnboundedReceiver<Injection>,
        tx: InjectionSender,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let script_dir = dir.path().join("example.com/script");
            fs::create_dir_all(&script_dir).unwrap();
            fs::write(script_dir.join("inject.js"), "window.injected = true;").unwrap();
            let (tx, rx) = mpsc::unbounded_channel();
            Self { dir, rx, tx }
        }

        fn factory(&self, rules: Vec<Rule>) -> FilterFactory {
            FilterFactory::new(RuleSet::new(rules), self.dir.path(), false, self.tx.clone())
        }
    }

    #[test]
    fn test_eligibility() {
        assert!(is_filterable("https://a.test/", "text/html"));
        assert!(is_filterable("http://a.test/x", "application/json; charset=utf-8"));
        assert!(is_filterable("HTTPS://a.test/x", "application/javascript"));
        assert!(!is_filterable("https://a.test/x.png", "image/png"));
        assert!(!is_filterable("file:///x.html", "text/html"));
        assert!(!is_filterable("ws", "text/html"));
    }

    #[test]
    fn test_passthrough_without_rules_or_script() {
        let mut fx = Fixture::new();
        let mut filter = fx.factory(vec![]).create("https://other.org/app.js", "application/javascript").unwrap();
        assert!(!filter.has_script());

        let input = b"  let x = 1;\n";
        let mut output = [0u8; 64];
        let outcome = filter.filter(input, &mut output);

        assert_eq!(outcome, FilterOutcome { status: FilterStatus::Done, consumed: input.len(), written: input.len() });
        assert_eq!(&output[..outcome.written], input);
        assert!(fx.rx.try_recv().is_err());
    }

    #[test]
    fn test_output_bounded_by_capacity() {
        let fx = Fixture::new();
        let mut filter = fx.factory(vec![]).create("https://other.org/", "text/plain").unwrap();
        let mut output = [0u8; 4];
        let outcome = filter.filter(b"abcdefgh", &mut output);
        assert_eq!(outcome.consumed, 8);
        assert_eq!(outcome.written, 4);
        assert_eq!(&output, b"abcd");
    }

    #[test]
    fn test_replace_rules_rewrite_trimmed_chunk() {
        let fx = Fixture::new();
        let mut filter = fx
            .factory(vec![Rule::new("foo", "bar")])
            .create("https://other.org/", "text/plain")
            .unwrap();
        let out = filter.relay(b"\r\n foofoo \t", 64);
        assert_eq!(out, b"barbar");
    }

    #[test]
    fn test_non_utf8_body_survives_unmatched_rules() {
        let fx = Fixture::new();
        let mut filter = fx
            .factory(vec![Rule::new("zzz", "y")])
            .create("https://other.org/", "text/html; charset=iso-8859-1")
            .unwrap();
        assert_eq!(filter.relay(b"<p>caf\xe9</p>", 64), b"<p>caf\xe9</p>");
    }

    #[test]
    fn test_non_utf8_json_event_is_decoded_lossily() {
        let mut fx = Fixture::new();
        let mut filter = fx
            .factory(vec![Rule::new("x", "y")])
            .create("https://example.com/feed", "application/json")
            .unwrap();
        assert_eq!(filter.relay(b"x\xff", 0), b"y\xff");
        assert_eq!(
            fx.rx.try_recv().unwrap(),
            Injection::event("https://example.com/feed", "y\u{fffd}")
        );
    }

    #[test]
    fn test_trim_bytes() {
        assert_eq!(trim(b" \r\n a b\t"), b"a b");
        assert_eq!(trim(b" \t "), b"");
        assert_eq!(trim(b"\xe9"), b"\xe9");
    }

    #[test]
    fn test_html_schedules_site_script() {
        let mut fx = Fixture::new();
        let mut filter = fx.factory(vec![]).create("https://www.example.com/", "text/html").unwrap();
        assert!(filter.has_script());
        assert!(filter.script_path().unwrap().ends_with("example.com/script/inject.js"));

        let out = filter.relay(b"<html></html>", 0);
        assert_eq!(out, b"<html></html>");
        assert_eq!(
            fx.rx.try_recv().unwrap(),
            Injection::Script {
                url: "https://www.example.com/".into(),
                source: "window.injected = true;".into(),
            }
        );
    }

    #[test]
    fn test_json_dispatches_rewritten_event() {
        let mut fx = Fixture::new();
        let mut filter = fx
            .factory(vec![Rule::new("secret", "***")])
            .create("https://api.example.com/v1/me", "application/json")
            .unwrap();

        let out = filter.relay(br#" {"token":"secret"} "#, 0);
        assert_eq!(out, br#"{"token":"***"}"#);

        let injection = fx.rx.try_recv().unwrap();
        assert_eq!(injection, Injection::event("https://api.example.com/v1/me", r#"{"token":"***"}"#));
    }

    #[test]
    fn test_text_mime_with_script_does_not_inject() {
        let mut fx = Fixture::new();
        let mut filter = fx.factory(vec![]).create("https://example.com/a.txt", "text/plain").unwrap();
        assert!(filter.has_script());
        filter.relay(b"hello", 0);
        assert!(fx.rx.try_recv().is_err());
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut fx = Fixture::new();
        let mut filter = fx.factory(vec![]).create("https://example.com/", "text/html").unwrap();
        let mut output = [0u8; 8];
        let outcome = filter.filter(b"", &mut output);
        assert_eq!(outcome.written, 0);
        assert!(fx.rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_ui_context_is_ignored() {
        let fx = Fixture::new();
        let factory = fx.factory(vec![]);
        drop(fx.rx);
        let mut filter = factory.create("https://example.com/", "text/html").unwrap();
        assert_eq!(filter.relay(b"ok", 0), b"ok");
    }

    #[test]
    fn test_ineligible_response_gets_no_filter() {
        let fx = Fixture::new();
        assert!(fx.factory(vec![]).create("https://example.com/a.png", "image/png").is_none());
    }
}
