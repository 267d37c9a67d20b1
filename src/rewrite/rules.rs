//! Case-insensitive regex rules.
//!
//! Used twice: Redirect Rules rewrite a normalized request path before
//! lookup, Replace Rules rewrite response bodies inside the filter.
//!
//! Replacement strings use `$N` for capture groups. `$N` is always group
//! `N`, even when letters or `_` follow it (`$1abc` is group 1 then `abc`).
//! `$$` is a literal `$`.

use std::borrow::Cow;

use regex::{bytes, Regex, RegexBuilder};
use thiserror::Error;

use crate::config::RuleConfig;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A single compiled (pattern, replacement) pair.
#[derive(Debug)]
pub struct Rule {
    pattern: String,
    replacement: String,
    /// `replacement` with every `$N` braced as `${N}`.
    expansion: String,
    /// Unanchored byte form, used for find/replace on bodies.
    search: Result<bytes::Regex, RuleError>,
    /// `^(?:pattern)$`, used for whole-path redirects.
    whole: Option<Regex>,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let replacement = replacement.into();
        let search = compile_bytes(&pattern);
        let whole = search
            .as_ref()
            .ok()
            .and_then(|_| compile(&format!("^(?:{pattern})$")).ok());

        if let Err(e) = &search {
            tracing::warn!(error = %e, "Rule will be skipped");
        }

        Self {
            pattern,
            expansion: brace_groups(&replacement),
            replacement,
            search,
            whole,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn is_valid(&self) -> bool {
        self.search.is_ok()
    }

    pub fn error(&self) -> Option<&RuleError> {
        self.search.as_ref().err()
    }
}

fn compile(pattern: &str) -> Result<Regex, RuleError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| invalid(pattern, source))
}

fn compile_bytes(pattern: &str) -> Result<bytes::Regex, RuleError> {
    bytes::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| invalid(pattern, source))
}

fn invalid(pattern: &str, source: regex::Error) -> RuleError {
    RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    }
}

/// Rewrite `$N` as `${N}` so a following letter or `_` is never read as
/// part of a group name. Named groups and `$$` pass through.
fn brace_groups(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                out.push_str("$$");
                chars.next();
            }
            Some(d) if d.is_ascii_digit() => {
                out.push_str("${");
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    out.push(d);
                }
                out.push('}');
            }
            _ => out.push('$'),
        }
    }
    out
}

/// Ordered rule list.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile rules from configuration, keeping their order.
    pub fn from_config(configs: &[RuleConfig]) -> Self {
        Self::new(
            configs
                .iter()
                .map(|c| Rule::new(c.pattern.clone(), c.replacement.clone()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Rewrite `path` with the first rule matching it entirely.
    ///
    /// Returns `None` when no rule matches.
    pub fn redirect(&self, path: &str) -> Option<String> {
        for rule in &self.rules {
            let Some(whole) = &rule.whole else {
                skip(rule, "redirect");
                continue;
            };
            if whole.is_match(path) {
                let target = whole.replace(path, rule.expansion.as_str()).into_owned();
                tracing::debug!(from = %path, to = %target, pattern = %rule.pattern, "Redirect rule matched");
                return Some(target);
            }
        }
        None
    }

    /// Apply every rule in order, each replacing all of its
    /// non-overlapping matches left to right.
    ///
    /// Works on raw bytes; bytes no rule matches come back unchanged,
    /// whatever the body's encoding.
    pub fn replace_all<'a>(&self, body: &'a [u8]) -> Cow<'a, [u8]> {
        let mut content = Cow::Borrowed(body);
        for rule in &self.rules {
            match &rule.search {
                Ok(re) => {
                    let replaced = match re.replace_all(&content, rule.expansion.as_bytes()) {
                        Cow::Owned(replaced) => Some(replaced),
                        Cow::Borrowed(_) => None,
                    };
                    if let Some(replaced) = replaced {
                        content = Cow::Owned(replaced);
                    }
                }
                Err(_) => skip(rule, "replace"),
            }
        }
        content
    }
}

fn skip(rule: &Rule, kind: &'static str) {
    if let Some(e) = rule.error() {
        tracing::debug!(error = %e, kind, "Skipping invalid rule");
    }
    metrics::record_rule_error(kind);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_sequential_non_overlapping() {
        let rules = RuleSet::new(vec![Rule::new("foo", "bar")]);
        assert_eq!(rules.replace_all(b"foofoo").as_ref(), b"barbar");
    }

    #[test]
    fn test_replace_is_case_insensitive_and_ordered() {
        let rules = RuleSet::new(vec![Rule::new("Hello", "hi"), Rule::new("hi there", "bye")]);
        assert_eq!(rules.replace_all(b"HELLO there").as_ref(), b"bye");
    }

    #[test]
    fn test_replace_capture_groups() {
        let rules = RuleSet::new(vec![Rule::new(r"v(\d+)", "version-$1")]);
        assert_eq!(
            rules.replace_all(b"v1 and v22").as_ref(),
            b"version-1 and version-22"
        );
    }

    #[test]
    fn test_invalid_rule_is_skipped() {
        let rules = RuleSet::new(vec![Rule::new("(unclosed", "x"), Rule::new("a", "b")]);
        assert!(!rules.iter().next().unwrap().is_valid());
        assert_eq!(rules.replace_all(b"aaa").as_ref(), b"bbb");
        assert_eq!(rules.redirect("a"), Some("b".to_string()));
    }

    #[test]
    fn test_redirect_requires_whole_match() {
        let rules = RuleSet::new(vec![
            Rule::new(r"old\.example\.com/(.*)", "example.com/legacy/$1"),
            Rule::new(r".*\.html", "never.html"),
        ]);
        assert_eq!(
            rules.redirect("OLD.example.com/a.html").as_deref(),
            Some("example.com/legacy/a.html")
        );
        // Partial match does not count.
        assert_eq!(rules.redirect("x/old.example.com/a.css"), None);
        assert_eq!(rules.redirect("b.html").as_deref(), Some("never.html"));
    }

    #[test]
    fn test_redirect_first_match_wins() {
        let rules = RuleSet::new(vec![Rule::new("a.*", "first"), Rule::new("ab", "second")]);
        assert_eq!(rules.redirect("ab").as_deref(), Some("first"));
    }

    #[test]
    fn test_group_followed_by_word_chars() {
        let rules = RuleSet::new(vec![Rule::new(r"v(\d+)", "$1_x$1abc$$")]);
        assert_eq!(rules.replace_all(b"v7").as_ref(), b"7_x7abc$");
        assert_eq!(rules.redirect("v7").as_deref(), Some("7_x7abc$"));
    }

    #[test]
    fn test_brace_groups() {
        assert_eq!(brace_groups("$1abc"), "${1}abc");
        assert_eq!(brace_groups("$12 ${name} $$ $"), "${12} ${name} $$ $");
        assert_eq!(brace_groups("$name"), "$name");
    }

    #[test]
    fn test_unmatched_non_utf8_bytes_untouched() {
        let rules = RuleSet::new(vec![Rule::new("zzz", "y"), Rule::new("caf", "CAF")]);
        assert_eq!(rules.replace_all(b"<p>caf\xe9</p>").as_ref(), b"<p>CAF\xe9</p>");
        assert!(matches!(
            RuleSet::new(vec![Rule::new("zzz", "y")]).replace_all(b"\xff\xfe"),
            Cow::Borrowed(_)
        ));
    }
}
