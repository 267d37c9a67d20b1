//! Rules declared as `<meta>` tags in the startup page.
//!
//! ```html
//! <meta name="replace|REPLACEMENT" content="PATTERN">
//! <meta name="redirect|REPLACEMENT" content="PATTERN">
//! ```
//!
//! Tags of any other kind are collected for the host untouched.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::config::RuleConfig;

static META_TAG: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r#"<meta\s+name\s*=\s*"([^"]+)"\s+content\s*=\s*"([^"]*)""#)
        .case_insensitive(true)
        .build()
        .expect("meta tag pattern is valid")
});

/// Parsed startup metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupMeta {
    /// Every tag by name, last one wins.
    pub entries: BTreeMap<String, String>,
    pub redirect: Vec<RuleConfig>,
    pub replace: Vec<RuleConfig>,
}

impl StartupMeta {
    pub fn parse(html: &str) -> Self {
        let mut meta = Self::default();

        for caps in META_TAG.captures_iter(html) {
            let name = &caps[1];
            let value = &caps[2];
            meta.entries.insert(name.to_string(), value.to_string());

            let mut parts = name.split('|');
            let (Some(kind), Some(arg)) = (parts.next(), parts.next()) else {
                continue;
            };
            match kind {
                "redirect" => meta.redirect.push(RuleConfig::new(value, arg)),
                "replace" => meta.replace.push(RuleConfig::new(value, arg)),
                _ => {}
            }
        }

        meta
    }

    /// Value of a `KIND|NAME` entry, e.g. `cli|url`.
    pub fn get(&self, kind: &str, name: &str) -> Option<&str> {
        self.entries.get(&format!("{kind}|{name}")).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <!DOCTYPE html>
        <html><head>
          <META NAME="cli|url" CONTENT="https://app.example.com/">
          <meta name="replace|https://cdn.local/" content="https://cdn\.example\.com/">
          <meta name="replace|" content="tracker\.js">
          <meta name="redirect|example.com/index.html" content="www\.example\.com/home">
          <meta name="viewport" content="width=device-width">
        </head></html>
    "#;

    #[test]
    fn test_rules_in_document_order() {
        let meta = StartupMeta::parse(PAGE);
        assert_eq!(
            meta.replace,
            vec![
                RuleConfig::new(r"https://cdn\.example\.com/", "https://cdn.local/"),
                RuleConfig::new(r"tracker\.js", ""),
            ]
        );
        assert_eq!(
            meta.redirect,
            vec![RuleConfig::new(r"www\.example\.com/home", "example.com/index.html")]
        );
    }

    #[test]
    fn test_other_entries_kept() {
        let meta = StartupMeta::parse(PAGE);
        assert_eq!(meta.get("cli", "url"), Some("https://app.example.com/"));
        assert_eq!(
            meta.entries.get("viewport").map(String::as_str),
            Some("width=device-width")
        );
    }

    #[test]
    fn test_no_meta() {
        assert_eq!(StartupMeta::parse("<html></html>"), StartupMeta::default());
    }
}
