//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::meta::StartupMeta;
use crate::config::schema::ShellConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ShellConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ShellConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Append rules declared in the startup page to `config`.
///
/// A missing startup page is not an error; there is simply nothing to add.
pub fn apply_startup_meta(config: &mut ShellConfig) -> Result<Option<StartupMeta>, ConfigError> {
    if !config.content.load_startup_meta {
        return Ok(None);
    }
    let path = config.content.startup_page_path();
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "No startup page, skipping meta rules");
        return Ok(None);
    }

    let html = fs::read_to_string(&path)?;
    let meta = StartupMeta::parse(&html);
    config.rules.redirect.extend(meta.redirect.iter().cloned());
    config.rules.replace.extend(meta.replace.iter().cloned());

    tracing::info!(
        path = %path.display(),
        redirect = meta.redirect.len(),
        replace = meta.replace.len(),
        "Startup meta rules loaded"
    );
    Ok(Some(meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;

    #[test]
    fn test_load_config_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.toml");
        fs::write(&path, "[listener]\nbind_address = \"not an address\"\n").unwrap();

        match load_config(&path) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.toml");
        fs::write(&path, "[content\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_startup_meta_appended_after_config_rules() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("page");
        fs::create_dir_all(&pages).unwrap();
        fs::write(
            pages.join("startup.html"),
            r#"<html><head>
            <meta name="replace|world" content="planet">
            <meta name="redirect|example.com/index.html" content="example.com/home">
            </head></html>"#,
        )
        .unwrap();

        let mut config = ShellConfig::default();
        config.content.app_path = dir.path().to_path_buf();
        config.rules.replace.push(RuleConfig::new("hello", "hi"));

        let meta = apply_startup_meta(&mut config).unwrap().unwrap();
        assert_eq!(meta.replace.len(), 1);
        assert_eq!(
            config.rules.replace,
            vec![RuleConfig::new("hello", "hi"), RuleConfig::new("planet", "world")]
        );
        assert_eq!(
            config.rules.redirect,
            vec![RuleConfig::new("example.com/home", "example.com/index.html")]
        );
    }

    #[test]
    fn test_missing_startup_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ShellConfig::default();
        config.content.app_path = dir.path().to_path_buf();
        assert!(apply_startup_meta(&mut config).unwrap().is_none());
    }
}
