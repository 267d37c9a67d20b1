//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Reject rules that can never be meaningful (empty patterns)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ShellConfig → Result<(), Vec<ValidationError>>
//! - Malformed regexes are NOT rejected here; they are logged and skipped
//!   at match time so one bad rule never blocks startup

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{RuleConfig, ShellConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("content.app_path must not be empty")]
    EmptyAppPath,
    #[error("{field}: `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("rules.{kind}[{index}] has an empty pattern")]
    EmptyPattern { kind: &'static str, index: usize },
    #[error("content.data_prefix `{0}` is not an absolute URL")]
    InvalidDataPrefix(String),
    #[error("observability.log_format must be `pretty` or `json`, got `{0}`")]
    InvalidLogFormat(String),
}

pub fn validate_config(config: &ShellConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.content.app_path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyAppPath);
    }
    if url::Url::parse(&config.content.data_prefix).is_err() {
        errors.push(ValidationError::InvalidDataPrefix(
            config.content.data_prefix.clone(),
        ));
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if let Some(upstream) = &config.upstream {
        check_address(&mut errors, "upstream.address", &upstream.address);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_body_size" });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "listener.request_timeout_secs" });
    }
    if config.filter.output_capacity == 0 {
        errors.push(ValidationError::Zero { field: "filter.output_capacity" });
    }

    check_rules(&mut errors, "redirect", &config.rules.redirect);
    check_rules(&mut errors, "replace", &config.rules.replace);

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::InvalidLogFormat(other.to_string())),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_rules(errors: &mut Vec<ValidationError>, kind: &'static str, rules: &[RuleConfig]) {
    for (index, rule) in rules.iter().enumerate() {
        if rule.pattern.is_empty() {
            errors.push(ValidationError::EmptyPattern { kind, index });
        }
    }
}
