//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → meta.rs (append rules from the startup page)
//!     → ShellConfig (validated, immutable)
//!     → consumed once when the provider chain is registered
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the pipeline is built; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod meta;
pub mod schema;
pub mod validation;

pub use loader::{apply_startup_meta, load_config, ConfigError};
pub use meta::StartupMeta;
pub use schema::ShellConfig;
pub use schema::{
    ContentConfig, FilterConfig, ListenerConfig, ObservabilityConfig, RuleConfig, RulesConfig,
    UpstreamConfig,
};
pub use validation::ValidationError;
