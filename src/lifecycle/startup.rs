//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration and append startup meta rules
//! - Register providers in their fixed order
//! - Assemble the I/O context
//!
//! # Design Decisions
//! - Fail fast: config errors are fatal
//! - Providers never fail to build; missing directories only mean they
//!   decline everything

use std::path::Path;

use crate::config::{self, ConfigError, ShellConfig};
use crate::providers::{DirectoryProvider, ProviderChain, RequestDumpProvider, StaticPageProvider};
use crate::rewrite::{FilterFactory, InjectionSender, RuleSet};
use crate::runtime::IoContext;

/// Priority of the page and dump providers.
pub const PAGES_PRIORITY: i32 = 0;

/// Priority of the static data directory provider.
pub const DIRECTORY_PRIORITY: i32 = 100;

/// Load `path` (or defaults), append startup meta rules and validate the
/// result.
pub fn prepare_config(path: Option<&Path>) -> Result<ShellConfig, ConfigError> {
    let mut config = load_or_default(path)?;
    finish_config(&mut config)?;
    Ok(config)
}

/// Parse the config file as written, or defaults without one. Enough to
/// set up logging before the startup page is read.
pub fn load_or_default(path: Option<&Path>) -> Result<ShellConfig, ConfigError> {
    match path {
        Some(path) => config::load_config(path),
        None => Ok(ShellConfig::default()),
    }
}

/// Append startup meta rules and validate the merged config.
pub fn finish_config(config: &mut ShellConfig) -> Result<(), ConfigError> {
    config::apply_startup_meta(config)?;
    config::validation::validate_config(config).map_err(ConfigError::Validation)
}

/// Build the provider chain: pages, then dumps, then static data.
pub fn register_providers(config: &ShellConfig) -> ProviderChain {
    let content = &config.content;
    let mut chain = ProviderChain::new();

    chain.add(
        Box::new(StaticPageProvider::new(
            content.pages_path(),
            content.debug,
            RuleSet::from_config(&config.rules.redirect),
        )),
        PAGES_PRIORITY,
        None,
    );
    chain.add(Box::new(RequestDumpProvider::new()), PAGES_PRIORITY, None);
    chain.add(
        Box::new(DirectoryProvider::new(
            content.data_prefix.clone(),
            content.data_path(),
        )),
        DIRECTORY_PRIORITY,
        None,
    );

    tracing::info!(providers = ?chain.names(), "Provider chain registered");
    chain
}

pub fn build_filter_factory(config: &ShellConfig, injector: InjectionSender) -> FilterFactory {
    FilterFactory::new(
        RuleSet::from_config(&config.rules.replace),
        config.content.pages_path(),
        config.content.debug,
        injector,
    )
}

/// Everything the I/O context owns, ready to spawn.
pub fn build_io_context(config: &ShellConfig, injector: InjectionSender) -> IoContext {
    IoContext::new(
        register_providers(config),
        build_filter_factory(config, injector),
        config.filter.output_capacity,
    )
}
