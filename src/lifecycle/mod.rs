//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging → Append startup meta rules → Validate
//!     → Register providers (page index built here) → Spawn contexts
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Exit
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then providers, then listeners
//! - Registration finishes before the first request is resolved

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{
    build_filter_factory, build_io_context, finish_config, load_or_default, prepare_config,
    register_providers,
};
