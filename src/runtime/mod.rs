//! Execution contexts.
//!
//! # Data Flow
//! ```text
//! host tasks (any thread)
//!     → IoHandle (channel)
//!     → io.rs: one thread owns ProviderChain + FilterFactory
//!         → resolve / filter, reply over oneshot
//!         → Injection posted (unbounded, never blocks)
//!     → ui.rs: one task executes injections through a ScriptSink
//! ```
//!
//! # Design Decisions
//! - Provider state (page index, content cache) lives on one thread, so it
//!   needs no lock
//! - The I/O side never waits on the UI side

pub mod io;
pub mod ui;

use thiserror::Error;

pub use io::{IoContext, IoHandle};
pub use ui::{LoggingSink, ScriptSink, UiContext};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("execution context has shut down")]
    Closed,
    #[error("failed to start execution context: {0}")]
    Spawn(#[from] std::io::Error),
}
