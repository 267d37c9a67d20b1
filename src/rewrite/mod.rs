//! Response rewriting and script injection.
//!
//! # Data Flow
//! ```text
//! upstream response (url, mime)
//!     → filter.rs (eligibility, per-response ResponseFilter)
//!     → rules.rs (replace rules over the chunk text)
//!     → bytes relayed to the host
//!     → inject.rs (Injection message posted to the UI context)
//! ```
//!
//! # Design Decisions
//! - The filter is created per response and precomputes the injection
//!   script location once
//! - Each invocation consumes its whole chunk and treats it as the complete
//!   text; rules spanning two chunks are not rewritten
//! - Injection is fire-and-forget: the I/O side never waits on the UI side

pub mod filter;
pub mod inject;
pub mod rules;

pub use filter::{is_filterable, FilterFactory, FilterOutcome, FilterStatus, ResponseFilter};
pub use inject::{Injection, InjectionSender};
pub use rules::{Rule, RuleError, RuleSet};
