//! Site key resolution.
//!
//! # Data Flow
//! ```text
//! request host ("www.example.co.uk:8443")
//!     → strip port
//!     → split labels
//!     → site key ("example.co.uk")
//!
//! Consumers:
//!     → providers/pages.rs (bundled page subfolder)
//!     → rewrite/filter.rs (injection script lookup)
//! ```
//!
//! # Design Decisions
//! - Heuristic split, no public suffix list
//! - One function for both call sites so page lookup and script lookup
//!   always agree on the folder
//! - Empty key means "no site-specific resource", never an error

pub mod site_key;

pub use site_key::{script_candidates, script_path, site_key, strip_port};
