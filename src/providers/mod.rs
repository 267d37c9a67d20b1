//! Resource providers.
//!
//! # Data Flow
//! ```text
//! ResourceRequest
//!     → chain.rs (providers ordered by priority, then registration)
//!     → pages.rs (bundled pages: index.rs + cache.rs)
//!     → dump.rs (diagnostic request dumps)
//!     → directory.rs (static data under a URL prefix)
//!     → Return: first ResourceResponse, or None (not intercepted)
//! ```
//!
//! # Design Decisions
//! - Chain is built once at startup, then only resolves
//! - First match wins; a declining provider never errors
//! - Providers own their state; `&mut self` because every call happens on
//!   the single I/O context

pub mod cache;
pub mod chain;
pub mod directory;
pub mod dump;
pub mod index;
pub mod pages;

use std::path::{Component, Path};

use crate::resource::{ResourceRequest, ResourceResponse};

pub use cache::ContentCache;
pub use chain::ProviderChain;
pub use directory::DirectoryProvider;
pub use dump::RequestDumpProvider;
pub use index::PageIndex;
pub use pages::StaticPageProvider;

/// A unit that can answer a request without going to the network.
pub trait Provider: Send {
    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Claim the request by returning a response, or decline with `None`.
    fn handle(&mut self, request: &ResourceRequest) -> Option<ResourceResponse>;
}

/// Bytes served for claimed files that turned out empty or unreadable.
/// Engines mishandle zero-length synthetic responses.
pub(crate) const PLACEHOLDER_BODY: &[u8] = b" ";

/// Whether `relative` is a plain `a/b/c` path: no empty, `.` or `..`
/// segments, no root and no backslashes. Only such paths are joined onto a
/// provider's base directory.
pub(crate) fn is_contained(relative: &str) -> bool {
    !relative.is_empty()
        && !relative.contains('\\')
        && relative
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
        && Path::new(relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}
