//! Host-facing request and response views.
//!
//! # Data Flow
//! ```text
//! host engine request (url, method, headers, body)
//!     → request.rs (immutable ResourceRequest)
//!     → providers (claim or decline)
//!     → response.rs (synthetic ResourceResponse)
//!     → host engine
//! ```
//!
//! # Design Decisions
//! - Headers arrive pre-parsed; no HTTP parsing happens here
//! - MIME resolution is supplied by the host, mime.rs is only a fallback
//! - Bodies are `Bytes` so cached content is shared, not copied

pub mod mime;
pub mod request;
pub mod response;

pub use request::{BodyElement, HeaderList, MimeResolver, ResourceRequest};
pub use response::ResourceResponse;
