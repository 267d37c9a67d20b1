//! Dev host subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace, timeout, body limit)
//!     → request.rs (absolute URL, HeaderList, body elements)
//!     → IoHandle::resolve (provider chain on the I/O thread)
//!         claimed   → response.rs → client
//!         unclaimed → upstream (hyper-util client)
//!                   → IoHandle::filter_body (one chunk)
//!                   → client
//! ```
//!
//! # Design Decisions
//! - The host never touches providers directly; everything goes through
//!   the I/O context
//! - Upstream bodies are buffered whole so the filter sees one chunk

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_url, to_resource_request, MakeRequestUuid, X_REQUEST_ID};
pub use response::into_http_response;
pub use server::{HttpServer, ServerError};
