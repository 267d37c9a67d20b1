//! Local content resolution and streaming rewrite pipeline for a browser
//! shell.

pub mod config;
pub mod domain;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod providers;
pub mod resource;
pub mod rewrite;
pub mod runtime;

pub use config::schema::ShellConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use providers::{Provider, ProviderChain};
pub use resource::{ResourceRequest, ResourceResponse};
pub use rewrite::{FilterFactory, ResponseFilter};
pub use runtime::{IoContext, IoHandle, UiContext};
