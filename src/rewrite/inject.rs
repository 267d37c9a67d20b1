//! Messages from the rewrite filter to the page's scripting context.

use serde_json::Value;
use tokio::sync::mpsc;

/// Page-side entry point receiving JSON/XML response events.
pub const EVENT_ENTRY_POINT: &str = "eventCall";

/// Work for the UI context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    /// Run a site's injection script in the page that loaded `url`.
    Script { url: String, source: String },
    /// Deliver a response body to the page as `eventCall(url, payload)`.
    /// `payload` is already a JSON string literal.
    Event { url: String, payload: String },
}

impl Injection {
    /// Event for a response body.
    pub fn event(url: impl Into<String>, body: &str) -> Self {
        Self::Event {
            url: url.into(),
            payload: Value::String(body.to_string()).to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Script { .. } => "script",
            Self::Event { .. } => "event",
        }
    }

    /// URL the code runs against.
    pub fn url(&self) -> &str {
        match self {
            Self::Script { url, .. } | Self::Event { url, .. } => url,
        }
    }

    /// JavaScript to execute.
    pub fn code(&self) -> String {
        match self {
            Self::Script { source, .. } => source.clone(),
            Self::Event { url, payload } => {
                format!(
                    "{EVENT_ENTRY_POINT}({},{payload});",
                    Value::String(url.clone())
                )
            }
        }
    }
}

/// Sending half held by filters. Sending never blocks.
pub type InjectionSender = mpsc::UnboundedSender<Injection>;
