//! The UI context: executes injections in the page.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::rewrite::{Injection, InjectionSender};

/// Host hook that runs JavaScript in the page scripting context.
pub trait ScriptSink: Send + 'static {
    fn execute(&mut self, code: &str, url: &str);
}

/// Sink for hosts without a scripting context: logs what would run.
#[derive(Debug, Default)]
pub struct LoggingSink;

impl ScriptSink for LoggingSink {
    fn execute(&mut self, code: &str, url: &str) {
        tracing::info!(url = %url, bytes = code.len(), "Injection ready for page");
        tracing::trace!(code = %code, "Injection code");
    }
}

/// Task draining injections into a [`ScriptSink`].
pub struct UiContext {
    task: JoinHandle<()>,
}

impl UiContext {
    /// Start the UI task on the current Tokio runtime. Filters post through
    /// the returned sender; the task ends when every sender is dropped.
    pub fn spawn<S: ScriptSink>(mut sink: S) -> (Self, InjectionSender) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Injection>();
        let task = tokio::spawn(async move {
            while let Some(injection) = rx.recv().await {
                sink.execute(&injection.code(), injection.url());
            }
            tracing::debug!("UI context stopped");
        });
        (Self { task }, tx)
    }

    /// Wait until every injection posted so far has run and all senders
    /// are gone.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "UI context task failed");
        }
    }
}
