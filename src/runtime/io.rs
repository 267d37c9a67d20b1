//! The I/O context: sole owner of provider and filter state.

use std::thread;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::providers::ProviderChain;
use crate::resource::{ResourceRequest, ResourceResponse};
use crate::rewrite::FilterFactory;
use crate::runtime::ContextError;

/// Pending requests before senders wait.
const QUEUE_DEPTH: usize = 256;

enum Message {
    Resolve {
        request: Box<ResourceRequest>,
        reply: oneshot::Sender<Option<ResourceResponse>>,
    },
    Filter {
        url: String,
        mime: String,
        body: Bytes,
        reply: oneshot::Sender<Option<Bytes>>,
    },
}

/// Provider chain and filter factory, used from exactly one thread.
pub struct IoContext {
    chain: ProviderChain,
    filters: FilterFactory,
    output_capacity: usize,
}

impl IoContext {
    pub fn new(chain: ProviderChain, filters: FilterFactory, output_capacity: usize) -> Self {
        Self {
            chain,
            filters,
            output_capacity,
        }
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    pub fn resolve(&mut self, request: &ResourceRequest) -> Option<ResourceResponse> {
        self.chain.resolve(request)
    }

    /// Run a whole response body through a fresh filter as one chunk.
    /// `None` when the response is not eligible for filtering.
    pub fn filter_body(&mut self, url: &str, mime: &str, body: &[u8]) -> Option<Vec<u8>> {
        let mut filter = self.filters.create(url, mime)?;
        Some(filter.relay(body, self.output_capacity))
    }

    /// Move this context onto its own thread.
    ///
    /// The thread exits once every [`IoHandle`] is dropped.
    pub fn spawn(mut self) -> Result<IoHandle, ContextError> {
        let (tx, mut rx) = mpsc::channel::<Message>(QUEUE_DEPTH);

        thread::Builder::new()
            .name("resource-io".to_string())
            .spawn(move || {
                tracing::debug!(providers = self.chain.len(), "I/O context started");
                while let Some(message) = rx.blocking_recv() {
                    match message {
                        Message::Resolve { request, reply } => {
                            let _ = reply.send(self.resolve(&request));
                        }
                        Message::Filter {
                            url,
                            mime,
                            body,
                            reply,
                        } => {
                            let filtered = self.filter_body(&url, &mime, &body).map(Bytes::from);
                            let _ = reply.send(filtered);
                        }
                    }
                }
                tracing::debug!("I/O context stopped");
            })?;

        Ok(IoHandle { tx })
    }
}

/// Cloneable entry point to a spawned [`IoContext`].
#[derive(Clone)]
pub struct IoHandle {
    tx: mpsc::Sender<Message>,
}

impl IoHandle {
    /// Resolve a request through the provider chain.
    pub async fn resolve(
        &self,
        request: ResourceRequest,
    ) -> Result<Option<ResourceResponse>, ContextError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Resolve {
                request: Box::new(request),
                reply,
            })
            .await
            .map_err(|_| ContextError::Closed)?;
        rx.await.map_err(|_| ContextError::Closed)
    }

    /// Filter a buffered response body. `None` means the response passes
    /// through unfiltered.
    pub async fn filter_body(
        &self,
        url: impl Into<String>,
        mime: impl Into<String>,
        body: Bytes,
    ) -> Result<Option<Bytes>, ContextError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Filter {
                url: url.into(),
                mime: mime.into(),
                body,
                reply,
            })
            .await
            .map_err(|_| ContextError::Closed)?;
        rx.await.map_err(|_| ContextError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::RequestDumpProvider;
    use crate::rewrite::{Rule, RuleSet};

    fn context() -> (IoContext, mpsc::UnboundedReceiver<crate::rewrite::Injection>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut chain = ProviderChain::new();
        chain.add(Box::new(RequestDumpProvider::new()), 0, None);
        let filters = FilterFactory::new(
            RuleSet::new(vec![Rule::new("world", "there")]),
            std::env::temp_dir().join("resource-shell-no-scripts"),
            false,
            tx,
        );
        (IoContext::new(chain, filters, 1024), rx)
    }

    #[tokio::test]
    async fn test_handle_resolves_on_io_thread() {
        let (ctx, _rx) = context();
        let handle = ctx.spawn().unwrap();

        let claimed = handle
            .resolve(ResourceRequest::get("https://a.test/_/dump/request.html").unwrap())
            .await
            .unwrap();
        assert!(claimed.is_some());

        let declined = handle
            .resolve(ResourceRequest::get("https://a.test/other").unwrap())
            .await
            .unwrap();
        assert!(declined.is_none());
    }

    #[tokio::test]
    async fn test_handle_filters_body() {
        let (ctx, _rx) = context();
        let handle = ctx.spawn().unwrap();

        let out = handle
            .filter_body("https://a.test/", "text/html", Bytes::from_static(b"hello world"))
            .await
            .unwrap();
        assert_eq!(out.unwrap().as_ref(), b"hello there");

        let skipped = handle
            .filter_body("https://a.test/x.png", "image/png", Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap();
        assert!(skipped.is_none());
    }
}
