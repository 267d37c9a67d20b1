//! Ordered provider registry.
//!
//! # Responsibilities
//! - Keep providers sorted by priority, stable for equal priorities
//! - Resolve a request against providers in order
//! - Remove providers registered under a filter key

use crate::observability::metrics;
use crate::providers::Provider;
use crate::resource::{ResourceRequest, ResourceResponse};

struct Entry {
    priority: i32,
    filter_key: Option<String>,
    provider: Box<dyn Provider>,
}

/// Chain of responsibility over [`Provider`]s.
#[derive(Default)]
pub struct ProviderChain {
    entries: Vec<Entry>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Lower priorities run first; equal priorities
    /// run in registration order. An empty filter key counts as none.
    pub fn add(
        &mut self,
        provider: Box<dyn Provider>,
        priority: i32,
        filter_key: Option<String>,
    ) -> &mut Self {
        let filter_key = filter_key.filter(|k| !k.is_empty());
        let position = self
            .entries
            .iter()
            .position(|e| e.priority > priority)
            .unwrap_or(self.entries.len());

        tracing::debug!(
            provider = provider.name(),
            priority,
            filter_key = ?filter_key,
            "Provider registered"
        );

        self.entries.insert(
            position,
            Entry {
                priority,
                filter_key,
                provider,
            },
        );
        self
    }

    /// Remove every provider registered under `filter_key`.
    /// Returns how many were removed.
    pub fn remove(&mut self, filter_key: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| e.filter_key.as_deref() != Some(filter_key));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Provider names in resolution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.provider.name()).collect()
    }

    /// First response from a provider in order, or `None` when every
    /// provider declines.
    pub fn resolve(&mut self, request: &ResourceRequest) -> Option<ResourceResponse> {
        for entry in &mut self.entries {
            if let Some(response) = entry.provider.handle(request) {
                tracing::debug!(
                    provider = entry.provider.name(),
                    url = %request.url(),
                    status = response.status,
                    mime = %response.mime_type,
                    "Request claimed"
                );
                metrics::record_resolution(entry.provider.name(), true);
                return Some(response);
            }
        }

        tracing::trace!(url = %request.url(), "Request not intercepted");
        metrics::record_resolution("none", false);
        None
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.provider.name(), e.priority)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed {
        name: &'static str,
        body: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn new(name: &'static str, body: Option<&'static str>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    body,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl Provider for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle(&mut self, _request: &ResourceRequest) -> Option<ResourceResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body.map(|b| ResourceResponse::ok("text/plain", b))
        }
    }

    fn request() -> ResourceRequest {
        ResourceRequest::get("https://example.com/").unwrap()
    }

    #[test]
    fn test_lower_priority_short_circuits() {
        let (late, late_calls) = Fixed::new("late", Some("late"));
        let (early, _) = Fixed::new("early", Some("early"));

        let mut chain = ProviderChain::new();
        chain.add(Box::new(late), 10, None);
        chain.add(Box::new(early), 0, None);

        let resp = chain.resolve(&request()).unwrap();
        assert_eq!(resp.body().as_ref(), b"early");
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_equal_priority_keeps_insertion_order() {
        let (a, _) = Fixed::new("a", Some("a"));
        let (b, _) = Fixed::new("b", Some("b"));
        let (c, _) = Fixed::new("c", None);

        let mut chain = ProviderChain::new();
        chain.add(Box::new(c), 0, None).add(Box::new(a), 0, None).add(Box::new(b), 0, None);
        assert_eq!(chain.names(), vec!["c", "a", "b"]);

        let resp = chain.resolve(&request()).unwrap();
        assert_eq!(resp.body().as_ref(), b"a");
    }

    #[test]
    fn test_all_decline() {
        let (a, a_calls) = Fixed::new("a", None);
        let (b, b_calls) = Fixed::new("b", None);
        let mut chain = ProviderChain::new();
        chain.add(Box::new(a), 0, None).add(Box::new(b), 5, None);

        assert!(chain.resolve(&request()).is_none());
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_by_filter_key() {
        let (a, _) = Fixed::new("a", Some("a"));
        let (b, _) = Fixed::new("b", Some("b"));
        let (c, _) = Fixed::new("c", Some("c"));
        let mut chain = ProviderChain::new();
        chain
            .add(Box::new(a), 0, Some("test".into()))
            .add(Box::new(b), 1, Some(String::new()))
            .add(Box::new(c), 2, Some("test".into()));

        assert_eq!(chain.remove("test"), 2);
        assert_eq!(chain.names(), vec!["b"]);
        assert_eq!(chain.remove(""), 0);
    }
}
