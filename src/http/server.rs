//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Resolve every request through the I/O context
//! - Forward unclaimed requests upstream and filter what comes back
//! - Stop on the shutdown broadcast

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, request::Parts, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use bytes::Bytes;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::{ShellConfig, UpstreamConfig};
use crate::http::request::{request_url, to_resource_request, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::into_http_response;
use crate::observability::metrics;
use crate::runtime::IoHandle;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub io: IoHandle,
    pub client: Client<HttpConnector, Body>,
    pub upstream: Option<UpstreamConfig>,
    pub max_body_size: usize,
}

/// Dev host serving the provider chain over HTTP.
pub struct HttpServer {
    router: Router,
    config: ShellConfig,
}

impl HttpServer {
    pub fn new(config: ShellConfig, io: IoHandle) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            io,
            client,
            upstream: config.upstream.clone(),
            max_body_size: config.listener.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ShellConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(resource_handler))
            .route("/", any(resource_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Bind the configured listener address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = &self.config.listener.bind_address;
        TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })
    }

    /// Serve on `listener` until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = ?self.config.upstream.as_ref().map(|u| u.address.as_str()),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }
}

/// Resolve through the provider chain, then fall back to the upstream.
async fn resource_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();

    let url = match request_url(&parts) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(request_id = %request_id, uri = %parts.uri, error = %e, "Unparseable request URL");
            metrics::record_request("none", 400, start);
            return (StatusCode::BAD_REQUEST, "Invalid request URL").into_response();
        }
    };

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, url = %url, error = %e, "Failed to read request body");
            metrics::record_request("none", 413, start);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        url = %url,
        "Resolving request"
    );

    let resource = to_resource_request(&parts, url.clone(), &body);
    match state.io.resolve(resource).await {
        Ok(Some(response)) => {
            metrics::record_request("provider", response.status, start);
            return into_http_response(response);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "I/O context unavailable");
            metrics::record_request("none", 503, start);
            return (StatusCode::SERVICE_UNAVAILABLE, "Resource context unavailable").into_response();
        }
    }

    let Some(upstream) = state.upstream.as_ref() else {
        tracing::debug!(request_id = %request_id, url = %url, "No provider claimed request");
        metrics::record_request("none", 404, start);
        return (StatusCode::NOT_FOUND, "No provider claimed this request").into_response();
    };

    let response = forward(&state, upstream, parts, body, &url, &request_id).await;
    metrics::record_request("upstream", response.status().as_u16(), start);
    response
}

/// Send the request upstream and pass the buffered response through the
/// rewrite filter.
async fn forward(
    state: &AppState,
    upstream: &UpstreamConfig,
    parts: Parts,
    body: Bytes,
    url: &Url,
    request_id: &str,
) -> Response {
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri: Uri = match format!("http://{}{}", upstream.address, path).parse() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %upstream.address, error = %e, "Invalid upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream address").into_response();
        }
    };

    let mut req = Request::new(Body::from(body));
    *req.method_mut() = parts.method;
    *req.uri_mut() = uri;
    *req.headers_mut() = parts.headers;
    // Filters work on plain text.
    req.headers_mut().remove(header::ACCEPT_ENCODING);

    let response: hyper::Response<Incoming> = match state.client.request(req).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %upstream.address, error = %e, "Upstream error");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    let (mut parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(Body::new(body), state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to read upstream body");
            return (StatusCode::BAD_GATEWAY, "Upstream body unreadable").into_response();
        }
    };

    let mime = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let mut filter_url = url.clone();
    if filter_url.set_scheme(&upstream.scheme).is_err() {
        tracing::debug!(scheme = %upstream.scheme, "Keeping request scheme for filter");
    }

    match state.io.filter_body(filter_url.as_str(), mime, body.clone()).await {
        Ok(Some(filtered)) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(filtered))
        }
        Ok(None) => Response::from_parts(parts, Body::from(body)),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "I/O context unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "Resource context unavailable").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ProviderChain, RequestDumpProvider};
    use crate::rewrite::{FilterFactory, RuleSet};
    use crate::runtime::IoContext;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn server() -> HttpServer {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut chain = ProviderChain::new();
        chain.add(Box::new(RequestDumpProvider::new()), 0, None);
        let filters = FilterFactory::new(RuleSet::default(), std::env::temp_dir(), false, tx);
        let io = IoContext::new(chain, filters, 1024).spawn().unwrap();
        HttpServer::new(ShellConfig::default(), io)
    }

    #[tokio::test]
    async fn test_claimed_request() {
        let router = server().router;
        let request = Request::builder()
            .uri("/_/dump/header.html")
            .header("host", "example.com")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert!(response.headers().contains_key(X_REQUEST_ID));

        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        assert!(body.starts_with(b"[{\"host\":\"example.com\"}"));
    }

    #[tokio::test]
    async fn test_unclaimed_without_upstream() {
        let router = server().router;
        let request = Request::builder()
            .uri("/missing")
            .header("host", "example.com")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
