//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Rebuild the absolute URL the engine would have requested
//! - Convert an HTTP request into a [`ResourceRequest`]

use axum::http::{header, request::Parts, HeaderValue, Request};
use bytes::Bytes;
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;

use crate::resource::{BodyElement, HeaderList, ResourceRequest};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Header naming the scheme a fronting client used; defaults to `http`.
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Request id generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Absolute URL of a request.
///
/// Absolute-form targets (proxy style) are used as is. Otherwise the URL is
/// rebuilt from the `Host` header and `x-forwarded-proto`.
pub fn request_url(parts: &Parts) -> Result<Url, url::ParseError> {
    if parts.uri.scheme().is_some() {
        return Url::parse(&parts.uri.to_string());
    }

    let scheme = header_str(parts, X_FORWARDED_PROTO).unwrap_or("http");
    let host = header_str(parts, header::HOST.as_str()).unwrap_or("localhost");
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Url::parse(&format!("{scheme}://{host}{path}"))
}

/// Build the engine-side view of a request. Header values that are not
/// valid UTF-8 are dropped.
pub fn to_resource_request(parts: &Parts, url: Url, body: &Bytes) -> ResourceRequest {
    let headers: HeaderList = parts
        .headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect();

    let request = ResourceRequest::new(url)
        .with_method(parts.method.as_str())
        .with_headers(headers);

    if body.is_empty() {
        request
    } else {
        request.with_body(vec![BodyElement::Bytes(body.to_vec())])
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
