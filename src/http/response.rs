//! Response conversion.

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::Response,
};

use crate::resource::ResourceResponse;

/// Convert a provider response into an HTTP response. Headers that are not
/// valid HTTP are skipped.
pub fn into_http_response(resource: ResourceResponse) -> Response {
    let status = StatusCode::from_u16(resource.status).unwrap_or(StatusCode::OK);

    let mut headers = Vec::with_capacity(resource.headers.len() + 1);
    if !resource.mime_type.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&resource.mime_type) {
            headers.push((header::CONTENT_TYPE, value));
        }
    }
    for (name, value) in resource.headers.iter() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => headers.push((name, value)),
            _ => tracing::debug!(header = %name, "Skipping invalid response header"),
        }
    }

    let mut response = Response::new(Body::from(resource.into_body()));
    *response.status_mut() = status;
    for (name, value) in headers {
        response.headers_mut().append(name, value);
    }
    response
}
