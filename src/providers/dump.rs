//! Diagnostic request dumps.
//!
//! # Responsibilities
//! - `…/_/dump/header.html`: request headers as JSON
//! - `…/_/dump/request.html`: method, URL, headers and post data as HTML
//! - Allow cross-origin fetches of the dumps

use serde_json::{Map, Value};

use crate::providers::Provider;
use crate::resource::{BodyElement, ResourceRequest, ResourceResponse};

/// Path suffix answered with a JSON header dump.
pub const HEADER_DUMP_SUFFIX: &str = "/_/dump/header.html";

/// Path suffix answered with a full HTML request dump.
pub const REQUEST_DUMP_SUFFIX: &str = "/_/dump/request.html";

/// Custom request header cross-origin callers may send to the HTML dump.
pub const ALLOWED_CUSTOM_HEADER: &str = "My-Custom-Header";

#[derive(Debug, Default)]
pub struct RequestDumpProvider;

impl RequestDumpProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Provider for RequestDumpProvider {
    fn name(&self) -> &'static str {
        "dump"
    }

    fn handle(&mut self, request: &ResourceRequest) -> Option<ResourceResponse> {
        let path = request.url().path();
        if path.ends_with(HEADER_DUMP_SUFFIX) {
            Some(header_dump(request))
        } else if path.ends_with(REQUEST_DUMP_SUFFIX) {
            Some(request_dump(request))
        } else {
            None
        }
    }
}

fn header_dump(request: &ResourceRequest) -> ResourceResponse {
    let headers: Vec<Value> = request
        .headers()
        .iter()
        .map(|(name, value)| {
            let mut entry = Map::new();
            entry.insert(name.to_string(), Value::String(value.to_string()));
            Value::Object(entry)
        })
        .collect();

    let body = if headers.is_empty() {
        String::new()
    } else {
        Value::Array(headers).to_string()
    };

    ResourceResponse::ok("application/json", body).with_header("Access-Control-Allow-Origin", "*")
}

fn request_dump(request: &ResourceRequest) -> ResourceResponse {
    let html = format!(
        "<html><body bgcolor=\"white\"><pre>{}</pre></body></html>",
        escape_html(&dump_text(request))
    );
    let mut response = ResourceResponse::ok("text/html", html);

    if let Some(origin) = request.headers().get("origin").filter(|o| !o.is_empty()) {
        response = response
            .with_header("Access-Control-Allow-Origin", origin)
            .with_header("Access-Control-Allow-Headers", ALLOWED_CUSTOM_HEADER);
    }
    response
}

/// Plain-text description of a request.
pub fn dump_text(request: &ResourceRequest) -> String {
    let mut out = format!("URL: {}\nMethod: {}", request.url(), request.method());

    if !request.headers().is_empty() {
        out.push_str("\nHeaders:");
        for (name, value) in request.headers().iter() {
            out.push_str(&format!("\n\t{name}: {value}"));
        }
    }

    if let Some(elements) = request.body().filter(|b| !b.is_empty()) {
        out.push_str("\nPost Data:");
        for element in elements {
            match element {
                BodyElement::Bytes(bytes) if bytes.is_empty() => out.push_str("\n\tBytes: (empty)"),
                BodyElement::Bytes(bytes) => {
                    out.push_str("\n\tBytes: ");
                    out.push_str(&String::from_utf8_lossy(bytes));
                }
                BodyElement::File(path) => {
                    out.push_str(&format!("\n\tFile: {}", path.display()));
                }
            }
        }
    }

    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
