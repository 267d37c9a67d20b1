//! Synthetic response produced by a provider.

use std::io::Cursor;

use bytes::Bytes;

use crate::resource::HeaderList;

/// A response the host serves instead of going to the network.
#[derive(Debug, Clone)]
pub struct ResourceResponse {
    pub status: u16,
    pub status_text: String,
    pub mime_type: String,
    pub headers: HeaderList,
    body: Bytes,
}

impl ResourceResponse {
    /// 200 OK with the given MIME type and body.
    pub fn ok(mime_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            mime_type: mime_type.into(),
            headers: HeaderList::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as a readable stream for hosts that pull data incrementally.
    pub fn reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.body.clone())
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_reader_yields_body() {
        let resp = ResourceResponse::ok("text/plain", "hello").with_header("X-Test", "1");
        let mut out = String::new();
        resp.reader().read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.status_text, "OK");
        assert_eq!(resp.headers.get("x-test"), Some("1"));
    }
}
