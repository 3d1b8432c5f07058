//! Request and response types shared across the agent.

use serde::{Deserialize, Serialize};

/// Classification of a response, mirroring the fetch response types the
/// caching strategies care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin, fully readable.
    Basic,
    /// Cross-origin, readable via CORS.
    Cors,
    /// Cross-origin, body not readable.
    Opaque,
    /// Synthesized locally (e.g. the 408 network-failure response).
    Error,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Basic => "basic",
            ResponseKind::Cors => "cors",
            ResponseKind::Opaque => "opaque",
            ResponseKind::Error => "error",
        }
    }

    /// Unknown kinds read back as opaque, so they can never re-enter the
    /// cache as pristine entries.
    pub fn parse(s: &str) -> Self {
        match s {
            "basic" => ResponseKind::Basic,
            "cors" => ResponseKind::Cors,
            "error" => ResponseKind::Error,
            _ => ResponseKind::Opaque,
        }
    }
}

/// A request intercepted from a controlled page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptedRequest {
    /// Uppercased HTTP method.
    pub method: String,
    pub url: String,
}

impl InterceptedRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into().to_ascii_uppercase(), url: url.into() }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }
}

/// A response as seen by controlled pages, whether it came from the
/// network, the cache store, or was synthesized locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub kind: ResponseKind,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only pristine same-origin responses may enter the cache; opaque,
    /// redirected, and error responses are passed through uncached.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseKind::Basic
    }

    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The synthetic response returned when a dynamic request cannot reach
    /// the network. Never cached, never a raw transport error.
    pub fn network_error(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 408,
            kind: ResponseKind::Error,
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: b"Network error occurred".to_vec(),
        }
    }
}
