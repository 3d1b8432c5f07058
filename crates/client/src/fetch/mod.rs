//! HTTP fetch pipeline for the agent's outbound traffic.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Response classification
//! - `basic` when the final URL shares scheme/host/port with the
//!   configured application origin; `cors` otherwise.
//! - Transport rejections of any cause (offline, DNS, timeout) surface
//!   uniformly as `NETWORK_ERROR`.

pub mod url;

use async_trait::async_trait;
use harbor_core::{Error, InterceptedRequest, Response, ResponseKind};
use reqwest::{Client, redirect};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize};

/// Configuration for the HTTP origin client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "harbor/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "harbor/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// An outbound request about to hit the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: "GET".to_string(), url: url.into(), headers: Vec::new() }
    }

    pub fn from_intercepted(request: &InterceptedRequest) -> Self {
        Self { method: request.method.clone(), url: request.url.clone(), headers: Vec::new() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Where outbound requests go.
///
/// Strategies and the lifecycle coordinator fetch through this seam;
/// production wires in [`HttpOrigin`], tests substitute scripted fakes.
#[async_trait]
pub trait Origin: Send + Sync {
    async fn fetch(&self, request: &OutboundRequest) -> Result<Response, Error>;
}

/// HTTP origin backed by reqwest.
pub struct HttpOrigin {
    http: Client,
    config: FetchConfig,
    app_origin: ::url::Url,
}

impl HttpOrigin {
    /// Create a new origin client fronting the given application origin.
    pub fn new(app_origin: &str, config: FetchConfig) -> Result<Self, Error> {
        let app_origin = canonicalize(app_origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config, app_origin })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn kind_for(&self, final_url: &::url::Url) -> ResponseKind {
        let same_origin = final_url.scheme() == self.app_origin.scheme()
            && final_url.host_str() == self.app_origin.host_str()
            && final_url.port_or_known_default() == self.app_origin.port_or_known_default();
        if same_origin { ResponseKind::Basic } else { ResponseKind::Cors }
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    /// Fetch a request, returning the response with its classification.
    ///
    /// Respects the configured timeout, redirect, and byte limits.
    async fn fetch(&self, request: &OutboundRequest) -> Result<Response, Error> {
        let start = Instant::now();
        let url = canonicalize(&request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidUrl(format!("invalid method: {}", request.method)))?;

        let mut outbound = self.http.request(method, url.clone());
        for (name, value) in &request.headers {
            outbound = outbound.header(name, value);
        }

        let response = outbound.send().await.map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::TooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::TooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let kind = self.kind_for(&final_url);
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes, {})",
            url,
            final_url,
            fetch_ms,
            bytes.len(),
            kind.as_str()
        );

        Ok(Response { url: final_url.to_string(), status, kind, headers, body: bytes.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "harbor/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_outbound_request_headers() {
        let request = OutboundRequest::get("https://example.com/api/rates").with_header("Cache-Control", "no-store");
        assert_eq!(request.method, "GET");
        assert_eq!(request.headers, vec![("Cache-Control".to_string(), "no-store".to_string())]);
    }

    #[test]
    fn test_outbound_from_intercepted() {
        let intercepted = InterceptedRequest::new("get", "https://example.com/index.html");
        let outbound = OutboundRequest::from_intercepted(&intercepted);
        assert_eq!(outbound.method, "GET");
        assert_eq!(outbound.url, "https://example.com/index.html");
        assert!(outbound.headers.is_empty());
    }

    #[tokio::test]
    async fn test_http_origin_new() {
        let origin = HttpOrigin::new("https://app.example.com", FetchConfig::default());
        assert!(origin.is_ok());
    }

    #[test]
    fn test_kind_for_same_origin() {
        let origin = HttpOrigin::new("https://app.example.com", FetchConfig::default()).unwrap();

        let same = ::url::Url::parse("https://app.example.com/index.html").unwrap();
        assert_eq!(origin.kind_for(&same), ResponseKind::Basic);

        let cross = ::url::Url::parse("https://cdn.example.net/lib.js").unwrap();
        assert_eq!(origin.kind_for(&cross), ResponseKind::Cors);

        let other_scheme = ::url::Url::parse("http://app.example.com/index.html").unwrap();
        assert_eq!(origin.kind_for(&other_scheme), ResponseKind::Cors);
    }
}
