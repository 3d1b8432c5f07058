//! Network-only strategy for dynamic/API requests.
//!
//! Dynamic data must never be stale: this strategy bypasses the cache
//! store entirely, in both directions, and tells intermediate caches to do
//! the same.

use harbor_client::{Origin, OutboundRequest};
use harbor_core::{InterceptedRequest, Response};

/// Fetch fresh, forbidding intermediate caches from storing the response.
///
/// Never reads or writes the cache store. A network failure of any cause
/// synthesizes the plain-text 408 response instead of surfacing a raw
/// transport error to the page.
pub async fn respond(origin: &dyn Origin, request: &InterceptedRequest) -> Response {
    let outbound = OutboundRequest::from_intercepted(request).with_header("Cache-Control", "no-store");

    match origin.fetch(&outbound).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(url = %request.url, error = %err, "dynamic request failed, synthesizing 408");
            Response::network_error(&request.url)
        }
    }
}
