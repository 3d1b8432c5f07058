//! Request classification and routing.
//!
//! Classification is a pure function of the URL string: no side effects,
//! deterministic, evaluated exactly once per intercepted request.

/// Routing decision for one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Dynamic/API traffic: always fetched fresh, never cached.
    Dynamic,
    /// Static/navigational traffic: served cache-first.
    Static,
}

/// True when the URL looks like dynamic API traffic.
///
/// Deliberately loose: any URL containing the literal substring "api"
/// (case-sensitive, anywhere) is dynamic. The occasional static asset
/// misrouted to the network is acceptable; serving a stale cache entry for
/// a live data endpoint is not.
pub fn is_api_like(url: &str) -> bool {
    url.contains("/api/") || url.contains("/rpc") || url.contains("api")
}

/// Classify a request URL into its route.
pub fn classify(url: &str) -> Route {
    if is_api_like(url) { Route::Dynamic } else { Route::Static }
}
