//! Response strategies for routed requests.
//!
//! Two strategies compete for every intercepted request: dynamic/API
//! traffic goes network-only, everything else is served cache-first with a
//! background refresh. The router decides which one runs.

pub mod cache_first;
pub mod network_only;
