//! Versioned cache namespace derivation.
//!
//! A cache identity names one generation of the static cache. Bumping the
//! version string at deploy time creates a new generation; the old one
//! becomes eligible for cleanup at activation.

use serde::{Deserialize, Serialize};

/// Identifies one generation of the static cache.
///
/// Invariant: exactly one namespace is current at a time. The namespace is
/// the hyphen-joined base name and version, e.g. `app-cache-v1.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheIdentity {
    base_name: String,
    version: String,
}

impl CacheIdentity {
    pub fn new(base_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { base_name: base_name.into(), version: version.into() }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The store name for this generation: `"<base_name>-<version>"`.
    pub fn namespace(&self) -> String {
        format!("{}-{}", self.base_name, self.version)
    }

    /// A store name is stale when it belongs to this agent (base-name prefix)
    /// but is not the current generation.
    pub fn is_stale(&self, store_name: &str) -> bool {
        store_name.starts_with(&self.base_name) && store_name != self.namespace()
    }
}
