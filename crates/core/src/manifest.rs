//! Static asset manifest.

use serde::{Deserialize, Serialize};

/// Ordered list of site-relative paths that must be cached for the app
/// shell to work offline. Every entry must resolve at install time or the
/// install fails as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    paths: Vec<String>,
}

impl AssetManifest {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for AssetManifest {
    /// The app shell: root and index documents, the manifest descriptor,
    /// and both icon variants.
    fn default() -> Self {
        Self::new(vec![
            "/".to_string(),
            "/index.html".to_string(),
            "/manifest.json".to_string(),
            "/icons/icon-192x192.svg".to_string(),
            "/icons/icon-512x512.svg".to_string(),
        ])
    }
}
