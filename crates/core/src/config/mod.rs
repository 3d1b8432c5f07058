//! Agent configuration with layered loading.
//!
//! Configuration is loaded with figment from multiple sources:
//!
//! 1. Environment variables (HARBOR_*)
//! 2. TOML config file (if HARBOR_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The cache identity is fixed here at deploy time; changing
//! `cache_version` creates a new cache generation on the next install.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::identity::CacheIdentity;
use crate::manifest::AssetManifest;

mod validation;

pub use validation::ConfigError;

/// Agent configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HARBOR_*)
/// 2. TOML config file (if HARBOR_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base cache name; prefix of every store this agent creates.
    ///
    /// Set via HARBOR_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Cache generation version. Bumping it creates a new generation.
    ///
    /// Set via HARBOR_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path to the SQLite cache database.
    ///
    /// Set via HARBOR_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the application origin the agent fronts.
    ///
    /// Set via HARBOR_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// User-Agent string for outbound HTTP requests.
    ///
    /// Set via HARBOR_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Outbound HTTP request timeout in milliseconds.
    ///
    /// Set via HARBOR_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to accept per response body.
    ///
    /// Set via HARBOR_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Site-relative paths populated at install time.
    ///
    /// Set via HARBOR_STATIC_ASSETS environment variable (comma-separated).
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Cached document served when a static request misses while offline.
    ///
    /// Set via HARBOR_OFFLINE_FALLBACK environment variable. Must be one of
    /// `static_assets` so it is guaranteed present after install.
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: String,
}

fn default_cache_name() -> String {
    "app-cache".into()
}

fn default_cache_version() -> String {
    "v1.0.0".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./harbor-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_user_agent() -> String {
    "harbor/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_static_assets() -> Vec<String> {
    AssetManifest::default().paths().to_vec()
}

fn default_offline_fallback() -> String {
    "/index.html".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            cache_version: default_cache_version(),
            db_path: default_db_path(),
            origin: default_origin(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            static_assets: default_static_assets(),
            offline_fallback: default_offline_fallback(),
        }
    }
}

impl AgentConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The cache identity fixed by this configuration.
    pub fn identity(&self) -> CacheIdentity {
        CacheIdentity::new(&self.cache_name, &self.cache_version)
    }

    /// The static asset manifest fixed by this configuration.
    pub fn manifest(&self) -> AssetManifest {
        AssetManifest::new(self.static_assets.clone())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HARBOR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HARBOR_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.cache_name, "app-cache");
        assert_eq!(config.cache_version, "v1.0.0");
        assert_eq!(config.db_path, PathBuf::from("./harbor-cache.sqlite"));
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.static_assets.len(), 5);
        assert_eq!(config.offline_fallback, "/index.html");
    }

    #[test]
    fn test_identity_from_config() {
        let config = AgentConfig::default();
        assert_eq!(config.identity().namespace(), "app-cache-v1.0.0");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AgentConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }
}
