//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ABRI_*)
//! 2. TOML config file (if ABRI_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The configuration is deployer-controlled and never mutated at runtime;
//! the worker derives its immutable state from it once at process start.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::classify::ClassifyPolicy;
use crate::model::Destination;

mod validation;

pub use validation::ConfigError;

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ABRI_*)
/// 2. TOML config file (if ABRI_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version tag identifying the current release of the cache contents.
    ///
    /// Changed by the deployer on each release; the two generation names
    /// are derived from it.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin the site is served from. Relative precache paths resolve
    /// against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Relative paths that must be available offline after install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Fallback document served for navigations that cannot be satisfied
    /// from network or precache. Must be a precache member.
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// Destinations classified as static assets.
    #[serde(default = "default_asset_destinations")]
    pub asset_destinations: Vec<Destination>,

    /// Filenames classified as static assets regardless of destination.
    #[serde(default = "default_manifest_names")]
    pub manifest_names: Vec<String>,

    /// URL schemes the worker passes through untouched.
    #[serde(default = "default_bypass_schemes")]
    pub bypass_schemes: Vec<String>,

    /// Path to the SQLite generation store.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network fetch timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to accept per fetched response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum number of redirects to follow per fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_base_url() -> String {
    "http://localhost:8080/".into()
}

fn default_precache() -> Vec<String> {
    vec![
        "index.html".into(),
        "offline.html".into(),
        "portfolio.css".into(),
        "manifest.json".into(),
    ]
}

fn default_offline_document() -> String {
    "offline.html".into()
}

fn default_asset_destinations() -> Vec<Destination> {
    vec![
        Destination::Style,
        Destination::Script,
        Destination::Image,
        Destination::Font,
    ]
}

fn default_manifest_names() -> Vec<String> {
    vec!["manifest.json".into()]
}

fn default_bypass_schemes() -> Vec<String> {
    vec!["chrome-extension".into(), "moz-extension".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./abri-cache.sqlite")
}

fn default_user_agent() -> String {
    "abri/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_max_redirects() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            base_url: default_base_url(),
            precache: default_precache(),
            offline_document: default_offline_document(),
            asset_destinations: default_asset_destinations(),
            manifest_names: default_manifest_names(),
            bypass_schemes: default_bypass_schemes(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The parsed base URL the worker is scoped to.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `base_url` does not parse.
    pub fn scope(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid { field: "base_url".into(), reason: e.to_string() })
    }

    /// Classification policy derived from this configuration.
    pub fn classify_policy(&self) -> ClassifyPolicy {
        ClassifyPolicy {
            asset_destinations: self.asset_destinations.clone(),
            manifest_names: self.manifest_names.clone(),
            bypass_schemes: self.bypass_schemes.clone(),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `ABRI_`
    /// 2. TOML file from `ABRI_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("ABRI_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("ABRI_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
