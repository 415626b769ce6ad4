//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use thiserror::Error;

use crate::config::AppConfig;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_version` is empty
    /// - `base_url` does not parse as an http(s) URL
    /// - `precache` is empty or `offline_document` is not a member of it
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.is_empty() {
            return Err(ConfigError::Invalid {
                field: "cache_version".into(),
                reason: "must not be empty".into(),
            });
        }

        let scope = self.scope()?;
        match scope.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ConfigError::Invalid {
                    field: "base_url".into(),
                    reason: format!("unsupported scheme: {scheme}"),
                });
            }
        }

        if self.precache.is_empty() {
            return Err(ConfigError::Invalid {
                field: "precache".into(),
                reason: "must list at least one resource".into(),
            });
        }
        if !self.precache.contains(&self.offline_document) {
            return Err(ConfigError::Invalid {
                field: "offline_document".into(),
                reason: format!("'{}' is not a precache member", self.offline_document),
            });
        }

        for entry in &self.precache {
            if !entry.is_ascii() {
                // The store keys entries by the URL actually requested;
                // a deployed filename that differs in encoding will fail
                // every install. The deployer has to verify it.
                tracing::warn!(
                    entry = %entry,
                    "precache entry contains non-ASCII characters; \
                     verify it matches the deployed filename exactly"
                );
            }
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}
