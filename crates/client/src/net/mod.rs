//! Network interface the worker fetches through.
//!
//! A `NetworkError` means connectivity failure: the request never completed.
//! A completed HTTP exchange is a network success whatever its status code;
//! the strategies decide what a 404 means, not this layer.

pub mod url;

use std::time::Duration;

use abri_core::model::{Request, Response};
use async_trait::async_trait;
use reqwest::Client;

pub use url::{UrlError, canonicalize, resolve};

/// Connectivity failure while issuing a request.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("timed out: {0}")]
    TimedOut(String),

    #[error("response body unreadable: {0}")]
    Body(String),

    #[error("response too large: {got} bytes exceeds {limit}")]
    TooLarge { got: usize, limit: usize },
}

/// The network collaborator. One attempt per call; retries are the
/// caller's decision (the strategies never retry).
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Configuration for the HTTP network client.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// User agent string (default: "abri/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: "abri/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// HTTP network client over reqwest.
pub struct HttpNetwork {
    http: Client,
    config: NetworkConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: NetworkConfig) -> Result<Self, NetworkError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| NetworkError::Unreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let mut builder = self.http.get(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::TimedOut(e.to_string())
            } else {
                NetworkError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(NetworkError::TooLarge { got: len as usize, limit: self.config.max_bytes });
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect::<Vec<_>>();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Body(e.to_string()))?;

        if bytes.len() > self.config.max_bytes {
            return Err(NetworkError::TooLarge { got: bytes.len(), limit: self.config.max_bytes });
        }

        tracing::debug!(url = %request.url, status, bytes = bytes.len(), "network fetch completed");

        Ok(Response::new(status, headers, bytes))
    }
}
