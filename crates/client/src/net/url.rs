//! URL canonicalization for consistent cache identity.

/// Error type for URL handling failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string for consistent cache identity.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
///
/// Schemes are preserved as-is: out-of-scope schemes (browser extensions
/// and the like) are the classifier's concern, not an error here.
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if let Some(mut host) = parsed.host_str() {
        let h = host.to_lowercase();
        host = h.as_str();
        parsed
            .set_host(Some(host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a relative resource path against the configured base URL.
///
/// Used to turn precache manifest entries into absolute request URLs.
pub fn resolve(base: &url::Url, path: &str) -> Result<url::Url, UrlError> {
    let trimmed = path.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))
}
