//! Request classification.
//!
//! Maps an intercepted request to the strategy that will serve it. Pure
//! decision logic; the policy comes from configuration and never changes at
//! runtime.

use crate::model::{Destination, Request, RequestMode};

/// Strategy category for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Full-page HTML navigation.
    Navigation,
    /// Stylesheet, script, image, font, or app manifest.
    StaticAsset,
    /// Everything else: XHR/fetch calls, data requests, unclassified types.
    Other,
}

/// Deployer-controlled classification policy.
#[derive(Debug, Clone)]
pub struct ClassifyPolicy {
    /// Destinations treated as static assets.
    pub asset_destinations: Vec<Destination>,
    /// Filenames treated as static assets regardless of destination.
    pub manifest_names: Vec<String>,
    /// URL schemes outside the worker's responsibility.
    pub bypass_schemes: Vec<String>,
}

impl Default for ClassifyPolicy {
    fn default() -> Self {
        Self {
            asset_destinations: vec![
                Destination::Style,
                Destination::Script,
                Destination::Image,
                Destination::Font,
            ],
            manifest_names: vec!["manifest.json".to_string()],
            bypass_schemes: vec!["chrome-extension".to_string(), "moz-extension".to_string()],
        }
    }
}

/// Classify a request, or return `None` for requests the worker must pass
/// through untouched (e.g. browser-extension-internal schemes).
pub fn classify(request: &Request, policy: &ClassifyPolicy) -> Option<RequestClass> {
    if policy.bypass_schemes.iter().any(|s| s.as_str() == request.url.scheme()) {
        return None;
    }

    if request.mode == RequestMode::Navigate {
        return Some(RequestClass::Navigation);
    }

    if policy.asset_destinations.contains(&request.destination) {
        return Some(RequestClass::StaticAsset);
    }

    if let Some(name) = request.file_name()
        && policy.manifest_names.iter().any(|m| m.as_str() == name)
    {
        return Some(RequestClass::StaticAsset);
    }

    Some(RequestClass::Other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_navigation() {
        let request = Request::navigation(url("https://example.com/parcours.html"));
        assert_eq!(
            classify(&request, &ClassifyPolicy::default()),
            Some(RequestClass::Navigation)
        );
    }

    #[test]
    fn test_asset_destinations() {
        let policy = ClassifyPolicy::default();
        for destination in [
            Destination::Style,
            Destination::Script,
            Destination::Image,
            Destination::Font,
        ] {
            let request = Request::get(url("https://example.com/asset"), destination);
            assert_eq!(classify(&request, &policy), Some(RequestClass::StaticAsset));
        }
    }

    #[test]
    fn test_manifest_filename_is_static() {
        let request = Request::get(url("https://example.com/manifest.json"), Destination::None);
        assert_eq!(
            classify(&request, &ClassifyPolicy::default()),
            Some(RequestClass::StaticAsset)
        );
    }

    #[test]
    fn test_other() {
        let request = Request::get(url("https://example.com/api/data"), Destination::None);
        assert_eq!(classify(&request, &ClassifyPolicy::default()), Some(RequestClass::Other));
    }

    #[test]
    fn test_extension_scheme_bypassed() {
        let request = Request::get(
            url("chrome-extension://abcdef/popup.js"),
            Destination::Script,
        );
        assert_eq!(classify(&request, &ClassifyPolicy::default()), None);
    }

    #[test]
    fn test_navigation_wins_over_destination() {
        // A navigation to a .json URL is still a navigation.
        let request = Request::new(
            url("https://example.com/manifest.json"),
            RequestMode::Navigate,
            Destination::Document,
        );
        assert_eq!(
            classify(&request, &ClassifyPolicy::default()),
            Some(RequestClass::Navigation)
        );
    }

    #[test]
    fn test_audio_is_other() {
        let request = Request::get(url("https://example.com/intro.mp3"), Destination::Audio);
        assert_eq!(classify(&request, &ClassifyPolicy::default()), Some(RequestClass::Other));
    }
}
