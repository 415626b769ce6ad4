//! Request and response model for intercepted traffic.
//!
//! Requests are supplied per fetch event by the host; the worker never
//! constructs them from live traffic itself. Response bodies are held in a
//! shared `Bytes` buffer, so cloning a response yields the second independent
//! copy needed when one copy is returned to the caller and one is persisted.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// How the page issued a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// A full-page HTML navigation.
    Navigate,
    SameOrigin,
    NoCors,
    Cors,
}

impl std::fmt::Display for RequestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestMode::Navigate => write!(f, "navigate"),
            RequestMode::SameOrigin => write!(f, "same-origin"),
            RequestMode::NoCors => write!(f, "no-cors"),
            RequestMode::Cors => write!(f, "cors"),
        }
    }
}

/// The resource type a request is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Font,
    Manifest,
    Audio,
    Video,
    Worker,
    /// No destination reported by the host (XHR/fetch calls and the like).
    None,
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Document => write!(f, "document"),
            Destination::Style => write!(f, "style"),
            Destination::Script => write!(f, "script"),
            Destination::Image => write!(f, "image"),
            Destination::Font => write!(f, "font"),
            Destination::Manifest => write!(f, "manifest"),
            Destination::Audio => write!(f, "audio"),
            Destination::Video => write!(f, "video"),
            Destination::Worker => write!(f, "worker"),
            Destination::None => write!(f, "none"),
        }
    }
}

/// An intercepted outbound request.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub mode: RequestMode,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(url: Url, mode: RequestMode, destination: Destination) -> Self {
        Self { url, mode, destination, headers: Vec::new() }
    }

    /// A full-page navigation request.
    pub fn navigation(url: Url) -> Self {
        Self::new(url, RequestMode::Navigate, Destination::Document)
    }

    /// A subresource request with the given destination.
    pub fn get(url: Url, destination: Destination) -> Self {
        Self::new(url, RequestMode::NoCors, destination)
    }

    /// Identity key used to address this request in the store.
    ///
    /// Two requests for the same canonical URL share one cache slot
    /// regardless of mode or destination.
    pub fn key(&self) -> String {
        crate::store::hash::request_key(self.url.as_str())
    }

    /// Final path segment, if any. Used to match manifest filenames.
    pub fn file_name(&self) -> Option<&str> {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
    }
}

/// A response produced by the network, read back from a generation, or
/// synthesized as the terminal network-error response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    /// The terminal network-error response: status 0, no body.
    ///
    /// Surfaced to the caller as a failed resource load, never as a fault.
    pub fn network_error() -> Self {
        Self { status: 0, headers: Vec::new(), body: Bytes::new() }
    }

    pub fn is_network_error(&self) -> bool {
        self.status == 0
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
