//! Test doubles for the host collaborators.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use abri_core::model::{Destination, Request, Response};
use abri_client::net::{Network, NetworkError};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::worker::HostControl;

/// Scripted network with a call counter.
///
/// Routes map exact URLs to canned responses; anything unrouted, or any
/// fetch while `set_offline(true)`, fails at the connectivity layer.
pub struct MockNetwork {
    routes: RwLock<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl MockNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub async fn route(&self, url: &str, response: Response) {
        self.routes.write().await.insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of fetch attempts made, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable("simulated offline".to_string()));
        }

        self.routes
            .read()
            .await
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| NetworkError::Unreachable(format!("no route for {}", request.url)))
    }
}

/// Host control double counting takeover signals.
pub struct MockControl {
    skip_waiting: AtomicUsize,
    claim: AtomicUsize,
}

impl MockControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { skip_waiting: AtomicUsize::new(0), claim: AtomicUsize::new(0) })
    }

    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn claim_calls(&self) -> usize {
        self.claim.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostControl for MockControl {
    async fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
    }

    async fn claim_clients(&self) {
        self.claim.fetch_add(1, Ordering::SeqCst);
    }
}

/// A 200 text/html response with the given body.
pub fn text_response(body: &str) -> Response {
    Response::new(
        200,
        vec![("content-type".to_string(), "text/html".to_string())],
        Bytes::copy_from_slice(body.as_bytes()),
    )
}

/// A navigation request for the given URL.
pub fn page(url: &str) -> Request {
    Request::navigation(url::Url::parse(url).unwrap())
}

/// A subresource request for the given URL.
pub fn request(url: &str) -> Request {
    Request::get(url::Url::parse(url).unwrap(), Destination::Style)
}
