//! Fetch strategies, one per request class.
//!
//! Every strategy produces exactly one response and never raises: a store
//! fault during lookup degrades to a cache miss, a store fault during a
//! runtime write is logged without touching the response, and total failure
//! surfaces as the terminal network-error response. One network attempt per
//! request event, no retries.

use abri_core::model::{Request, Response};
use abri_core::store::{CacheStorage, Generation};
use abri_client::net::Network;

/// Network-first with precache-only fallback. Navigation responses are
/// never written to any generation, so dynamic HTML stays uncached.
pub async fn navigation(
    storage: &dyn CacheStorage,
    network: &dyn Network,
    static_name: &str,
    offline: &Request,
    request: &Request,
) -> Response {
    match network.fetch(request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(url = %request.url, error = %err, "navigation fetch failed, falling back to precache");

            let generation = match storage.open_generation(static_name).await {
                Ok(generation) => generation,
                Err(e) => {
                    tracing::warn!(error = %e, "static generation unavailable");
                    return Response::network_error();
                }
            };

            if let Ok(Some(precached)) = generation.match_request(request).await {
                return precached;
            }

            match generation.match_request(offline).await {
                Ok(Some(fallback)) => fallback,
                Ok(None) => {
                    tracing::warn!(document = %offline.url, "offline document missing from precache");
                    Response::network_error()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "offline document lookup failed");
                    Response::network_error()
                }
            }
        }
    }
}

/// Cache-first with runtime population. A warm cache entry is served
/// without touching the network; staleness is bounded only by the next
/// version-tag bump.
pub async fn static_asset(
    storage: &dyn CacheStorage,
    network: &dyn Network,
    runtime_name: &str,
    request: &Request,
) -> Response {
    match storage.match_any(request).await {
        Ok(Some(cached)) => return cached,
        Ok(None) => {}
        Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed, treating as miss"),
    }

    match network.fetch(request).await {
        Ok(response) => {
            persist_runtime(storage, runtime_name, request, &response).await;
            response
        }
        Err(err) => {
            tracing::debug!(url = %request.url, error = %err, "asset unavailable offline");
            Response::network_error()
        }
    }
}

/// Network-first with cache fallback and runtime population.
pub async fn other(
    storage: &dyn CacheStorage,
    network: &dyn Network,
    runtime_name: &str,
    request: &Request,
) -> Response {
    match network.fetch(request).await {
        Ok(response) => {
            persist_runtime(storage, runtime_name, request, &response).await;
            response
        }
        Err(err) => {
            tracing::debug!(url = %request.url, error = %err, "fetch failed, falling back to cache");
            match storage.match_any(request).await {
                Ok(Some(cached)) => cached,
                Ok(None) => Response::network_error(),
                Err(e) => {
                    tracing::warn!(url = %request.url, error = %e, "cache fallback failed");
                    Response::network_error()
                }
            }
        }
    }
}

/// Write one copy of the response into the runtime generation. The caller
/// keeps the other copy; both share the same body buffer.
async fn persist_runtime(
    storage: &dyn CacheStorage,
    runtime_name: &str,
    request: &Request,
    response: &Response,
) {
    let generation = match storage.open_generation(runtime_name).await {
        Ok(generation) => generation,
        Err(e) => {
            tracing::warn!(error = %e, "runtime generation unavailable, skipping write");
            return;
        }
    };

    if let Err(e) = generation.put(request, response).await {
        tracing::warn!(url = %request.url, error = %e, "runtime cache write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockNetwork, page, request, text_response};
    use abri_core::SqliteStorage;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_static_asset_warm_cache_skips_network() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        let req = request("https://site.test/portfolio.css");

        let generation = storage.open_generation("v1-runtime").await.unwrap();
        generation.put(&req, &text_response("cached css")).await.unwrap();

        let response = static_asset(&storage, network.as_ref(), "v1-runtime", &req).await;

        assert_eq!(response.body, Bytes::from_static(b"cached css"));
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_static_asset_miss_populates_runtime() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        let req = request("https://site.test/photo11.png");
        network.route(req.url.as_str(), text_response("png bytes")).await;

        let response = static_asset(&storage, network.as_ref(), "v1-runtime", &req).await;

        assert_eq!(response.body, Bytes::from_static(b"png bytes"));
        assert_eq!(network.calls(), 1);

        let generation = storage.open_generation("v1-runtime").await.unwrap();
        assert!(generation.match_request(&req).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_static_asset_offline_miss_is_network_error() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        network.set_offline(true);
        let req = request("https://site.test/absent.css");

        let response = static_asset(&storage, network.as_ref(), "v1-runtime", &req).await;

        assert!(response.is_network_error());
    }

    #[tokio::test]
    async fn test_static_asset_offline_with_cached_copy() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        let req = request("https://site.test/app.css");

        let generation = storage.open_generation("v1-runtime").await.unwrap();
        generation.put(&req, &text_response("cached")).await.unwrap();
        network.set_offline(true);

        let response = static_asset(&storage, network.as_ref(), "v1-runtime", &req).await;

        assert_eq!(response.body, Bytes::from_static(b"cached"));
    }

    #[tokio::test]
    async fn test_navigation_online_returns_network_and_never_caches() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        let req = page("https://site.test/parcours.html");
        let offline = request("https://site.test/offline.html");
        network.route(req.url.as_str(), text_response("live page")).await;

        let response = navigation(&storage, network.as_ref(), "v1-static", &offline, &req).await;

        assert_eq!(response.body, Bytes::from_static(b"live page"));
        assert!(storage.match_any(&req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_navigation_offline_serves_precached_page() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        let req = page("https://site.test/parcours.html");
        let offline = request("https://site.test/offline.html");

        let generation = storage.open_generation("v1-static").await.unwrap();
        generation.put(&req, &text_response("precached page")).await.unwrap();
        network.set_offline(true);

        let response = navigation(&storage, network.as_ref(), "v1-static", &offline, &req).await;

        assert_eq!(response.body, Bytes::from_static(b"precached page"));
    }

    #[tokio::test]
    async fn test_navigation_offline_unknown_page_gets_fallback() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        let req = page("https://site.test/unknown-page");
        let offline = request("https://site.test/offline.html");

        let generation = storage.open_generation("v1-static").await.unwrap();
        generation.put(&offline, &text_response("offline page")).await.unwrap();
        network.set_offline(true);

        let response = navigation(&storage, network.as_ref(), "v1-static", &offline, &req).await;

        assert_eq!(response.body, Bytes::from_static(b"offline page"));
        // The fallback path never wrote anything for the navigated URL.
        assert!(storage.match_any(&req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_navigation_ignores_runtime_entries() {
        // A page cached in runtime by the other strategy must not satisfy a
        // navigation; only the precache counts.
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        let req = page("https://site.test/feed.html");
        let offline = request("https://site.test/offline.html");

        let runtime = storage.open_generation("v1-runtime").await.unwrap();
        runtime.put(&req, &text_response("runtime copy")).await.unwrap();
        let static_gen = storage.open_generation("v1-static").await.unwrap();
        static_gen.put(&offline, &text_response("offline page")).await.unwrap();
        network.set_offline(true);

        let response = navigation(&storage, network.as_ref(), "v1-static", &offline, &req).await;

        assert_eq!(response.body, Bytes::from_static(b"offline page"));
    }

    #[tokio::test]
    async fn test_navigation_nothing_cached_is_network_error() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        network.set_offline(true);
        let req = page("https://site.test/unknown-page");
        let offline = request("https://site.test/offline.html");

        let response = navigation(&storage, network.as_ref(), "v1-static", &offline, &req).await;

        assert!(response.is_network_error());
    }

    #[tokio::test]
    async fn test_other_online_populates_runtime() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        let req = request("https://site.test/api/data");
        network.route(req.url.as_str(), text_response("{\"ok\":true}")).await;

        let response = other(&storage, network.as_ref(), "v1-runtime", &req).await;

        assert_eq!(response.status, 200);
        let generation = storage.open_generation("v1-runtime").await.unwrap();
        assert!(generation.match_request(&req).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_other_offline_falls_back_to_cache() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        let req = request("https://site.test/api/data");
        network.route(req.url.as_str(), text_response("fresh")).await;

        other(&storage, network.as_ref(), "v1-runtime", &req).await;
        network.set_offline(true);
        let response = other(&storage, network.as_ref(), "v1-runtime", &req).await;

        assert_eq!(response.body, Bytes::from_static(b"fresh"));
    }

    #[tokio::test]
    async fn test_other_offline_uncached_is_network_error() {
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        network.set_offline(true);
        let req = request("https://site.test/api/data");

        let response = other(&storage, network.as_ref(), "v1-runtime", &req).await;

        assert!(response.is_network_error());
    }

    #[tokio::test]
    async fn test_error_status_is_cached_as_is() {
        // A completed exchange is a network success whatever its status.
        let storage = SqliteStorage::open_in_memory().await.unwrap();
        let network = MockNetwork::new();
        let req = request("https://site.test/missing.css");
        network
            .route(req.url.as_str(), abri_core::Response::new(404, Vec::new(), Bytes::new()))
            .await;

        let response = static_asset(&storage, network.as_ref(), "v1-runtime", &req).await;

        assert_eq!(response.status, 404);
        let generation = storage.open_generation("v1-runtime").await.unwrap();
        assert_eq!(generation.match_request(&req).await.unwrap().unwrap().status, 404);
    }
}
