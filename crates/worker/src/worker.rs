//! The offline worker: event surface and dispatch.
//!
//! `OfflineWorker` is constructed once at process start from the immutable
//! configuration; each host event is handled as an independent async task
//! whose completion the host awaits before proceeding.

use std::sync::Arc;

use abri_core::classify::{self, ClassifyPolicy, RequestClass};
use abri_core::config::AppConfig;
use abri_core::model::{Destination, Request, Response};
use abri_core::store::CacheStorage;
use abri_core::{CacheNames, Error};
use abri_client::net::{self, Network};
use async_trait::async_trait;

use crate::{lifecycle, strategy};

/// Host lifecycle events delivered to the worker.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
}

/// Result of dispatching a single event.
#[derive(Debug)]
pub enum EventOutcome {
    Installed,
    Activated,
    Fetch(FetchOutcome),
}

/// What the worker decided to do with an intercepted request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Out-of-scope request; the host should issue it untouched.
    PassThrough,
    /// The worker produced the response.
    Respond(Response),
}

/// Control-takeover signals back into the host.
#[async_trait]
pub trait HostControl: Send + Sync {
    /// Ask the host to promote this worker over the one it replaces.
    async fn skip_waiting(&self);

    /// Ask the host to route all open views through this worker.
    async fn claim_clients(&self);
}

/// The offline-caching agent.
pub struct OfflineWorker {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    control: Arc<dyn HostControl>,
    names: CacheNames,
    policy: ClassifyPolicy,
    precache: Vec<Request>,
    offline: Request,
}

impl OfflineWorker {
    /// Build a worker from configuration, resolving the precache manifest
    /// against the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the base URL or a manifest entry does
    /// not resolve.
    pub fn new(
        config: &AppConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        control: Arc<dyn HostControl>,
    ) -> Result<Self, Error> {
        let base = config.scope().map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let mut precache = Vec::with_capacity(config.precache.len());
        for path in &config.precache {
            let url = net::resolve(&base, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
            precache.push(Request::get(url, Destination::None));
        }

        let offline_url = net::resolve(&base, &config.offline_document)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.offline_document)))?;

        Ok(Self {
            storage,
            network,
            control,
            names: CacheNames::for_version(&config.cache_version),
            policy: config.classify_policy(),
            precache,
            offline: Request::get(offline_url, Destination::None),
        })
    }

    /// The generation names this worker considers current.
    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    /// Route a host event to its handler.
    pub async fn dispatch(&self, event: Event) -> Result<EventOutcome, Error> {
        match event {
            Event::Install => {
                self.handle_install().await?;
                Ok(EventOutcome::Installed)
            }
            Event::Activate => {
                self.handle_activate().await?;
                Ok(EventOutcome::Activated)
            }
            Event::Fetch(request) => Ok(EventOutcome::Fetch(self.handle_fetch(request).await)),
        }
    }

    /// Install phase: request promotion, then precache the manifest.
    ///
    /// Promotion is requested up front regardless of the precache outcome;
    /// a failed precache leaves this worker uninstalled either way.
    pub async fn handle_install(&self) -> Result<(), Error> {
        self.control.skip_waiting().await;
        lifecycle::install(
            self.storage.as_ref(),
            self.network.as_ref(),
            &self.names.static_name,
            &self.precache,
        )
        .await
    }

    /// Activate phase: reap stale generations, then claim open views.
    ///
    /// Claiming waits for the reap pass so clients are never controlled by
    /// a worker whose stale generations still linger.
    pub async fn handle_activate(&self) -> Result<(), Error> {
        lifecycle::activate(self.storage.as_ref(), &self.names).await?;
        self.control.claim_clients().await;
        Ok(())
    }

    /// Fetch phase: classify and run the matching strategy.
    pub async fn handle_fetch(&self, request: Request) -> FetchOutcome {
        let Some(class) = classify::classify(&request, &self.policy) else {
            tracing::debug!(url = %request.url, "request outside worker scope, passing through");
            return FetchOutcome::PassThrough;
        };

        let response = match class {
            RequestClass::Navigation => {
                strategy::navigation(
                    self.storage.as_ref(),
                    self.network.as_ref(),
                    &self.names.static_name,
                    &self.offline,
                    &request,
                )
                .await
            }
            RequestClass::StaticAsset => {
                strategy::static_asset(
                    self.storage.as_ref(),
                    self.network.as_ref(),
                    &self.names.runtime_name,
                    &request,
                )
                .await
            }
            RequestClass::Other => {
                strategy::other(
                    self.storage.as_ref(),
                    self.network.as_ref(),
                    &self.names.runtime_name,
                    &request,
                )
                .await
            }
        };

        FetchOutcome::Respond(response)
    }
}
