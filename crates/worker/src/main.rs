//! abri worker entry point.
//!
//! This binary is the simulated host: it boots the worker through install
//! and activate, then turns stdin lines into fetch events. Logging goes to
//! stderr so the response summaries on stdout stay readable.
//!
//! Fetch events are written one per line as `<kind> <url-or-path>`, e.g.
//! `navigate /index.html` or `style portfolio.css`.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use abri_core::SqliteStorage;
use abri_core::config::AppConfig;
use abri_core::model::{Destination, Request};
use abri_client::net::{self, HttpNetwork, NetworkConfig};

mod lifecycle;
mod strategy;
#[cfg(test)]
mod testutil;
mod worker;

use worker::{Event, EventOutcome, FetchOutcome, HostControl, OfflineWorker};

/// Host control signals surfaced as log lines.
struct LogControl;

#[async_trait::async_trait]
impl HostControl for LogControl {
    async fn skip_waiting(&self) {
        tracing::info!("host asked to promote this worker immediately");
    }

    async fn claim_clients(&self) {
        tracing::info!("host asked to route open views through this worker");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_version, db = %config.db_path.display(), "starting abri worker");

    let storage = Arc::new(SqliteStorage::open(&config.db_path).await?);
    let network = Arc::new(HttpNetwork::new(NetworkConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        max_redirects: config.max_redirects,
    })?);
    let worker = OfflineWorker::new(&config, storage, network, Arc::new(LogControl))?;
    tracing::info!(
        static_generation = %worker.names().static_name,
        runtime_generation = %worker.names().runtime_name,
        "generations resolved"
    );

    worker.dispatch(Event::Install).await?;
    worker.dispatch(Event::Activate).await?;
    tracing::info!("worker active; reading fetch events from stdin");

    let base = config.scope()?;
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(request) = parse_event(&base, &line) else {
            if !line.trim().is_empty() {
                tracing::warn!(line = %line, "unrecognized fetch event");
            }
            continue;
        };

        let url = request.url.clone();
        match worker.dispatch(Event::Fetch(request)).await? {
            EventOutcome::Fetch(FetchOutcome::Respond(response)) => {
                println!("{url} -> {} ({} bytes)", response.status, response.body.len());
            }
            EventOutcome::Fetch(FetchOutcome::PassThrough) => {
                println!("{url} -> pass-through");
            }
            _ => {}
        }
    }

    Ok(())
}

/// Parse a `<kind> <url-or-path>` stdin line into a fetch request.
fn parse_event(base: &url::Url, line: &str) -> Option<Request> {
    let mut parts = line.split_whitespace();
    let kind = parts.next()?;
    let target = parts.next()?;

    let url = if target.contains("://") {
        net::canonicalize(target).ok()?
    } else {
        net::resolve(base, target).ok()?
    };

    match kind {
        "navigate" => Some(Request::navigation(url)),
        "style" => Some(Request::get(url, Destination::Style)),
        "script" => Some(Request::get(url, Destination::Script)),
        "image" => Some(Request::get(url, Destination::Image)),
        "font" => Some(Request::get(url, Destination::Font)),
        "other" => Some(Request::get(url, Destination::None)),
        _ => None,
    }
}
