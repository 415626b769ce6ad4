//! Install and activate phases.
//!
//! Install populates the static generation from the precache manifest;
//! activate reaps generations left over from previous versions. The host
//! awaits each phase to completion before moving on, so install failures
//! keep the new version from ever becoming controlling.

use abri_core::model::Request;
use abri_core::store::{CacheStorage, Generation};
use abri_core::{CacheNames, Error};
use abri_client::net::Network;

/// Precache every manifest entry into the static generation.
///
/// All entries are fetched before anything is written, so a failed install
/// leaves no partially populated generation behind. Any connectivity
/// failure or non-success status aborts the install.
///
/// # Errors
///
/// Returns `Error::Precache` when a manifest entry cannot be fetched, and
/// propagates store errors from the write phase.
pub async fn install(
    storage: &dyn CacheStorage,
    network: &dyn Network,
    static_name: &str,
    manifest: &[Request],
) -> Result<(), Error> {
    let mut fetched = Vec::with_capacity(manifest.len());
    for request in manifest {
        let response = network
            .fetch(request)
            .await
            .map_err(|e| Error::Precache(format!("{}: {e}", request.url)))?;
        if !response.is_success() {
            return Err(Error::Precache(format!("{}: status {}", request.url, response.status)));
        }
        fetched.push((request, response));
    }

    let generation = storage.open_generation(static_name).await?;
    for (request, response) in &fetched {
        generation.put(request, response).await?;
    }

    tracing::info!(generation = static_name, entries = fetched.len(), "precache complete");
    Ok(())
}

/// Reap generations that do not belong to the current version.
///
/// Both current generations are opened first so they exist (the runtime
/// generation possibly empty) once activation completes. Individual
/// deletion failures are logged and skipped; activation proceeds so the
/// new version becomes controlling regardless.
pub async fn activate(storage: &dyn CacheStorage, names: &CacheNames) -> Result<(), Error> {
    storage.open_generation(&names.static_name).await?;
    storage.open_generation(&names.runtime_name).await?;

    for name in storage.list_generations().await? {
        if names.is_live(&name) {
            continue;
        }
        match storage.delete_generation(&name).await {
            Ok(true) => tracing::info!(generation = %name, "reaped stale generation"),
            Ok(false) => {}
            Err(e) => tracing::warn!(generation = %name, error = %e, "failed to delete stale generation"),
        }
    }

    Ok(())
}
