//! Named cache generations over a persistent request→response store.
//!
//! This module provides the storage surface the worker talks to:
//!
//! - Open-or-create a named generation and read/write entries in it
//! - A single identity lookup across every generation the store holds
//! - Enumerate and delete generations (the reaper's primitives)
//!
//! The SQLite implementation uses tokio-rusqlite with WAL mode and
//! versioned migrations. Concurrent writers to the same key serialize in
//! SQLite; the last completed write wins.

pub mod hash;
pub mod migrations;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Error;
use crate::model::{Request, Response};

pub use sqlite::SqliteStorage;

/// The persistent store holding all cache generations.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation by name, creating it if absent.
    async fn open_generation(&self, name: &str) -> Result<Arc<dyn Generation>, Error>;

    /// All existing generation names, oldest first.
    async fn list_generations(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation and all its entries.
    ///
    /// Returns false if no such generation existed.
    async fn delete_generation(&self, name: &str) -> Result<bool, Error>;

    /// Look up a request across every generation by identity key.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;
}

/// A single named generation of request→response pairs.
#[async_trait]
pub trait Generation: Send + Sync {
    fn name(&self) -> &str;

    /// Look up a matching entry in this generation only.
    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Write an entry keyed by the request's identity. Overwrites any
    /// previous entry for the same key in this generation.
    async fn put(&self, request: &Request, response: &Response) -> Result<(), Error>;
}
