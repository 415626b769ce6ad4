//! SQLite-backed generation store.
//!
//! One database holds every generation: a `generations` table for the
//! namespace and an `entries` table keyed by (generation, identity hash).
//! Deleting a generation cascades to its entries. WAL mode keeps concurrent
//! fetch-event tasks from blocking each other.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::rusqlite;
use tokio_rusqlite::{Connection, params};

use super::migrations;
use super::{CacheStorage, Generation};
use crate::Error;
use crate::model::{Request, Response};

/// SQLite generation store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Cloning shares the connection.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Storage(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Storage(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;
                 PRAGMA foreign_keys=ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Storage)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}

fn response_from_row(status: i64, headers_json: String, body: Vec<u8>) -> Result<Response, Error> {
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
    Ok(Response::new(status as u16, headers, Bytes::from(body)))
}

#[async_trait]
impl CacheStorage for SqliteStorage {
    async fn open_generation(&self, name: &str) -> Result<Arc<dyn Generation>, Error> {
        let generation = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![generation, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Arc::new(SqliteGeneration { conn: self.conn.clone(), name: name.to_string() }))
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at, name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let generation = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE name = ?1", params![generation])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = request.key();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(i64, String, Vec<u8>)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, headers_json, body FROM entries
                     WHERE key_hash = ?1
                     ORDER BY stored_at DESC LIMIT 1",
                )?;
                let result = stmt.query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)));
                match result {
                    Ok(parts) => Ok(Some(parts)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(|(status, headers_json, body)| response_from_row(status, headers_json, body))
            .transpose()
    }
}

/// A single named generation within the SQLite store.
pub struct SqliteGeneration {
    conn: Connection,
    name: String,
}

#[async_trait]
impl Generation for SqliteGeneration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let generation = self.name.clone();
        let key = request.key();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(i64, String, Vec<u8>)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, headers_json, body FROM entries
                     WHERE generation = ?1 AND key_hash = ?2",
                )?;
                let result = stmt.query_row(params![generation, key], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                });
                match result {
                    Ok(parts) => Ok(Some(parts)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(|(status, headers_json, body)| response_from_row(status, headers_json, body))
            .transpose()
    }

    async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let generation = self.name.clone();
        let key = request.key();
        let url = request.url.to_string();
        let status = response.status as i64;
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let body = response.body.to_vec();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (generation, key_hash, url, status, headers_json, body, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(generation, key_hash) DO UPDATE SET
                         url = excluded.url,
                         status = excluded.status,
                         headers_json = excluded.headers_json,
                         body = excluded.body,
                         stored_at = excluded.stored_at",
                    params![generation, key, url, status, headers_json, body, stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
