//! Named store and cached-response CRUD operations.
//!
//! Stores are the durable unit of cache versioning: one store per
//! generation, created at install, dropped during the next generation's
//! activation. Entry writes are last-writer-wins UPSERTs; entries are
//! idempotent snapshots of network responses, not authoritative state.

use super::connection::CacheDb;
use super::keys::entry_key;
use crate::Error;
use crate::http::{InterceptedRequest, Response, ResponseKind};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// One cached response snapshot, keyed by method + URL within a named store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub kind: ResponseKind,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub fetched_at: String,
}

impl CachedResponse {
    /// Rebuild the response exactly as it was stored.
    pub fn to_response(&self) -> Response {
        Response {
            url: self.url.clone(),
            status: self.status,
            kind: self.kind,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

impl CacheDb {
    /// Open a store: create-if-absent, no-op when it already exists.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response snapshot for a request, creating the store if
    /// needed. Overwrites any previous entry for the same key.
    pub async fn put_response(&self, store: &str, request: &InterceptedRequest, response: &Response) -> Result<(), Error> {
        let store = store.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let key = entry_key(&request.method, &request.url);
        let method = request.method.clone();
        let url = request.url.clone();
        let status = response.status;
        let kind = response.kind.as_str();
        let headers_json = serde_json::to_string(&response.headers).unwrap_or_default();
        let body = response.body.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![store, now],
                )?;
                conn.execute(
                    "INSERT INTO entries (
                        store, key, method, url, status, kind, headers_json, body, fetched_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(store, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        kind = excluded.kind,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        fetched_at = excluded.fetched_at",
                    params![store, key, method, url, status, kind, headers_json, body, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the cached response for a request.
    ///
    /// Returns None on a miss; a missing store is just a miss, not an error.
    pub async fn match_request(&self, store: &str, request: &InterceptedRequest) -> Result<Option<CachedResponse>, Error> {
        let store = store.to_string();
        let key = entry_key(&request.method, &request.url);
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url, status, kind, headers_json, body, fetched_at
                     FROM entries WHERE store = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![store, key], |row| {
                    let kind: String = row.get(4)?;
                    let headers_json: String = row.get(5)?;
                    Ok(CachedResponse {
                        key: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get(3)?,
                        kind: ResponseKind::parse(&kind),
                        headers: serde_json::from_str(&headers_json).unwrap_or_default(),
                        body: row.get(6)?,
                        fetched_at: row.get(7)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Request URLs cached in a store, in insertion order.
    ///
    /// The durable analog of enumerating a platform cache's keys.
    pub async fn keys(&self, store: &str) -> Result<Vec<String>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE store = ?1 ORDER BY rowid")?;
                let urls = stmt
                    .query_map(params![store], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a store.
    pub async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of every store in the database, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY created_at, name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns true if the store existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every store whose name starts with `prefix`, except `keep`.
    ///
    /// Returns the number of deleted stores.
    pub async fn delete_stores_with_prefix(&self, prefix: &str, keep: Option<&str>) -> Result<u64, Error> {
        let pattern = format!("{prefix}%");
        let keep = keep.map(|s| s.to_string());
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let deleted = conn.execute(
                    "DELETE FROM stores WHERE name LIKE ?1 AND (?2 IS NULL OR name != ?2)",
                    params![pattern, keep],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
