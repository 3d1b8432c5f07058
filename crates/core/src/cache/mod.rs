//! SQLite-backed durable cache stores.
//!
//! This module provides the persistent key-value stores backing the
//! agent's cache generations, using SQLite with async access via
//! tokio-rusqlite. It supports:
//!
//! - Multiple named stores in one database (one per cache generation)
//! - Content-addressed entry keys (SHA-256 of method + URL)
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod keys;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
pub use keys::entry_key;
