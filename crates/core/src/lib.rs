//! Core types and shared functionality for the harbor offline agent.
//!
//! This crate provides:
//! - Versioned cache identity and the static asset manifest
//! - Durable cache stores with SQLite backend
//! - Request/response types shared by the worker and strategies
//! - Configuration structures
//! - Unified error types

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod manifest;

pub use cache::{CacheDb, CachedResponse};
pub use config::AgentConfig;
pub use error::Error;
pub use http::{InterceptedRequest, Response, ResponseKind};
pub use identity::CacheIdentity;
pub use manifest::AssetManifest;
