//! Outbound HTTP client for the harbor offline agent.
//!
//! This crate provides the fetch pipeline the worker's strategies issue
//! network requests through, plus URL canonicalization shared by cache
//! keying and request routing.

pub mod fetch;

pub use fetch::{FetchConfig, HttpOrigin, Origin, OutboundRequest, UrlError, canonicalize};
