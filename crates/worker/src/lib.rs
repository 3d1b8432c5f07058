//! The harbor background worker: cache lifecycle, request routing, and
//! the two competing response strategies.
//!
//! A [`Worker`] owns one cache generation. It installs by populating the
//! generation's store with the static asset manifest, activates by pruning
//! stale generations and claiming every open page, and from then on routes
//! each intercepted request to either the network-only or the cache-first
//! strategy.

pub mod clients;
pub mod lifecycle;
pub mod messages;
pub mod router;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod testutil;

pub use clients::{ClientId, ClientRegistry, SharedRegistry};
pub use lifecycle::{ActivateOutcome, LocalRegistration, Registration};
pub use messages::{PageMessage, WorkerMessage};
pub use router::{Route, classify, is_api_like};
pub use worker::{FetchOutcome, Worker, WorkerId, WorkerState};
