//! Shared test doubles for worker tests.

use crate::clients::SharedRegistry;
use crate::lifecycle::{LocalRegistration, Registration};
use crate::worker::Worker;
use async_trait::async_trait;
use harbor_client::{Origin, OutboundRequest};
use harbor_core::config::AgentConfig;
use harbor_core::{AssetManifest, CacheDb, Error, Response, ResponseKind};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const TEST_ORIGIN: &str = "https://app.example.com";

/// Scripted origin: canned responses by URL, fetch counters, and an
/// offline switch that fails every request.
#[derive(Default)]
pub struct ScriptedOrigin {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    fetches: AtomicUsize,
    no_store_fetches: AtomicUsize,
}

impl ScriptedOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a 200 same-origin response.
    pub fn ok(&self, url: &str, body: &[u8]) {
        self.respond_with(url, 200, ResponseKind::Basic, body);
    }

    pub fn respond_with(&self, url: &str, status: u16, kind: ResponseKind, body: &[u8]) {
        let response = Response {
            url: url.to_string(),
            status,
            kind,
            headers: vec![("Content-Type".to_string(), "text/html".to_string())],
            body: body.to_vec(),
        };
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn forget(&self, url: &str) {
        self.routes.lock().unwrap().remove(url);
    }

    /// Script every default manifest asset under [`TEST_ORIGIN`].
    pub fn script_manifest(&self) {
        for path in AssetManifest::default().paths() {
            let url = format!("{TEST_ORIGIN}{path}");
            let body = format!("asset {path}");
            self.ok(&url, body.as_bytes());
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn no_store_fetches(&self) -> usize {
        self.no_store_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Origin for ScriptedOrigin {
    async fn fetch(&self, request: &OutboundRequest) -> Result<Response, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if request
            .headers
            .iter()
            .any(|(name, value)| name.eq_ignore_ascii_case("cache-control") && value == "no-store")
        {
            self.no_store_fetches.fetch_add(1, Ordering::SeqCst);
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".to_string()));
        }

        self.routes
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .ok_or_else(|| Error::Network(format!("no route for {}", request.url)))
    }
}

/// Config pinned to [`TEST_ORIGIN`] with the default manifest.
pub fn test_config(version: &str) -> AgentConfig {
    AgentConfig {
        cache_name: "app-cache".to_string(),
        cache_version: version.to_string(),
        origin: TEST_ORIGIN.to_string(),
        ..Default::default()
    }
}

/// A worker wired to the shared test doubles.
pub fn build_worker(
    db: &CacheDb,
    scripted: &Arc<ScriptedOrigin>,
    registry: &SharedRegistry,
    version: &str,
) -> (Worker, Arc<LocalRegistration>) {
    let registration = Arc::new(LocalRegistration::new());
    let worker = Worker::new(
        &test_config(version),
        db.clone(),
        scripted.clone() as Arc<dyn Origin>,
        registration.clone() as Arc<dyn Registration>,
        registry.clone(),
    )
    .unwrap();
    (worker, registration)
}
