//! Worker instance and its lifecycle state.

use crate::clients::SharedRegistry;
use crate::lifecycle::{LocalRegistration, Registration};
use crate::router::{self, Route};
use crate::strategy::{cache_first, network_only};
use harbor_client::{FetchConfig, HttpOrigin, Origin, canonicalize};
use harbor_core::config::AgentConfig;
use harbor_core::{AssetManifest, CacheDb, CacheIdentity, Error, InterceptedRequest, Response};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::task::JoinHandle;
use url::Url;

/// Unique id for one worker generation in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(u64);

impl WorkerId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Lifecycle states, modeled as an explicit tagged variant so the event
/// handlers can make illegal transitions unrepresentable: a worker that
/// has not activated cannot intercept requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Populating the cache store for this generation.
    Installing,
    /// Install finished; activation not yet requested.
    Waiting,
    /// Controlling pages and intercepting requests.
    Active,
    /// A newer generation has taken over this worker's pages.
    Superseded,
}

impl WorkerState {
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Active)
    }
}

/// The result of handling one intercepted request.
#[derive(Debug)]
pub struct FetchOutcome {
    pub response: Response,
    /// Background refresh task for a cache hit. Detached in production;
    /// tests await it to observe the cache write.
    pub refresh: Option<JoinHandle<()>>,
}

/// One worker generation: owns the current cache identity and drives the
/// install/activate/fetch/message events.
///
/// Old and new generations may run concurrently during an update rollout;
/// they share the cache database and the client registry.
pub struct Worker {
    pub(crate) id: WorkerId,
    pub(crate) identity: CacheIdentity,
    pub(crate) manifest: AssetManifest,
    pub(crate) base: Url,
    pub(crate) fallback_url: String,
    pub(crate) db: CacheDb,
    pub(crate) origin: Arc<dyn Origin>,
    pub(crate) registration: Arc<dyn Registration>,
    pub(crate) registry: SharedRegistry,
    pub(crate) state: WorkerState,
    pub(crate) superseded: Arc<AtomicBool>,
}

impl Worker {
    /// Create a worker for the configured cache generation. The worker
    /// starts in `Installing`; call [`Worker::start`] to roll it out.
    pub fn new(
        config: &AgentConfig,
        db: CacheDb,
        origin: Arc<dyn Origin>,
        registration: Arc<dyn Registration>,
        registry: SharedRegistry,
    ) -> Result<Self, Error> {
        let base = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let fallback_url = base
            .join(&config.offline_fallback)
            .map_err(|e| Error::InvalidUrl(e.to_string()))?
            .to_string();

        Ok(Self {
            id: WorkerId::next(),
            identity: config.identity(),
            manifest: config.manifest(),
            base,
            fallback_url,
            db,
            origin,
            registration,
            registry,
            state: WorkerState::Installing,
            superseded: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Convenience constructor wiring the production HTTP origin and an
    /// in-process registration from configuration. Opens (or creates) the
    /// cache database at the configured path.
    pub async fn from_config(config: &AgentConfig, registry: SharedRegistry) -> Result<Self, Error> {
        let db = CacheDb::open(&config.db_path).await?;
        let fetch = FetchConfig {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_bytes: config.max_bytes,
            ..Default::default()
        };
        let origin = Arc::new(HttpOrigin::new(&config.origin, fetch)?);
        Self::new(config, db, origin, Arc::new(LocalRegistration::new()), registry)
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Current lifecycle state. Supersession is observed through the flag
    /// the registry flips when a newer generation claims this worker's
    /// pages.
    pub fn state(&self) -> WorkerState {
        if self.superseded.load(Ordering::Relaxed) { WorkerState::Superseded } else { self.state }
    }

    /// The store name for this worker's cache generation.
    pub fn namespace(&self) -> String {
        self.identity.namespace()
    }

    /// Entry point for every intercepted request from a controlled page.
    ///
    /// Classifies the request exactly once and dispatches it to the
    /// matching strategy.
    ///
    /// # Errors
    ///
    /// Returns `STATE_ERROR` unless the worker is active, and propagates a
    /// terminal static-route failure (network down, no offline document).
    pub async fn handle_fetch(&self, request: &InterceptedRequest) -> Result<FetchOutcome, Error> {
        if !self.state().can_intercept_fetch() {
            return Err(Error::State(format!("cannot intercept fetch while {:?}", self.state())));
        }

        let url = canonicalize(&request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let request = InterceptedRequest::new(&request.method, url.as_str());

        match router::classify(&request.url) {
            Route::Dynamic => {
                let response = network_only::respond(self.origin.as_ref(), &request).await;
                Ok(FetchOutcome { response, refresh: None })
            }
            Route::Static => {
                let namespace = self.identity.namespace();
                let (response, refresh) =
                    cache_first::respond(&self.db, &self.origin, &namespace, &self.fallback_url, &request).await?;
                Ok(FetchOutcome { response, refresh })
            }
        }
    }
}
