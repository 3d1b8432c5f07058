//! Install, activate, and message-driven lifecycle coordination.
//!
//! Install populates the new generation's store atomically; activate
//! prunes stale generations and seizes all open pages immediately rather
//! than waiting for the next navigation. Cleanup is started before pages
//! are claimed, but claiming does not wait for deletions to finish.

use crate::clients::ClientId;
use crate::messages::{PageMessage, WorkerMessage};
use crate::worker::{Worker, WorkerState};
use async_trait::async_trait;
use harbor_client::OutboundRequest;
use harbor_core::{Error, InterceptedRequest};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;

/// Handle to the platform registration backing this worker.
///
/// Running an update check means asking the host to look for a newer
/// worker script; completion says the check ran, not that anything was
/// found. A trait seam so embedders and tests can observe checks.
#[async_trait]
pub trait Registration: Send + Sync {
    async fn update(&self) -> Result<(), Error>;
}

/// In-process registration that acknowledges and counts update checks.
#[derive(Debug, Default)]
pub struct LocalRegistration {
    checks: AtomicU64,
}

impl LocalRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of update checks run so far.
    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Registration for LocalRegistration {
    async fn update(&self) -> Result<(), Error> {
        self.checks.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("registration update check ran");
        Ok(())
    }
}

/// Outcome of activation.
///
/// Stale-store deletion runs concurrently with everything after it; await
/// `cleanup` to observe its completion. Claiming never waits for it.
#[derive(Debug)]
pub struct ActivateOutcome {
    /// Deletion task; resolves to the number of stale stores deleted.
    pub cleanup: JoinHandle<usize>,
    /// Pages taken over from a previous worker generation.
    pub superseded: usize,
}

impl Worker {
    /// Install then immediately activate: the skip-waiting rollout.
    ///
    /// Trades a brief window of version skew across open pages for faster
    /// rollout of the new generation.
    pub async fn start(&mut self) -> Result<ActivateOutcome, Error> {
        self.install().await?;
        self.activate().await
    }

    /// Populate this generation's store with every manifest asset, fetched
    /// fresh from the origin.
    ///
    /// Atomic: any asset that cannot be fetched (or stored) deletes the
    /// partially populated store and fails the install, leaving the
    /// previous generation current. Not retried automatically.
    pub async fn install(&mut self) -> Result<(), Error> {
        if self.state != WorkerState::Installing {
            return Err(Error::State(format!("install requested while {:?}", self.state)));
        }

        let namespace = self.identity.namespace();
        self.db.open_store(&namespace).await?;

        for path in self.manifest.paths() {
            let url = self.base.join(path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            let request = InterceptedRequest::get(url.as_str());

            let response = match self.origin.fetch(&OutboundRequest::from_intercepted(&request)).await {
                Ok(response) if response.is_success() => response,
                Ok(response) => {
                    self.discard_partial(&namespace).await;
                    return Err(Error::Install(format!("asset {path} returned status {}", response.status)));
                }
                Err(err) => {
                    self.discard_partial(&namespace).await;
                    return Err(Error::Install(format!("asset {path} unfetchable: {err}")));
                }
            };

            if let Err(err) = self.db.put_response(&namespace, &request, &response).await {
                self.discard_partial(&namespace).await;
                return Err(err);
            }
        }

        tracing::info!(namespace = %namespace, assets = self.manifest.len(), "install complete");
        self.state = WorkerState::Waiting;
        Ok(())
    }

    async fn discard_partial(&self, namespace: &str) {
        if let Err(err) = self.db.delete_store(namespace).await {
            tracing::warn!(namespace = %namespace, error = %err, "failed to drop partial store");
        }
    }

    /// Delete stale generations, then claim every open page immediately.
    ///
    /// Deletion is started, not awaited: claiming never blocks on cleanup
    /// completing. At most the current generation's store survives among
    /// stores carrying this agent's naming prefix.
    pub async fn activate(&mut self) -> Result<ActivateOutcome, Error> {
        if self.state != WorkerState::Waiting {
            return Err(Error::State(format!("activate requested while {:?}", self.state)));
        }

        let stale: Vec<String> = self
            .db
            .store_names()
            .await?
            .into_iter()
            .filter(|name| self.identity.is_stale(name))
            .collect();

        let db = self.db.clone();
        let cleanup = tokio::spawn(async move {
            let mut deleted = 0usize;
            for name in stale {
                match db.delete_store(&name).await {
                    Ok(true) => {
                        tracing::info!(store = %name, "deleted stale cache");
                        deleted += 1;
                    }
                    Ok(false) => {}
                    Err(err) => tracing::warn!(store = %name, error = %err, "failed to delete stale cache"),
                }
            }
            deleted
        });

        let superseded = {
            let mut registry = self.registry.lock().await;
            registry.register_worker(self.id, self.superseded.clone());
            let superseded = registry.claim_all(self.id);
            if superseded > 0 {
                // Those pages were controlled by an older generation; tell
                // everyone so they can prompt for a reload.
                registry.broadcast(self.id, WorkerMessage::AppUpdated);
            }
            superseded
        };

        self.state = WorkerState::Active;
        tracing::info!(worker = ?self.id, superseded, "activated and claimed clients");

        Ok(ActivateOutcome { cleanup, superseded })
    }

    /// Handle one page→worker message.
    ///
    /// `CHECK_FOR_UPDATES` runs the registration's update routine and
    /// replies `UPDATE_CHECKED` to the requesting page only, once the
    /// check completes.
    pub async fn handle_message(&self, from: ClientId, message: PageMessage) -> Result<(), Error> {
        match message {
            PageMessage::CheckForUpdates => {
                self.registration.update().await?;
                let registry = self.registry.lock().await;
                registry.send(from, WorkerMessage::UpdateChecked);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ClientRegistry;
    use crate::testutil::{ScriptedOrigin, TEST_ORIGIN, build_worker};
    use harbor_core::{CacheDb, InterceptedRequest};
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_install_populates_exactly_the_manifest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let scripted = Arc::new(ScriptedOrigin::new());
        scripted.script_manifest();
        let registry = ClientRegistry::shared();
        let (mut worker, _) = build_worker(&db, &scripted, &registry, "v1.0.0");

        worker.install().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Waiting);

        let cached: HashSet<String> = db.keys(&worker.namespace()).await.unwrap().into_iter().collect();
        let expected: HashSet<String> = [
            format!("{TEST_ORIGIN}/"),
            format!("{TEST_ORIGIN}/index.html"),
            format!("{TEST_ORIGIN}/manifest.json"),
            format!("{TEST_ORIGIN}/icons/icon-192x192.svg"),
            format!("{TEST_ORIGIN}/icons/icon-512x512.svg"),
        ]
        .into_iter()
        .collect();
        assert_eq!(cached, expected);
    }

    #[tokio::test]
    async fn test_install_failure_leaves_no_partial_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let scripted = Arc::new(ScriptedOrigin::new());
        scripted.script_manifest();
        scripted.forget(&format!("{TEST_ORIGIN}/manifest.json"));
        let registry = ClientRegistry::shared();
        let (mut worker, _) = build_worker(&db, &scripted, &registry, "v1.0.0");

        let result = worker.install().await;
        assert!(matches!(result, Err(Error::Install(_))));
        assert_eq!(worker.state(), WorkerState::Installing);
        assert!(!db.store_names().await.unwrap().contains(&worker.namespace()));
    }

    #[tokio::test]
    async fn test_failed_install_keeps_previous_generation_active() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let scripted = Arc::new(ScriptedOrigin::new());
        scripted.script_manifest();
        let registry = ClientRegistry::shared();

        let (mut v1, _) = build_worker(&db, &scripted, &registry, "v1.0.0");
        v1.start().await.unwrap();

        scripted.forget(&format!("{TEST_ORIGIN}/icons/icon-512x512.svg"));
        let (mut v2, _) = build_worker(&db, &scripted, &registry, "v1.0.1");
        assert!(v2.start().await.is_err());

        // v1 still serves; its store was never touched.
        assert_eq!(v1.state(), WorkerState::Active);
        assert_eq!(db.entry_count(&v1.namespace()).await.unwrap(), 5);
        let outcome = v1
            .handle_fetch(&InterceptedRequest::get(format!("{TEST_ORIGIN}/index.html")))
            .await
            .unwrap();
        assert_eq!(outcome.response.status, 200);
    }

    #[tokio::test]
    async fn test_activation_prunes_stale_generations() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("app-cache-v0.9.0").await.unwrap();
        db.open_store("unrelated-cache").await.unwrap();

        let scripted = Arc::new(ScriptedOrigin::new());
        scripted.script_manifest();
        let registry = ClientRegistry::shared();
        let (mut worker, _) = build_worker(&db, &scripted, &registry, "v1.0.0");

        let outcome = worker.start().await.unwrap();
        assert_eq!(outcome.cleanup.await.unwrap(), 1);

        let names = db.store_names().await.unwrap();
        assert!(names.contains(&worker.namespace()));
        assert!(names.contains(&"unrelated-cache".to_string()));
        assert!(!names.contains(&"app-cache-v0.9.0".to_string()));
        // Exactly one store carries this agent's prefix.
        assert_eq!(names.iter().filter(|n| n.starts_with("app-cache")).count(), 1);
    }

    #[tokio::test]
    async fn test_activation_claims_open_pages_without_broadcast() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let scripted = Arc::new(ScriptedOrigin::new());
        scripted.script_manifest();
        let registry = ClientRegistry::shared();

        let (page, mut rx) = registry.lock().await.connect(&format!("{TEST_ORIGIN}/"));

        let (mut worker, _) = build_worker(&db, &scripted, &registry, "v1.0.0");
        let outcome = worker.start().await.unwrap();

        assert_eq!(outcome.superseded, 0);
        assert_eq!(registry.lock().await.controller_of(page), Some(worker.id()));
        // First generation: nothing to announce.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_new_generation_supersedes_and_broadcasts() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let scripted = Arc::new(ScriptedOrigin::new());
        scripted.script_manifest();
        let registry = ClientRegistry::shared();

        let (page, mut rx) = registry.lock().await.connect(&format!("{TEST_ORIGIN}/"));

        let (mut v1, _) = build_worker(&db, &scripted, &registry, "v1.0.0");
        v1.start().await.unwrap();

        let (mut v2, _) = build_worker(&db, &scripted, &registry, "v1.0.1");
        let outcome = v2.start().await.unwrap();

        assert_eq!(outcome.superseded, 1);
        assert_eq!(rx.try_recv().unwrap(), WorkerMessage::AppUpdated);
        assert_eq!(registry.lock().await.controller_of(page), Some(v2.id()));

        // The old generation is out: state, fetches, and its store.
        assert_eq!(v1.state(), WorkerState::Superseded);
        let result = v1
            .handle_fetch(&InterceptedRequest::get(format!("{TEST_ORIGIN}/index.html")))
            .await;
        assert!(matches!(result, Err(Error::State(_))));

        outcome.cleanup.await.unwrap();
        let names = db.store_names().await.unwrap();
        assert_eq!(names.iter().filter(|n| n.starts_with("app-cache")).count(), 1);
        assert!(names.contains(&v2.namespace()));
    }

    #[tokio::test]
    async fn test_update_check_replies_to_requester_only() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let scripted = Arc::new(ScriptedOrigin::new());
        scripted.script_manifest();
        let registry = ClientRegistry::shared();

        let (asker, mut asker_rx) = registry.lock().await.connect(&format!("{TEST_ORIGIN}/"));
        let (_other, mut other_rx) = registry.lock().await.connect(&format!("{TEST_ORIGIN}/settings"));

        let (mut worker, registration) = build_worker(&db, &scripted, &registry, "v1.0.0");
        worker.start().await.unwrap();

        worker.handle_message(asker, PageMessage::CheckForUpdates).await.unwrap();

        assert_eq!(registration.checks(), 1);
        assert_eq!(asker_rx.try_recv().unwrap(), WorkerMessage::UpdateChecked);
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_lifecycle_transitions_are_enforced() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let scripted = Arc::new(ScriptedOrigin::new());
        scripted.script_manifest();
        let registry = ClientRegistry::shared();
        let (mut worker, _) = build_worker(&db, &scripted, &registry, "v1.0.0");

        // Activate before install.
        assert!(matches!(worker.activate().await, Err(Error::State(_))));

        worker.install().await.unwrap();
        // Install twice.
        assert!(matches!(worker.install().await, Err(Error::State(_))));

        worker.activate().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Active);
    }
}
