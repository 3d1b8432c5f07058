//! Registry of controlled pages and worker→page messaging.
//!
//! The registry is shared by every worker generation in the process: during
//! an update rollout the old and new generation both hold a handle, and the
//! new one seizes the old one's pages at activation.

use crate::messages::WorkerMessage;
use crate::worker::WorkerId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Unique identifier for a connected page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// One connected page session.
#[derive(Debug)]
struct PageClient {
    url: String,
    sender: mpsc::UnboundedSender<WorkerMessage>,
    controller: Option<WorkerId>,
}

/// Registry handle shared across worker generations.
pub type SharedRegistry = Arc<Mutex<ClientRegistry>>;

/// The set of pages currently reachable by workers in this process.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, PageClient>,
    superseded: HashMap<WorkerId, Arc<AtomicBool>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Register a worker generation. The flag flips once a newer generation
    /// claims this worker's pages.
    pub(crate) fn register_worker(&mut self, id: WorkerId, flag: Arc<AtomicBool>) {
        self.superseded.insert(id, flag);
    }

    /// Connect a page. Returns its id and the receiving end of the
    /// worker→page channel. New pages start uncontrolled.
    pub fn connect(&mut self, url: &str) -> (ClientId, mpsc::UnboundedReceiver<WorkerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = ClientId::next();
        self.clients
            .insert(id, PageClient { url: url.to_string(), sender, controller: None });
        (id, receiver)
    }

    /// Disconnect a page (tab closed). Returns false if it was unknown.
    pub fn disconnect(&mut self, id: ClientId) -> bool {
        self.clients.remove(&id).is_some()
    }

    /// Seize control of every connected page for `worker`.
    ///
    /// Returns the number of pages taken over from a different worker
    /// generation; those generations' superseded flags are flipped.
    pub(crate) fn claim_all(&mut self, worker: WorkerId) -> usize {
        let mut taken_over = 0;
        for client in self.clients.values_mut() {
            if let Some(previous) = client.controller
                && previous != worker
            {
                taken_over += 1;
                if let Some(flag) = self.superseded.get(&previous) {
                    flag.store(true, Ordering::Relaxed);
                }
            }
            client.controller = Some(worker);
        }
        taken_over
    }

    pub fn controller_of(&self, id: ClientId) -> Option<WorkerId> {
        self.clients.get(&id).and_then(|c| c.controller)
    }

    /// Pages currently controlled by the given worker.
    pub fn controlled_by(&self, worker: WorkerId) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|(_, c)| c.controller == Some(worker))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn client_url(&self, id: ClientId) -> Option<&str> {
        self.clients.get(&id).map(|c| c.url.as_str())
    }

    /// Send to one page. Returns false if the page is gone; a vanished
    /// receiver is not an error.
    pub fn send(&self, id: ClientId, message: WorkerMessage) -> bool {
        match self.clients.get(&id) {
            Some(client) => client.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Enumerate-then-send to every page the worker controls. Membership is
    /// rediscovered on each call; there is no persistent subscription list.
    pub(crate) fn broadcast(&self, worker: WorkerId, message: WorkerMessage) -> usize {
        self.clients
            .values()
            .filter(|c| c.controller == Some(worker))
            .filter(|c| c.sender.send(message).is_ok())
            .count()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
