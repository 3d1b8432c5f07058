//! JSON-shaped messages exchanged between the worker and controlled pages.

use serde::{Deserialize, Serialize};

/// Messages a page sends to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageMessage {
    /// Ask the worker to run a registration update check.
    CheckForUpdates,
}

/// Messages the worker sends to pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Reply to [`PageMessage::CheckForUpdates`], sent to the requesting
    /// page only. Means the check ran, not that a new version was found.
    UpdateChecked,
    /// Broadcast to every controlled page after a new worker generation
    /// takes over, so pages may prompt the user to reload.
    AppUpdated,
}
