//! Unified error types for the harbor offline agent.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Install could not populate the full asset manifest.
    #[error("INSTALL_FAILED: {0}")]
    Install(String),

    /// Network request failed (offline, DNS, timeout, server unreachable).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Response body exceeded the configured byte cap.
    #[error("FETCH_TOO_LARGE: {0}")]
    TooLarge(String),

    /// Invalid URL or method.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Operation attempted in the wrong lifecycle state.
    #[error("STATE_ERROR: {0}")]
    State(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
