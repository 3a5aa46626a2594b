//! Error types for the synchronization core.
//!
//! Nothing here is fatal to the embedding application: transport and
//! protocol failures degrade to "operate without live updates", request
//! failures surface to the caller with no partial state.

use thiserror::Error;

/// Errors produced by the synchronization core
#[derive(Debug, Error)]
pub enum SyncError {
    /// Socket-level open/send failure; recovered via reconnect with backoff
    #[error("Transport error: {0}")]
    Transport(String),

    /// Unexpected frame shape; the offending frame is dropped
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// REST request failure; surfaced to the caller, no local state mutated
    #[error("Request failed: {0}")]
    Request(String),

    /// A send was attempted while the channel is not connected
    #[error("Not connected to the channel")]
    NotConnected,

    /// All reconnect attempts were used up; the session is degraded
    #[error("Reconnect attempts exhausted")]
    ExhaustedRetries,
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Request(e.to_string())
    }
}
