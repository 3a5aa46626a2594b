//! Configuration for the synchronization core.

use std::time::Duration;

/// Maximum age of a last-activity timestamp before a user is considered
/// offline regardless of their `is_online` flag. Shared by every presence
/// consumer so "online" means the same thing everywhere.
pub const STALE_THRESHOLD_MILLIS: i64 = 5 * 60 * 1000;

/// How long a typing indicator stays active without a follow-up signal
pub const TYPING_EXPIRY_MILLIS: i64 = 1_000;

/// How long a sent message id waits for its WebSocket echo before the REST
/// response is treated as authoritative
pub const ECHO_TTL_MILLIS: i64 = 5_000;

/// Keepalive ping interval while connected
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Reconnection policy for a channel socket
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Maximum number of reconnect attempts before giving up
    pub max_attempts: u32,
    /// Backoff delay for the first reconnect attempt (milliseconds)
    pub base_delay_ms: u64,
    /// Upper bound on the backoff delay (milliseconds)
    pub cap_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1_000,
            cap_delay_ms: 15_000,
        }
    }
}

/// What `send_message` does once reconnect attempts are exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedSendPolicy {
    /// Fail sends immediately with `ExhaustedRetries`
    Reject,
    /// Still attempt the REST write; only live updates are lost
    BestEffort,
}

/// Configuration for a chat session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub connection: ConnectionConfig,
    pub heartbeat_interval: Duration,
    pub echo_ttl_millis: i64,
    pub typing_expiry_millis: i64,
    pub degraded_send: DegradedSendPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            heartbeat_interval: HEARTBEAT_INTERVAL,
            echo_ttl_millis: ECHO_TTL_MILLIS,
            typing_expiry_millis: TYPING_EXPIRY_MILLIS,
            degraded_send: DegradedSendPolicy::BestEffort,
        }
    }
}
