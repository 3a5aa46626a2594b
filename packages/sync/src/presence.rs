//! Presence tracking with staleness-derived liveness.
//!
//! A [`PresenceTracker`] aggregates three inputs for one group: the roster
//! snapshot from the initial HTTP load, live join/leave events from the
//! channel socket, and the process-wide [`PresenceBus`] signal. The online
//! predicate is always recomputed from the staleness rule; a stale
//! `is_online = true` flag never wins (see [`UserPresence::is_online_at`]).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use manabi_shared::dto::http::MemberDto;
use manabi_shared::dto::websocket::UserStatusKind;
use manabi_shared::time::Clock;

use crate::domain::{PresenceUpdate, UserId, UserPresence};

/// Default capacity of the cross-cutting presence channel
const BUS_CAPACITY: usize = 256;

/// Process-wide publish/subscribe channel for presence updates.
///
/// Established once per application session, independent of any single
/// group; any number of trackers may attach. Updates are last-write-wins
/// per user id, so a lagged subscriber skipping old updates is safe.
#[derive(Debug, Clone)]
pub struct PresenceBus {
    tx: broadcast::Sender<PresenceUpdate>,
}

impl PresenceBus {
    /// Create a bus with the default capacity
    pub fn new() -> Self {
        Self {
            tx: broadcast::channel(BUS_CAPACITY).0,
        }
    }

    /// Publish an authoritative presence update to all subscribers
    pub fn publish(&self, update: PresenceUpdate) {
        // No subscribers is fine; the update is simply dropped
        let _ = self.tx.send(update);
    }

    /// Subscribe to future presence updates
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceUpdate> {
        self.tx.subscribe()
    }
}

impl Default for PresenceBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks per-user presence for one group and answers `is_online`.
///
/// Records are never deleted, only overwritten (last-write-wins per user
/// id); lifetime is the session lifetime of the containing view.
pub struct PresenceTracker {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<UserId, UserPresence>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl PresenceTracker {
    /// Create an empty tracker using the given clock for staleness checks
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
            listener: Mutex::new(None),
        }
    }

    /// Apply a wholesale roster snapshot.
    ///
    /// Overwrites the presence hint for every member in the snapshot;
    /// members known from earlier events but absent from the snapshot are
    /// kept as-is.
    pub fn apply_roster(&self, members: &[MemberDto]) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for member in members {
            entries.insert(
                member.id,
                UserPresence {
                    user_id: member.id,
                    is_online: member.is_online,
                    last_activity: member.last_activity,
                },
            );
        }
    }

    /// Apply a live join/leave event from the channel socket.
    ///
    /// These events carry no timestamp, so last activity is stamped with
    /// the current clock reading.
    pub fn apply_status(&self, user_id: UserId, status: UserStatusKind) {
        let now = self.clock.now_millis();
        let is_online = matches!(status, UserStatusKind::Joined);

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            user_id,
            UserPresence {
                user_id,
                is_online,
                last_activity: Some(now),
            },
        );

        tracing::debug!(
            "Presence event: user {} is now {}",
            user_id,
            if is_online { "online" } else { "offline" }
        );
    }

    /// Apply a cross-cutting presence update.
    ///
    /// The signal is authoritative and more complete than socket events (it
    /// carries an explicit timestamp), so both fields overwrite verbatim.
    pub fn apply_update(&self, update: PresenceUpdate) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            update.user_id,
            UserPresence {
                user_id: update.user_id,
                is_online: update.is_online,
                last_activity: Some(update.last_activity),
            },
        );
    }

    /// Whether the user is currently considered reachable.
    ///
    /// Always recomputed from the staleness rule; unknown users are
    /// offline (fail-closed).
    pub fn is_online(&self, user_id: UserId) -> bool {
        let now = self.clock.now_millis();
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&user_id)
            .map(|presence| presence.is_online_at(now))
            .unwrap_or(false)
    }

    /// Read-only snapshot of the tracked records, sorted by user id
    pub fn snapshot(&self) -> Vec<UserPresence> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<UserPresence> = entries.values().cloned().collect();
        records.sort_by_key(|presence| presence.user_id);
        records
    }

    /// Attach a tracker to the process-wide presence bus.
    ///
    /// Spawns a forwarding task holding only a weak reference, so dropping
    /// the tracker ends the subscription. Attaching twice replaces the
    /// previous subscription.
    pub fn attach(tracker: &Arc<Self>, bus: &PresenceBus) {
        let mut rx = bus.subscribe();
        let weak = Arc::downgrade(tracker);

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(update) => {
                        let Some(tracker) = Weak::upgrade(&weak) else {
                            break;
                        };
                        tracker.apply_update(update);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Last-write-wins makes skipping old updates safe
                        tracing::warn!("Presence bus lagged, skipped {} updates", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let mut listener = tracker
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = listener.replace(handle) {
            previous.abort();
        }
    }

    /// Detach from the presence bus and stop the forwarding task
    pub fn close(&self) {
        let mut listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = listener.take() {
            handle.abort();
        }
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        self.close();
    }
}
