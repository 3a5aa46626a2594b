//! Domain model for the synchronization core.
//!
//! This module contains the entities owned by the core plus pure logic that
//! implements business rules without side effects, making them easy to test.
//! Conversions from wire DTOs live here as well, next to the types they
//! produce.

use manabi_shared::dto::http::MemberDto;
use manabi_shared::dto::websocket::ChatMessageDto;

use crate::config::STALE_THRESHOLD_MILLIS;

/// User identifier assigned by the platform
pub type UserId = i64;

/// Message identifier assigned by the chat server
pub type MessageId = i64;

/// Credentials supplied by the authentication collaborator.
///
/// The token is an opaque bearer credential; the core appends it to the
/// channel handshake and never inspects its contents.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub token: String,
    pub user_id: UserId,
}

/// Presence record for one user.
///
/// `is_online` is a hint from the last explicit event; actual liveness must
/// always be recomputed against the staleness threshold via
/// [`UserPresence::is_online_at`]. Records are never deleted, only
/// overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPresence {
    pub user_id: UserId,
    pub is_online: bool,
    /// Unix millis of the last observed activity; `None` means the user has
    /// never produced a presence event
    pub last_activity: Option<i64>,
}

impl UserPresence {
    /// Compute actual liveness at the given instant.
    ///
    /// A stale `is_online = true` flag never wins: a user whose last
    /// activity is older than the threshold is offline even if no `left`
    /// event was ever delivered. A user with no recorded activity is
    /// offline (fail-closed).
    pub fn is_online_at(&self, now_millis: i64) -> bool {
        match self.last_activity {
            Some(last_activity) => {
                self.is_online && now_millis - last_activity <= STALE_THRESHOLD_MILLIS
            }
            None => false,
        }
    }
}

/// One member of the group roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub id: UserId,
    pub display_name: String,
    pub is_current_user: bool,
}

impl GroupMember {
    /// Build a roster member from its snapshot row
    pub fn from_dto(dto: &MemberDto, self_user_id: UserId) -> Self {
        Self {
            id: dto.id,
            display_name: dto.display_name.clone(),
            is_current_user: dto.id == self_user_id,
        }
    }
}

/// A chat message as rendered to the view layer.
///
/// Immutable once created; for any message id at most one instance ever
/// appears in the rendered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub text: String,
    pub created_at: i64,
    pub is_current_user: bool,
}

impl ChatMessage {
    /// Build a rendered message from its wire shape
    pub fn from_dto(dto: ChatMessageDto, self_user_id: UserId) -> Self {
        Self {
            id: dto.id,
            sender_id: dto.sender_id,
            sender_name: dto.sender_name,
            text: dto.text,
            created_at: dto.created_at,
            is_current_user: dto.sender_id == self_user_id,
        }
    }
}

/// Cross-cutting presence signal payload.
///
/// Published process-wide on the [`crate::presence::PresenceBus`],
/// independent of any single group. Considered authoritative: it carries an
/// explicit timestamp rather than "now" and overwrites the tracked record
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceUpdate {
    pub user_id: UserId,
    pub is_online: bool,
    pub last_activity: i64,
}
