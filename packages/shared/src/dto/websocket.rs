//! WebSocket frame DTOs.
//!
//! All frames are JSON objects discriminated by a `type` field. Frames the
//! server pushes to clients are [`ServerFrame`]; frames a client sends over
//! the socket are [`ClientFrame`]. The authoritative chat write path does
//! not go through the socket (it is an HTTP POST, see `dto::http`); the
//! socket only carries broadcasts and lightweight signals.

use serde::{Deserialize, Serialize};

/// Canonical chat message as assigned by the server.
///
/// The same shape appears in HTTP responses (POST result, snapshot) and in
/// `chat_message` broadcast frames, so dedup by `id` works across both paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    /// Server-assigned message id
    pub id: i64,
    /// User id of the sender
    pub sender_id: i64,
    /// Display name of the sender
    pub sender_name: String,
    /// Message body
    pub text: String,
    /// Unix timestamp when the server accepted the message (milliseconds)
    pub created_at: i64,
}

/// Presence transition carried by a `user_status` frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatusKind {
    Joined,
    Left,
}

/// Frames pushed by the server over the chat/presence socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Broadcast of a chat message (including the sender's own echo)
    ChatMessage { message: ChatMessageDto },
    /// A user joined or left the channel
    UserStatus {
        status: UserStatusKind,
        user_id: i64,
        username: String,
    },
    /// A user started or stopped typing
    TypingIndicator { user_id: i64, is_typing: bool },
    /// Keepalive response; accepted and otherwise ignored
    Pong,
}

/// Frames a client sends over the socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Typing indicator signal
    Typing { is_typing: bool },
    /// Keepalive probe
    Ping,
}
