//! HTTP API DTOs for the group-chat endpoints.
//!
//! `POST /group-chat/{channel}` submits a message and returns the canonical
//! [`ChatMessageDto`]; `GET /group-chat/{channel}` returns the initial
//! [`GroupSnapshotDto`] used to seed the message list and member roster.

use serde::{Deserialize, Serialize};

use super::websocket::ChatMessageDto;

/// Request body for `POST /group-chat/{channel}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMessageRequest {
    pub message: String,
}

/// Group metadata in the initial snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfoDto {
    pub id: i64,
    pub name: String,
}

/// One member row in the initial snapshot.
///
/// `last_activity` is `null` for members the server has never seen active;
/// consumers must treat such members as offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDto {
    pub id: i64,
    pub display_name: String,
    pub is_online: bool,
    pub last_activity: Option<i64>,
}

/// Response body for `GET /group-chat/{channel}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshotDto {
    pub group_info: GroupInfoDto,
    pub members: Vec<MemberDto>,
    pub messages: Vec<ChatMessageDto>,
}
