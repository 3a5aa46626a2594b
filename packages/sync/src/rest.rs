//! REST collaborator boundary.
//!
//! チャットの書き込みと初期スナップショットの取得はこの trait を通して
//! 行います。コアは trait にのみ依存し、HTTP の具体的な実装には依存しない
//! ため、テストではモックに差し替えられます（依存性の逆転）。

use async_trait::async_trait;

use manabi_shared::dto::http::{GroupSnapshotDto, PostMessageRequest};
use manabi_shared::dto::websocket::ChatMessageDto;

use crate::error::SyncError;

/// Authoritative-write and snapshot interface of the chat backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `POST /group-chat/{channel}`: submit a message, returning the
    /// canonical message with its server-assigned id
    async fn post_message(&self, channel: &str, text: &str) -> Result<ChatMessageDto, SyncError>;

    /// `GET /group-chat/{channel}`: fetch the initial group snapshot
    async fn fetch_snapshot(&self, channel: &str) -> Result<GroupSnapshotDto, SyncError>;
}

/// Production implementation over HTTP with a bearer token
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpChatApi {
    /// Create a client for the given API base URL
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn channel_url(&self, channel: &str) -> String {
        format!("{}/group-chat/{}", self.base_url, channel)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn post_message(&self, channel: &str, text: &str) -> Result<ChatMessageDto, SyncError> {
        let response = self
            .client
            .post(self.channel_url(channel))
            .bearer_auth(&self.token)
            .json(&PostMessageRequest {
                message: text.to_string(),
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<ChatMessageDto>().await?)
    }

    async fn fetch_snapshot(&self, channel: &str) -> Result<GroupSnapshotDto, SyncError> {
        let response = self
            .client
            .get(self.channel_url(channel))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<GroupSnapshotDto>().await?)
    }
}
