//! Chat synchronization engine.
//!
//! A [`ChatSession`] owns the rendered message list for one group channel
//! and reconciles two sources: the REST write path (authoritative, returns
//! the canonical message) and the WebSocket broadcast path (at-least-once,
//! unordered, includes the sender's own echo). The pending-echo window
//! guarantees that every message id appears exactly once no matter how the
//! two paths interleave.
//!
//! The reconciliation rules live in the pure [`ChatState`] and take the
//! current time as input; the async shell around it only moves bytes and
//! timers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use manabi_shared::dto::websocket::{ChatMessageDto, ClientFrame, ServerFrame};
use manabi_shared::time::Clock;

use crate::config::{DegradedSendPolicy, SessionConfig};
use crate::connection::{ConnectionEvent, ConnectionManager, ConnectionState};
use crate::domain::{AuthContext, ChatMessage, GroupMember, UserId};
use crate::error::SyncError;
use crate::presence::PresenceTracker;
use crate::rest::ChatApi;

/// Pure reconciliation state: message list, pending-echo window, typing set.
///
/// All operations take the current time in Unix millis so expiry behavior
/// is deterministic and testable without timers.
struct ChatState {
    self_user_id: UserId,
    messages: Vec<ChatMessage>,
    /// Message ids sent locally, waiting for their broadcast echo;
    /// value is the expiry instant (millis)
    pending_echo: HashMap<i64, i64>,
    /// Users currently flagged as typing; value is the expiry instant
    typing: HashMap<UserId, i64>,
    echo_ttl_millis: i64,
    typing_expiry_millis: i64,
}

impl ChatState {
    fn new(self_user_id: UserId, echo_ttl_millis: i64, typing_expiry_millis: i64) -> Self {
        Self {
            self_user_id,
            messages: Vec::new(),
            pending_echo: HashMap::new(),
            typing: HashMap::new(),
            echo_ttl_millis,
            typing_expiry_millis,
        }
    }

    fn contains_message(&self, id: i64) -> bool {
        self.messages.iter().any(|message| message.id == id)
    }

    /// Record the canonical result of a successful local send.
    ///
    /// Appends the message and opens the pending-echo window for its id.
    /// If the broadcast echo raced ahead of the REST response the message
    /// is already rendered and nothing changes.
    fn record_sent(&mut self, dto: ChatMessageDto, now_millis: i64) -> bool {
        self.prune_pending(now_millis);

        if self.contains_message(dto.id) {
            return false;
        }

        self.pending_echo
            .insert(dto.id, now_millis + self.echo_ttl_millis);
        self.messages
            .push(ChatMessage::from_dto(dto, self.self_user_id));
        true
    }

    /// Apply an inbound `chat_message` broadcast; returns whether the
    /// message was appended.
    ///
    /// Exactly-once rule: a pending id is the echo of our own send (drop,
    /// close the window); an already-rendered id is a transport duplicate
    /// (drop); anything else is appended.
    fn apply_chat_message(&mut self, dto: ChatMessageDto, now_millis: i64) -> bool {
        self.prune_pending(now_millis);

        if self.pending_echo.remove(&dto.id).is_some() {
            return false;
        }
        if self.contains_message(dto.id) {
            return false;
        }

        self.messages
            .push(ChatMessage::from_dto(dto, self.self_user_id));
        true
    }

    /// Drop pending-echo entries past their TTL; the REST response is
    /// authoritative once the window closes
    fn prune_pending(&mut self, now_millis: i64) {
        self.pending_echo.retain(|_, expiry| *expiry > now_millis);
    }

    /// Apply an inbound typing indicator.
    ///
    /// The local expiry acts as a safety net against a missed stop signal;
    /// the current user is never tracked.
    fn apply_typing(&mut self, user_id: UserId, is_typing: bool, now_millis: i64) {
        if user_id == self.self_user_id {
            return;
        }

        if is_typing {
            self.typing
                .insert(user_id, now_millis + self.typing_expiry_millis);
        } else {
            self.typing.remove(&user_id);
        }
    }

    /// Users currently typing, expired entries pruned, sorted for
    /// consistent ordering
    fn typing_users(&mut self, now_millis: i64) -> Vec<UserId> {
        self.typing.retain(|_, expiry| *expiry > now_millis);
        let mut users: Vec<UserId> = self.typing.keys().copied().collect();
        users.sort_unstable();
        users
    }
}

struct SessionTasks {
    started: bool,
    pump: Option<JoinHandle<()>>,
    heartbeat: Option<JoinHandle<()>>,
    typing_stop: Option<JoinHandle<()>>,
}

/// Everything the frame pump needs, detached from the session itself
struct PumpContext {
    state: Arc<Mutex<ChatState>>,
    presence: Arc<PresenceTracker>,
    clock: Arc<dyn Clock>,
    degraded: Arc<AtomicBool>,
}

/// Synchronizes one group chat channel.
///
/// Owns the message list and typing set; consumers only ever receive
/// clones. Share behind an [`Arc`]; all methods take `&self`.
pub struct ChatSession {
    channel: String,
    auth: AuthContext,
    api: Arc<dyn ChatApi>,
    presence: Arc<PresenceTracker>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    connection: Arc<ConnectionManager>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<ConnectionEvent>>>,
    state: Arc<Mutex<ChatState>>,
    /// Set once reconnect attempts are exhausted; cleared on reconnect
    degraded: Arc<AtomicBool>,
    tasks: tokio::sync::Mutex<SessionTasks>,
}

impl ChatSession {
    /// Create a session for the given channel.
    ///
    /// The session stays inert until [`ChatSession::connect`] is called.
    pub fn new(
        channel: impl Into<String>,
        auth: AuthContext,
        api: Arc<dyn ChatApi>,
        presence: Arc<PresenceTracker>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let (connection, events_rx) = ConnectionManager::new(config.connection.clone());
        let state = ChatState::new(
            auth.user_id,
            config.echo_ttl_millis,
            config.typing_expiry_millis,
        );

        Self {
            channel: channel.into(),
            auth,
            api,
            presence,
            clock,
            config,
            connection: Arc::new(connection),
            events_rx: Mutex::new(Some(events_rx)),
            state: Arc::new(Mutex::new(state)),
            degraded: Arc::new(AtomicBool::new(false)),
            tasks: tokio::sync::Mutex::new(SessionTasks {
                started: false,
                pump: None,
                heartbeat: None,
                typing_stop: None,
            }),
        }
    }

    /// The connection manager owning the channel socket
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Open the channel socket and start the frame pump and keepalive.
    ///
    /// Idempotent: a second call is a no-op, so re-running view setup can
    /// never produce two sockets. This includes calls after
    /// [`ChatSession::close`]; a closed session stays closed.
    pub async fn connect(&self, ws_url: &str) {
        let mut tasks = self.tasks.lock().await;
        if tasks.started {
            tracing::debug!("connect() ignored: session already started");
            return;
        }
        tasks.started = true;

        self.connection.open(ws_url, &self.auth.token).await;

        let events_rx = self
            .events_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(events_rx) = events_rx {
            let context = PumpContext {
                state: self.state.clone(),
                presence: self.presence.clone(),
                clock: self.clock.clone(),
                degraded: self.degraded.clone(),
            };
            tasks.pump = Some(tokio::spawn(pump_events(context, events_rx)));
        }

        tasks.heartbeat = Some(tokio::spawn(heartbeat_loop(
            self.connection.clone(),
            self.config.heartbeat_interval,
        )));

        tracing::info!("Chat session started for channel '{}'", self.channel);
    }

    /// Fetch the initial snapshot, seed the message list and the presence
    /// roster, and return the member list for the view layer.
    pub async fn load_snapshot(&self) -> Result<Vec<GroupMember>, SyncError> {
        let snapshot = self.api.fetch_snapshot(&self.channel).await?;
        let now = self.clock.now_millis();

        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            for message in snapshot.messages {
                state.apply_chat_message(message, now);
            }
        }

        self.presence.apply_roster(&snapshot.members);

        Ok(snapshot
            .members
            .iter()
            .map(|member| GroupMember::from_dto(member, self.auth.user_id))
            .collect())
    }

    /// Submit a message through the authoritative REST path.
    ///
    /// On success the canonical message is appended optimistically and its
    /// id enters the pending-echo window. On failure nothing is mutated
    /// and the error is returned to the caller.
    pub async fn send_message(&self, text: &str) -> Result<(), SyncError> {
        if self.degraded.load(Ordering::SeqCst)
            && self.config.degraded_send == DegradedSendPolicy::Reject
        {
            return Err(SyncError::ExhaustedRetries);
        }

        let dto = self.api.post_message(&self.channel, text).await?;
        let now = self.clock.now_millis();

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.record_sent(dto, now) {
            tracing::debug!("Broadcast echo arrived before the send response");
        }

        Ok(())
    }

    /// Signal that the current user is typing.
    ///
    /// Sends `typing: true` on the transition from idle and debounces; one
    /// second without a further call sends `typing: false` automatically.
    pub async fn notify_typing(&self) -> Result<(), SyncError> {
        let mut tasks = self.tasks.lock().await;

        let idle = tasks
            .typing_stop
            .as_ref()
            .is_none_or(|handle| handle.is_finished());
        if idle {
            self.send_frame(&ClientFrame::Typing { is_typing: true })
                .await?;
        }

        // Restart the stop timer on every keystroke
        if let Some(handle) = tasks.typing_stop.take() {
            handle.abort();
        }

        let connection = self.connection.clone();
        let delay = Duration::from_millis(self.config.typing_expiry_millis.max(0) as u64);
        tasks.typing_stop = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match serde_json::to_string(&ClientFrame::Typing { is_typing: false }) {
                Ok(json) => {
                    if let Err(e) = connection.send(json).await {
                        tracing::debug!("Typing stop signal not sent: {}", e);
                    }
                }
                Err(e) => tracing::warn!("Failed to serialize typing stop: {}", e),
            }
        }));

        Ok(())
    }

    /// Read-only view of the rendered message list
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .messages
            .clone()
    }

    /// Users currently typing, excluding the current user
    pub fn typing_users(&self) -> Vec<UserId> {
        let now = self.clock.now_millis();
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .typing_users(now)
    }

    /// Whether reconnect attempts were exhausted and live updates stopped.
    ///
    /// Rendered messages stay intact in this mode; sends follow the
    /// configured [`DegradedSendPolicy`].
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Tear the session down: cancel the pump, keepalive and typing timer,
    /// then close the socket with the normal-closure code. Idempotent.
    ///
    /// A session is one-shot: once closed it cannot be reconnected, because
    /// the frame pump consumed the event stream. Create a new session for a
    /// new view lifetime.
    pub async fn close(&self) {
        let mut tasks = self.tasks.lock().await;
        for handle in [
            tasks.pump.take(),
            tasks.heartbeat.take(),
            tasks.typing_stop.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }

        self.connection.close("session closed").await;
        tracing::info!("Chat session closed for channel '{}'", self.channel);
    }

    async fn send_frame(&self, frame: &ClientFrame) -> Result<(), SyncError> {
        let json = serde_json::to_string(frame).map_err(|e| SyncError::Protocol(e.to_string()))?;
        self.connection.send(json).await
    }
}

/// Apply connection events to the session state.
///
/// A malformed frame is logged and dropped; it never terminates the pump.
async fn pump_events(
    context: PumpContext,
    mut events_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
) {
    while let Some(event) = events_rx.recv().await {
        match event {
            ConnectionEvent::Message(text) => match serde_json::from_str::<ServerFrame>(&text) {
                Ok(frame) => handle_frame(&context, frame),
                Err(e) => tracing::warn!("Dropping malformed frame: {}", e),
            },
            ConnectionEvent::Opened => {
                context.degraded.store(false, Ordering::SeqCst);
            }
            ConnectionEvent::Closed { code, reason } => {
                tracing::debug!("Channel closed: code={} reason={}", code, reason);
            }
            ConnectionEvent::Error(message) => {
                tracing::warn!("Channel error: {}", message);
            }
            ConnectionEvent::Exhausted => {
                context.degraded.store(true, Ordering::SeqCst);
                tracing::error!("Live updates lost: reconnect attempts exhausted");
            }
        }
    }
}

fn handle_frame(context: &PumpContext, frame: ServerFrame) {
    let now = context.clock.now_millis();

    match frame {
        ServerFrame::ChatMessage { message } => {
            let appended = context
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .apply_chat_message(message, now);
            if !appended {
                tracing::debug!("Dropped echoed or duplicate chat_message");
            }
        }
        ServerFrame::UserStatus {
            status,
            user_id,
            username,
        } => {
            tracing::debug!("user_status: {} ({:?})", username, status);
            context.presence.apply_status(user_id, status);
        }
        ServerFrame::TypingIndicator { user_id, is_typing } => {
            context
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .apply_typing(user_id, is_typing, now);
        }
        ServerFrame::Pong => {
            tracing::trace!("pong");
        }
    }
}

/// Keep intermediary proxies from closing an idle socket
async fn heartbeat_loop(connection: Arc<ConnectionManager>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        if connection.state() != ConnectionState::Connected {
            continue;
        }

        match serde_json::to_string(&ClientFrame::Ping) {
            Ok(json) => {
                if let Err(e) = connection.send(json).await {
                    tracing::debug!("Heartbeat skipped: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize ping: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use manabi_shared::time::ManualClock;

    use crate::config::{ECHO_TTL_MILLIS, TYPING_EXPIRY_MILLIS};
    use crate::rest::MockChatApi;

    const SELF_ID: UserId = 7;

    fn test_state() -> ChatState {
        ChatState::new(SELF_ID, ECHO_TTL_MILLIS, TYPING_EXPIRY_MILLIS)
    }

    fn message_dto(id: i64, sender_id: i64, text: &str) -> ChatMessageDto {
        ChatMessageDto {
            id,
            sender_id,
            sender_name: if sender_id == SELF_ID {
                "alice".to_string()
            } else {
                "bob".to_string()
            },
            text: text.to_string(),
            created_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_echo_within_ttl_is_deduplicated() {
        // テスト項目: 送信確認済みメッセージのエコーは TTL 内なら破棄される
        // given (前提条件):
        let mut state = test_state();
        let now = 1_000_000;
        state.record_sent(message_dto(42, SELF_ID, "hi"), now);

        // when (操作):
        let appended = state.apply_chat_message(message_dto(42, SELF_ID, "hi"), now + 200);

        // then (期待する結果):
        assert!(!appended);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].id, 42);
        assert_eq!(state.messages[0].text, "hi");
        assert!(state.messages[0].is_current_user);
    }

    #[test]
    fn test_duplicate_broadcast_is_ignored() {
        // テスト項目: at-least-once 配送による重複ブロードキャストは破棄される
        // given (前提条件):
        let mut state = test_state();
        let now = 1_000_000;
        state.apply_chat_message(message_dto(10, 8, "hello"), now);

        // when (操作):
        let appended = state.apply_chat_message(message_dto(10, 8, "hello"), now + 50);

        // then (期待する結果):
        assert!(!appended);
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn test_broadcast_from_other_user_is_appended() {
        // テスト項目: 他ユーザーのブロードキャストは is_current_user = false で追加される
        // given (前提条件):
        let mut state = test_state();

        // when (操作):
        let appended = state.apply_chat_message(message_dto(10, 8, "hello"), 1_000_000);

        // then (期待する結果):
        assert!(appended);
        assert!(!state.messages[0].is_current_user);
    }

    #[test]
    fn test_echo_after_ttl_expiry_is_still_single() {
        // テスト項目: TTL 失効後に届いたエコーも描画済みチェックで重複しない
        // given (前提条件):
        let mut state = test_state();
        let now = 1_000_000;
        state.record_sent(message_dto(42, SELF_ID, "hi"), now);

        // when (操作):
        let appended = state.apply_chat_message(message_dto(42, SELF_ID, "hi"), now + ECHO_TTL_MILLIS + 1);

        // then (期待する結果):
        assert!(!appended);
        assert_eq!(state.messages.len(), 1);
        assert!(state.pending_echo.is_empty());
    }

    #[test]
    fn test_broadcast_racing_ahead_of_send_response() {
        // テスト項目: REST 応答より先にブロードキャストが届いても 1 件のみ描画される
        // given (前提条件):
        let mut state = test_state();
        let now = 1_000_000;
        state.apply_chat_message(message_dto(42, SELF_ID, "hi"), now);

        // when (操作):
        let recorded = state.record_sent(message_dto(42, SELF_ID, "hi"), now + 100);

        // then (期待する結果):
        assert!(!recorded);
        assert_eq!(state.messages.len(), 1);
        assert!(state.messages[0].is_current_user);
    }

    #[test]
    fn test_expired_pending_entries_are_pruned_on_send() {
        // テスト項目: 受信のない静かなチャンネルでも失効したエコー待ちが送信時に掃除される
        // given (前提条件):
        let mut state = test_state();
        let now = 1_000_000;
        state.record_sent(message_dto(1, SELF_ID, "old"), now);

        // when (操作):
        state.record_sent(message_dto(2, SELF_ID, "new"), now + ECHO_TTL_MILLIS + 1);

        // then (期待する結果):
        assert_eq!(state.pending_echo.len(), 1);
        assert!(state.pending_echo.contains_key(&2));
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn test_messages_render_in_processing_order() {
        // テスト項目: メッセージは処理されたイベントの順序で描画される
        // given (前提条件):
        let mut state = test_state();
        let now = 1_000_000;

        // when (操作):
        state.record_sent(message_dto(3, SELF_ID, "first"), now);
        state.apply_chat_message(message_dto(1, 8, "second"), now + 10);
        state.apply_chat_message(message_dto(2, 9, "third"), now + 20);

        // then (期待する結果):
        let ids: Vec<i64> = state.messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_typing_start_expires_without_stop_signal() {
        // テスト項目: typing 開始後、停止シグナルなしでも 1 秒で自動失効する
        // given (前提条件):
        let mut state = test_state();
        let now = 1_000_000;
        state.apply_typing(8, true, now);
        assert_eq!(state.typing_users(now), vec![8]);

        // when (操作):
        let users = state.typing_users(now + TYPING_EXPIRY_MILLIS + 1);

        // then (期待する結果):
        assert!(users.is_empty());
    }

    #[test]
    fn test_typing_stop_signal_clears_entry() {
        // テスト項目: 明示的な停止シグナルで typing 状態が解除される
        // given (前提条件):
        let mut state = test_state();
        let now = 1_000_000;
        state.apply_typing(8, true, now);

        // when (操作):
        state.apply_typing(8, false, now + 100);

        // then (期待する結果):
        assert!(state.typing_users(now + 100).is_empty());
    }

    #[test]
    fn test_own_typing_indicator_is_excluded() {
        // テスト項目: 自分自身の typing イベントは公開セットに含まれない
        // given (前提条件):
        let mut state = test_state();
        let now = 1_000_000;

        // when (操作):
        state.apply_typing(SELF_ID, true, now);
        state.apply_typing(8, true, now);

        // then (期待する結果):
        assert_eq!(state.typing_users(now), vec![8]);
    }

    fn test_session(api: MockChatApi) -> ChatSession {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let presence = Arc::new(PresenceTracker::new(clock.clone()));
        ChatSession::new(
            "rust-study",
            AuthContext {
                token: "opaque-token".to_string(),
                user_id: SELF_ID,
            },
            Arc::new(api),
            presence,
            clock,
            SessionConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_send_message_appends_canonical_message() {
        // テスト項目: REST 送信成功時に正準メッセージが楽観的に追加される
        // given (前提条件):
        let mut api = MockChatApi::new();
        api.expect_post_message()
            .returning(|_, text| Ok(message_dto(42, SELF_ID, text)));
        let session = test_session(api);

        // when (操作):
        session.send_message("hi").await.unwrap();

        // then (期待する結果):
        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, 42);
        assert_eq!(messages[0].text, "hi");
        assert!(messages[0].is_current_user);
    }

    #[tokio::test]
    async fn test_send_message_failure_mutates_nothing() {
        // テスト項目: REST 送信失敗時はローカル状態が一切変化しない
        // given (前提条件):
        let mut api = MockChatApi::new();
        api.expect_post_message()
            .returning(|_, _| Err(SyncError::Request("server unreachable".to_string())));
        let session = test_session(api);

        // when (操作):
        let result = session.send_message("hi").await;

        // then (期待する結果):
        assert!(matches!(result, Err(SyncError::Request(_))));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_degraded_reject_policy_fails_sends() {
        // テスト項目: 再接続が尽きた後、Reject ポリシーでは送信が即座に失敗する
        // given (前提条件):
        let api = MockChatApi::new();
        let mut session = test_session(api);
        session.config.degraded_send = DegradedSendPolicy::Reject;
        session.degraded.store(true, Ordering::SeqCst);

        // when (操作):
        let result = session.send_message("hi").await;

        // then (期待する結果):
        assert!(matches!(result, Err(SyncError::ExhaustedRetries)));
    }

    #[tokio::test]
    async fn test_degraded_best_effort_still_sends() {
        // テスト項目: BestEffort ポリシーでは劣化モードでも REST 送信が行われる
        // given (前提条件):
        let mut api = MockChatApi::new();
        api.expect_post_message()
            .returning(|_, text| Ok(message_dto(43, SELF_ID, text)));
        let session = test_session(api);
        session.degraded.store(true, Ordering::SeqCst);

        // when (操作):
        let result = session.send_message("still here").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_notify_typing_fails_fast_when_not_connected() {
        // テスト項目: 未接続状態での typing 通知は NotConnected で即座に失敗する
        // given (前提条件):
        let session = test_session(MockChatApi::new());

        // when (操作):
        let result = session.notify_typing().await;

        // then (期待する結果):
        assert!(matches!(result, Err(SyncError::NotConnected)));
    }

    #[tokio::test]
    async fn test_load_snapshot_seeds_messages_and_roster() {
        // テスト項目: 初期スナップショットでメッセージとロスターが初期化される
        // given (前提条件):
        use manabi_shared::dto::http::{GroupInfoDto, GroupSnapshotDto, MemberDto};

        let mut api = MockChatApi::new();
        api.expect_fetch_snapshot().returning(|_| {
            Ok(GroupSnapshotDto {
                group_info: GroupInfoDto {
                    id: 1,
                    name: "rust-study".to_string(),
                },
                members: vec![
                    MemberDto {
                        id: SELF_ID,
                        display_name: "alice".to_string(),
                        is_online: true,
                        last_activity: Some(1_000_000),
                    },
                    MemberDto {
                        id: 8,
                        display_name: "bob".to_string(),
                        is_online: false,
                        last_activity: None,
                    },
                ],
                messages: vec![message_dto(1, 8, "hello"), message_dto(2, SELF_ID, "hi")],
            })
        });
        let session = test_session(api);

        // when (操作):
        let members = session.load_snapshot().await.unwrap();

        // then (期待する結果):
        assert_eq!(members.len(), 2);
        assert!(members[0].is_current_user);
        assert!(!members[1].is_current_user);
        assert_eq!(session.messages().len(), 2);
        assert!(session.presence.is_online(SELF_ID));
        assert!(!session.presence.is_online(8));
    }
}
