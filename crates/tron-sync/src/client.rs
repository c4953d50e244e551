//! Connection lifecycle manager and client facade.
//!
//! [`SyncClient`] owns the single logical connection: open, heartbeat,
//! detect failure, close, reconnect. A reconnect always fully closes the
//! prior transport before opening a new one; inbound frames are processed
//! to completion one at a time in arrival order; and both scheduled timers
//! (heartbeat, reconnect backoff) hang off one `CancellationToken` so
//! `disconnect()` tears everything down deterministically — no timer fires
//! after teardown.
//!
//! All state lives in instance fields and every cross-component reference
//! is constructor-injected; there are no globals.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tron_wire::{
    ClientCommand, CloseReason, Decoded, ServerEvent, TaskAction, decode_event, encode_command,
};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::outbox::{Outbox, chat_command};
use crate::policy::reconnect_delay;
use crate::reducer::{self, Effect};
use crate::state::{ConnectionState, ConversationSnapshot, OutboundMessage};
use crate::subscription::SubscriptionManager;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Supplies the bearer token used to establish the connection.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// A currently valid bearer token.
    async fn bearer_token(&self) -> Result<String>;
}

/// Supplies the initial conversation snapshot from the REST layer, used to
/// seed state before the live stream takes over.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Fetch the current snapshot for a conversation.
    async fn fetch(&self, conversation_id: &str) -> Result<ConversationSnapshot>;
}

/// Terminal connection failures observable by the UI.
///
/// Everything else (transport failures mid-stream, protocol anomalies) is
/// handled internally and never surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientNotice {
    /// The server rejected our credentials. Re-authenticate and `connect()`.
    AuthRejected,
    /// The reconnect attempt ceiling was exhausted. `connect()` to resume.
    RetriesExhausted,
}

/// How a connection attempt or live session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionEnd {
    /// Server closed with code 1000, or the session drained cleanly.
    Clean,
    /// Close code 4001 or an HTTP 401/403 during the handshake.
    AuthRejected,
    /// Anything else. Subject to the reconnect policy.
    Abnormal,
    /// `disconnect()` was called.
    Cancelled,
}

/// The realtime synchronization client.
///
/// One instance per UI session. Construct with [`SyncClient::new`], then
/// [`connect`](Self::connect); the connection task keeps the in-memory
/// conversation model consistent with the server until
/// [`disconnect`](Self::disconnect).
pub struct SyncClient {
    config: SyncConfig,
    credentials: Arc<dyn CredentialProvider>,
    snapshots: Arc<dyn SnapshotProvider>,
    outbox: Arc<Outbox>,
    subscriptions: Arc<SubscriptionManager>,
    snapshot: RwLock<Option<ConversationSnapshot>>,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    notice_tx: broadcast::Sender<ClientNotice>,
    /// Outbound channel into the live session, present only while one runs.
    session_tx: Mutex<Option<mpsc::Sender<ClientCommand>>>,
    /// The running connection task and its cancellation token.
    conn: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl SyncClient {
    /// Create a client. No connection is opened until [`connect`](Self::connect).
    pub fn new(
        config: SyncConfig,
        credentials: Arc<dyn CredentialProvider>,
        snapshots: Arc<dyn SnapshotProvider>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (notice_tx, _) = broadcast::channel(16);
        Self {
            config,
            credentials,
            snapshots,
            outbox: Arc::new(Outbox::new()),
            subscriptions: Arc::new(SubscriptionManager::new()),
            snapshot: RwLock::new(None),
            state_tx,
            state_rx,
            notice_tx,
            session_tx: Mutex::new(None),
            conn: Mutex::new(None),
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Start the connection task. Idempotent: a no-op while a task is
    /// already connecting, connected, or reconnecting.
    pub fn connect(self: &Arc<Self>) {
        let mut conn = self.conn.lock();
        if let Some((_, handle)) = conn.as_ref() {
            if !handle.is_finished() {
                debug!("connect() while already active, ignoring");
                return;
            }
        }
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(self).run(cancel.clone()));
        *conn = Some((cancel, task));
    }

    /// Close the connection and cancel all scheduled timers. Always leaves
    /// the client Disconnected; a later `connect()` resumes.
    pub async fn disconnect(&self) {
        let taken = self.conn.lock().take();
        if let Some((cancel, handle)) = taken {
            cancel.cancel();
            let _ = handle.await;
        }
        self.set_state(ConnectionState::Disconnected);
    }

    // ─── Observers ───────────────────────────────────────────────────────

    /// Watch the connection state.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// The connection state right now.
    pub fn current_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Subscribe to terminal-failure notices.
    pub fn notices(&self) -> broadcast::Receiver<ClientNotice> {
        self.notice_tx.subscribe()
    }

    /// A clone of the active conversation model, if one is selected.
    pub fn snapshot(&self) -> Option<ConversationSnapshot> {
        self.snapshot.read().clone()
    }

    /// Read-only projection of the outbound delivery queue. The UI renders
    /// message delivery state from these statuses and nothing else.
    pub fn outbox_messages(&self) -> Vec<OutboundMessage> {
        self.outbox.messages()
    }

    // ─── Conversation selection ──────────────────────────────────────────

    /// Switch to a conversation: seed its snapshot from the REST layer,
    /// replace local state wholesale, and move the subscription.
    pub async fn select_conversation(&self, conversation_id: &str) -> Result<()> {
        let seeded = self.snapshots.fetch(conversation_id).await?;
        *self.snapshot.write() = Some(seeded);
        for command in self.subscriptions.select(conversation_id) {
            match self.direct_send(command) {
                Ok(()) => {}
                // Not connected is fine: the subscription is re-issued on
                // the next Connected edge.
                Err(SyncError::NotConnected) => {
                    debug!(conversation_id, "subscription deferred until connected");
                }
                Err(e) => warn!(conversation_id, error = %e, "subscription command dropped"),
            }
        }
        Ok(())
    }

    // ─── Outbound operations ─────────────────────────────────────────────

    /// Submit a user chat message.
    ///
    /// The message is enqueued with status `Sending` and transmitted
    /// immediately when a session is live; otherwise it waits for the next
    /// Connected edge. Returns the queue entry (its `id` is the
    /// acknowledgment key).
    pub fn send_chat(
        &self,
        conversation_id: impl Into<String>,
        project_id: Option<String>,
        content: impl Into<String>,
    ) -> OutboundMessage {
        let message = self.outbox.enqueue(conversation_id, project_id, content);
        self.transmit_queued(&message.id);
        message
    }

    /// Retry a failed message. The same id is retransmitted, so the server
    /// treats redelivery as at-most-once-effective.
    pub fn retry_message(&self, message_id: &str) -> bool {
        if self.outbox.retry(message_id).is_none() {
            return false;
        }
        self.transmit_queued(message_id);
        true
    }

    /// Dismiss a failed message, removing it from the queue.
    pub fn dismiss_failed(&self, message_id: &str) {
        self.outbox.dismiss(message_id);
    }

    /// Respond to a live continuation request: `true` authorizes more
    /// iterations, `false` cancels the task. Clears the request.
    pub fn respond_continuation(&self, approve: bool) -> Result<()> {
        let conversation_id = self
            .subscriptions
            .active()
            .ok_or(SyncError::NoConversation)?;
        let live = self
            .snapshot
            .read()
            .as_ref()
            .is_some_and(|s| s.continuation.is_some());
        if !live {
            return Ok(());
        }
        let action = if approve {
            TaskAction::Resume
        } else {
            TaskAction::Cancel
        };
        self.direct_send(ClientCommand::TaskControl {
            action,
            conversation_id,
        })?;
        if let Some(snapshot) = self.snapshot.write().as_mut() {
            snapshot.continuation = None;
        }
        Ok(())
    }

    /// Control the running task in the active conversation.
    pub fn task_control(&self, action: TaskAction) -> Result<()> {
        let conversation_id = self
            .subscriptions
            .active()
            .ok_or(SyncError::NoConversation)?;
        self.direct_send(ClientCommand::TaskControl {
            action,
            conversation_id,
        })
    }

    /// Append a note to the active conversation without starting a turn.
    ///
    /// Direct send: unlike `chat` this carries no idempotency key, so it is
    /// rejected rather than queued while disconnected.
    pub fn add_message(&self, content: impl Into<String>) -> Result<()> {
        let conversation_id = self
            .subscriptions
            .active()
            .ok_or(SyncError::NoConversation)?;
        self.direct_send(ClientCommand::AddMessage {
            content: content.into(),
            conversation_id,
        })
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "connection state");
        }
    }

    fn notify(&self, notice: ClientNotice) {
        let _ = self.notice_tx.send(notice);
    }

    /// Hand a command to the live session, if any.
    fn direct_send(&self, command: ClientCommand) -> Result<()> {
        let guard = self.session_tx.lock();
        let tx = guard.as_ref().ok_or(SyncError::NotConnected)?;
        tx.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SyncError::Busy,
            mpsc::error::TrySendError::Closed(_) => SyncError::NotConnected,
        })
    }

    /// Transmit a queued `Sending` entry through the live session, if any.
    ///
    /// The entry is claimed under the queue lock before transmission, so the
    /// opening drain of a session starting concurrently cannot pick it up a
    /// second time. With no live session the entry simply stays queued for
    /// the next Connected edge.
    fn transmit_queued(&self, message_id: &str) {
        let guard = self.session_tx.lock();
        let Some(tx) = guard.as_ref() else {
            debug!(message_id, "queued while disconnected");
            return;
        };
        let Some(message) = self.outbox.claim(message_id) else {
            // Already claimed by the opening drain of this session.
            return;
        };
        if tx.try_send(chat_command(&message, None)).is_err() {
            self.outbox.release(message_id);
            debug!(message_id, "session channel unavailable, left queued");
        }
    }

    /// Connection task body: connect, run the session, apply the reconnect
    /// policy, repeat. Exits only on clean close, terminal failure,
    /// exhausted retries, or cancellation.
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.set_state(ConnectionState::Connecting);
            let end = self.connect_once(&cancel, &mut attempt).await;
            match end {
                SessionEnd::Clean | SessionEnd::Cancelled => break,
                SessionEnd::AuthRejected => {
                    self.notify(ClientNotice::AuthRejected);
                    break;
                }
                SessionEnd::Abnormal => {
                    if attempt >= self.config.max_reconnect_attempts {
                        warn!(attempt, "reconnect attempts exhausted");
                        self.notify(ClientNotice::RetriesExhausted);
                        break;
                    }
                    let delay = reconnect_delay(
                        attempt,
                        self.config.reconnect_base_delay_ms,
                        self.config.reconnect_max_delay_ms,
                    );
                    attempt += 1;
                    info!(attempt, ?delay, "reconnecting");
                    self.set_state(ConnectionState::Reconnecting);
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = cancel.cancelled() => break,
                    }
                }
            }
        }
        *self.session_tx.lock() = None;
        self.set_state(ConnectionState::Disconnected);
    }

    /// One connection attempt: handshake, then the session loop.
    async fn connect_once(&self, cancel: &CancellationToken, attempt: &mut u32) -> SessionEnd {
        let token = match self.credentials.bearer_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "credential provider failed");
                return SessionEnd::AuthRejected;
            }
        };
        let url = compose_url(&self.config.url, &token);

        let connected = tokio::select! {
            result = connect_async(url.as_str()) => result,
            () = cancel.cancelled() => return SessionEnd::Cancelled,
        };
        match connected {
            Ok((ws, _response)) => {
                // Successful open resets the attempt counter.
                *attempt = 0;
                self.run_session(ws, cancel).await
            }
            Err(e) if is_auth_rejection(&e) => {
                warn!("authentication rejected during handshake");
                SessionEnd::AuthRejected
            }
            Err(e) => {
                warn!(error = %e, "connection attempt failed");
                SessionEnd::Abnormal
            }
        }
    }

    /// The live session loop: heartbeat ticks, outbound commands, inbound
    /// frames, cancellation. Frames are handled strictly sequentially.
    async fn run_session(&self, ws: WsStream, cancel: &CancellationToken) -> SessionEnd {
        let (mut sink, mut source) = ws.split();
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<ClientCommand>(self.config.command_buffer);
        *self.session_tx.lock() = Some(cmd_tx);
        self.set_state(ConnectionState::Connected);

        // The Connecting→Connected edge: re-issue the subscription, then
        // drain the queue in FIFO order. The drain claims each entry, and a
        // concurrent `send_chat` claims before it transmits, so even with
        // both paths racing on this edge a message crosses the wire at most
        // once per session.
        let mut opening = Vec::new();
        if let Some(subscribe) = self.subscriptions.resubscribe() {
            opening.push(subscribe);
        }
        for message in self.outbox.drain_for_send() {
            opening.push(chat_command(&message, None));
        }
        for command in opening {
            if let Err(e) = send_command(&mut sink, &command).await {
                warn!(error = %e, "send failed while draining queue");
                *self.session_tx.lock() = None;
                self.outbox.reset_in_flight();
                return SessionEnd::Abnormal;
            }
        }

        let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval());
        // The first tick completes immediately; the handshake just happened
        // so skip it.
        let _ = heartbeat.tick().await;

        let end = loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break SessionEnd::Cancelled;
                }
                _ = heartbeat.tick() => {
                    if let Err(e) = send_command(&mut sink, &ClientCommand::Ping).await {
                        warn!(error = %e, "heartbeat send failed");
                        break SessionEnd::Abnormal;
                    }
                }
                command = cmd_rx.recv() => {
                    // The sender lives in self.session_tx for the whole
                    // session, so recv() cannot yield None here.
                    let Some(command) = command else {
                        break SessionEnd::Abnormal;
                    };
                    if let Err(e) = send_command(&mut sink, &command).await {
                        warn!(error = %e, command = command.kind(), "send failed");
                        break SessionEnd::Abnormal;
                    }
                }
                frame = source.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => self.handle_frame(&text),
                        Some(Ok(Message::Close(close))) => {
                            let code = close.map(|f| u16::from(f.code));
                            debug!(code = ?code, "server closed connection");
                            break match CloseReason::classify(code) {
                                CloseReason::Clean => SessionEnd::Clean,
                                CloseReason::AuthRejected => SessionEnd::AuthRejected,
                                CloseReason::Abnormal => SessionEnd::Abnormal,
                            };
                        }
                        // Binary and transport-level ping/pong carry no
                        // business payload.
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "transport error");
                            break SessionEnd::Abnormal;
                        }
                        None => break SessionEnd::Abnormal,
                    }
                }
            }
        };
        *self.session_tx.lock() = None;
        // Unacknowledged entries become eligible for the next drain.
        self.outbox.reset_in_flight();
        end
    }

    /// Decode and apply one inbound frame. Protocol anomalies are logged
    /// and discarded, never fatal.
    fn handle_frame(&self, text: &str) {
        let effect = match decode_event(text) {
            Ok(Decoded::Event(event)) => {
                let mut guard = self.snapshot.write();
                match guard.as_mut() {
                    Some(snapshot) => reducer::apply(snapshot, &event),
                    // Queue reconciliation works even before a conversation
                    // is selected; everything else has nothing to land on.
                    None => match event {
                        ServerEvent::MessageAck { message_id } => Effect::Ack(message_id),
                        ServerEvent::Error {
                            message,
                            message_id: Some(message_id),
                        } => Effect::Fail {
                            message_id,
                            reason: message,
                        },
                        other => {
                            debug!(kind = other.kind(), "event with no conversation selected");
                            Effect::None
                        }
                    },
                }
            }
            Ok(Decoded::Unknown { kind }) => {
                warn!(kind, "discarding unknown event kind");
                Effect::None
            }
            Err(e) => {
                warn!(error = %e, "discarding malformed frame");
                Effect::None
            }
        };
        match effect {
            Effect::Ack(message_id) => {
                let _ = self.outbox.acknowledge(&message_id);
            }
            Effect::Fail { message_id, reason } => self.outbox.fail(&message_id, reason),
            Effect::None => {}
        }
    }
}

/// Append the bearer token as a query parameter.
fn compose_url(base: &str, token: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}token={token}")
}

/// Whether a handshake error means our credentials were rejected.
fn is_auth_rejection(error: &tungstenite::Error) -> bool {
    match error {
        tungstenite::Error::Http(response) => {
            response.status() == StatusCode::UNAUTHORIZED
                || response.status() == StatusCode::FORBIDDEN
        }
        _ => false,
    }
}

/// Encode and transmit one command frame.
async fn send_command(
    sink: &mut WsSink,
    command: &ClientCommand,
) -> std::result::Result<(), tungstenite::Error> {
    let json = encode_command(command)
        .map_err(|e| tungstenite::Error::Io(std::io::Error::other(e.to_string())))?;
    sink.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticCredentials;

    #[async_trait]
    impl CredentialProvider for StaticCredentials {
        async fn bearer_token(&self) -> Result<String> {
            Ok("tok_123".into())
        }
    }

    struct EmptySnapshots;

    #[async_trait]
    impl SnapshotProvider for EmptySnapshots {
        async fn fetch(&self, conversation_id: &str) -> Result<ConversationSnapshot> {
            Ok(ConversationSnapshot::new(conversation_id))
        }
    }

    fn make_client() -> Arc<SyncClient> {
        Arc::new(SyncClient::new(
            SyncConfig::new("ws://127.0.0.1:1/sync"),
            Arc::new(StaticCredentials),
            Arc::new(EmptySnapshots),
        ))
    }

    #[test]
    fn compose_url_appends_token() {
        assert_eq!(
            compose_url("ws://x/sync", "abc"),
            "ws://x/sync?token=abc"
        );
        assert_eq!(
            compose_url("ws://x/sync?v=2", "abc"),
            "ws://x/sync?v=2&token=abc"
        );
    }

    #[test]
    fn http_401_is_auth_rejection() {
        let response = tungstenite::http::Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .body(None)
            .unwrap();
        assert!(is_auth_rejection(&tungstenite::Error::Http(response)));
    }

    #[test]
    fn other_errors_are_not_auth_rejection() {
        assert!(!is_auth_rejection(&tungstenite::Error::ConnectionClosed));
        let response = tungstenite::http::Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(None)
            .unwrap();
        assert!(!is_auth_rejection(&tungstenite::Error::Http(response)));
    }

    #[tokio::test]
    async fn new_client_is_disconnected() {
        let client = make_client();
        assert_eq!(client.current_state(), ConnectionState::Disconnected);
        assert!(client.snapshot().is_none());
        assert!(client.outbox_messages().is_empty());
    }

    #[tokio::test]
    async fn send_chat_while_disconnected_queues() {
        let client = make_client();
        let message = client.send_chat("conv_1", None, "hello");
        assert_eq!(message.status, crate::state::DeliveryStatus::Sending);
        assert_eq!(client.outbox_messages().len(), 1);
    }

    #[tokio::test]
    async fn chat_sent_through_live_session_is_not_redrained() {
        let client = make_client();
        let (tx, mut rx) = mpsc::channel(8);
        *client.session_tx.lock() = Some(tx);

        let message = client.send_chat("conv_1", None, "hello");
        let command = rx.try_recv().unwrap();
        assert_eq!(command.kind(), "chat");

        // The opening drain of the same session must skip the entry the
        // direct send already claimed.
        assert!(client.outbox.drain_for_send().is_empty());
        assert_eq!(client.outbox_messages()[0].id, message.id);
    }

    #[tokio::test]
    async fn drained_chat_is_not_sent_again_directly() {
        let client = make_client();
        let message = client.send_chat("conv_1", None, "hello");
        assert_eq!(client.outbox.drain_for_send().len(), 1);

        let (tx, mut rx) = mpsc::channel(8);
        *client.session_tx.lock() = Some(tx);
        client.transmit_queued(&message.id);
        assert!(rx.try_recv().is_err(), "drained entry must not go out twice");
    }

    #[tokio::test]
    async fn full_command_channel_reports_busy() {
        let client = make_client();
        client.select_conversation("conv_1").await.unwrap();
        let (tx, _rx) = mpsc::channel(1);
        *client.session_tx.lock() = Some(tx);

        client.task_control(TaskAction::Pause).unwrap();
        assert!(matches!(
            client.task_control(TaskAction::Pause),
            Err(SyncError::Busy)
        ));
    }

    #[tokio::test]
    async fn direct_operations_require_connection() {
        let client = make_client();
        client.select_conversation("conv_1").await.unwrap();
        assert!(matches!(
            client.add_message("note"),
            Err(SyncError::NotConnected)
        ));
        assert!(matches!(
            client.task_control(TaskAction::Pause),
            Err(SyncError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn conversation_scoped_operations_require_selection() {
        let client = make_client();
        assert!(matches!(
            client.add_message("note"),
            Err(SyncError::NoConversation)
        ));
        assert!(matches!(
            client.respond_continuation(true),
            Err(SyncError::NoConversation)
        ));
    }

    #[tokio::test]
    async fn select_conversation_seeds_snapshot() {
        let client = make_client();
        client.select_conversation("conv_7").await.unwrap();
        assert_eq!(client.snapshot().unwrap().id, "conv_7");
    }

    #[tokio::test]
    async fn select_conversation_replaces_wholesale() {
        let client = make_client();
        client.select_conversation("conv_1").await.unwrap();
        {
            let mut guard = client.snapshot.write();
            guard.as_mut().unwrap().streaming_buffer = "partial".into();
        }
        client.select_conversation("conv_2").await.unwrap();
        let snapshot = client.snapshot().unwrap();
        assert_eq!(snapshot.id, "conv_2");
        assert!(snapshot.streaming_buffer.is_empty());
    }

    #[tokio::test]
    async fn respond_continuation_without_request_is_noop() {
        let client = make_client();
        client.select_conversation("conv_1").await.unwrap();
        // No live continuation: nothing to send, no error.
        client.respond_continuation(true).unwrap();
    }

    #[tokio::test]
    async fn disconnect_without_connect_is_safe() {
        let client = make_client();
        client.disconnect().await;
        assert_eq!(client.current_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn handle_frame_routes_ack_to_outbox() {
        let client = make_client();
        let message = client.send_chat("conv_1", None, "hello");
        let frame = format!(r#"{{"type":"message_ack","message_id":"{}"}}"#, message.id);
        client.handle_frame(&frame);
        assert!(client.outbox_messages().is_empty());
    }

    #[tokio::test]
    async fn handle_frame_routes_correlated_error_to_outbox() {
        let client = make_client();
        let message = client.send_chat("conv_1", None, "hello");
        let frame = format!(
            r#"{{"type":"error","message":"rejected","message_id":"{}"}}"#,
            message.id
        );
        client.handle_frame(&frame);
        let entries = client.outbox_messages();
        assert_eq!(entries[0].status, crate::state::DeliveryStatus::Failed);
        assert_eq!(entries[0].error.as_deref(), Some("rejected"));
    }

    #[tokio::test]
    async fn handle_frame_tolerates_garbage() {
        let client = make_client();
        client.handle_frame("not json");
        client.handle_frame(r#"{"type":"mystery_kind"}"#);
        client.handle_frame(r#"{"no_type":true}"#);
        // Nothing panicked, nothing changed.
        assert!(client.outbox_messages().is_empty());
    }

    #[tokio::test]
    async fn handle_frame_applies_events_to_snapshot() {
        let client = make_client();
        client.select_conversation("conv_1").await.unwrap();
        client.handle_frame(r#"{"type":"token","content":"Hel"}"#);
        client.handle_frame(r#"{"type":"token","content":"lo"}"#);
        assert_eq!(client.snapshot().unwrap().streaming_buffer, "Hello");
    }
}
