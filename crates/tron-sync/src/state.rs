//! Typed client state reconstructed from the push stream.
//!
//! The connection lifecycle owns [`ConnectionState`]; the outbound delivery
//! queue owns [`OutboundMessage`] lifecycles; everything else in this module
//! is mutated exclusively by the inbound event reducer.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use tron_wire::{
    ChatMessage, ContinuationInfo as ContinuationRequest, PlanStatus, StepStatus,
    WireStep as PlanStep,
};

/// State of the single logical connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and none scheduled. Requires an explicit `connect()`.
    #[default]
    Disconnected,
    /// A transport open is in flight.
    Connecting,
    /// The session is live.
    Connected,
    /// An abnormal close occurred; a retry is scheduled.
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        };
        f.write_str(s)
    }
}

/// Delivery status of a user-originated message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Queued or in flight, not yet acknowledged.
    Sending,
    /// Acknowledged by the server.
    Sent,
    /// Rejected by the server or failed to transmit. Eligible for retry.
    Failed,
}

/// A user-originated message tracked by the outbound delivery queue.
///
/// `id` is client-generated and globally unique; it is the idempotency key
/// the server echoes back in `message_ack`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Client-generated idempotency key.
    pub id: String,
    /// Target conversation.
    pub conversation_id: String,
    /// Owning project, if any.
    pub project_id: Option<String>,
    /// Message text.
    pub content: String,
    /// Current delivery status.
    pub status: DeliveryStatus,
    /// Failure detail when `status` is [`DeliveryStatus::Failed`].
    pub error: Option<String>,
    /// When the user submitted the message.
    pub created_at: DateTime<Utc>,
}

/// Plan execution state for the active conversation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanState {
    /// Plan text.
    pub content: String,
    /// Current status. Recomputed from `steps` whenever a step list is
    /// present; the server-pushed value is only a hint for step-less plans.
    pub status: Option<PlanStatus>,
    /// Ordered step sequence.
    pub steps: Vec<PlanStep>,
    /// Index of the step currently executing.
    pub current_step_index: Option<usize>,
}

impl PlanState {
    /// Derive the plan status from a step sequence.
    ///
    /// Any step in progress, or any step still pending, means execution is
    /// underway (`Approved`); all steps terminal means `Completed`. An empty
    /// sequence derives nothing — the caller falls back to the server hint.
    /// Pure and idempotent: the same steps always derive the same status.
    pub fn derive_status(steps: &[PlanStep]) -> Option<PlanStatus> {
        if steps.is_empty() {
            return None;
        }
        if steps.iter().all(|s| s.status.is_terminal()) {
            return Some(PlanStatus::Completed);
        }
        Some(PlanStatus::Approved)
    }

    /// Replace the step sequence wholesale and recompute derived state.
    ///
    /// The wire `status` field is never trusted when steps are present
    /// (server-cached status can drift from the authoritative step list).
    pub fn replace_steps(&mut self, steps: Vec<PlanStep>, current_step_index: Option<usize>) {
        self.current_step_index = current_step_index.or_else(|| {
            steps
                .iter()
                .position(|s| s.status == StepStatus::InProgress)
        });
        if let Some(derived) = Self::derive_status(&steps) {
            self.status = Some(derived);
        }
        self.steps = steps;
    }
}

/// A pending file change previewed by the agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilePreview {
    /// Path of the file being changed.
    pub path: String,
    /// Human-readable change summary.
    pub summary: Option<String>,
}

/// Accumulated token/cost usage for the conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens produced.
    pub output_tokens: u64,
    /// Accumulated cost in USD.
    pub cost: Option<f64>,
}

/// Todo-list completion progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoProgress {
    /// Items completed.
    pub completed: u32,
    /// Total items.
    pub total: u32,
}

/// In-memory model of one conversation, reconstructed from an initial REST
/// snapshot plus the live push stream.
///
/// Replaced wholesale when the user switches conversations; state is never
/// merged across conversations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    /// Conversation id.
    pub id: String,
    /// Finalized messages in order.
    pub messages: Vec<ChatMessage>,
    /// In-progress assistant reply, concatenated in arrival order.
    pub streaming_buffer: String,
    /// Plan execution state, if a plan exists.
    pub plan: Option<PlanState>,
    /// Latest status per agent.
    pub agent_statuses: HashMap<String, String>,
    /// Live continuation request, at most one at a time.
    pub continuation: Option<ContinuationRequest>,
    /// Latest usage figures.
    pub usage: Option<UsageStats>,
    /// Latest confidence estimate, 0.0–1.0.
    pub confidence: Option<f64>,
    /// Latest todo progress.
    pub todo: Option<TodoProgress>,
    /// Pending file-change previews.
    pub file_previews: Vec<FilePreview>,
    /// Mid-execution plan amendments, in arrival order.
    pub plan_changes: Vec<String>,
    /// Supervisor reasoning notes, in arrival order.
    pub supervisor_thoughts: Vec<String>,
}

impl ConversationSnapshot {
    /// An empty snapshot for a conversation.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}
