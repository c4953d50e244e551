//! Inbound events pushed by the sync endpoint.
//!
//! [`ServerEvent`] enumerates every event kind the client understands. Each
//! variant serializes with a snake_case `type` discriminator; unknown fields
//! inside a known kind are ignored so the server can add fields without
//! breaking older clients. Entirely unknown kinds are handled one level up
//! by the codec (see [`crate::codec::Decoded`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a single plan step, as carried on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not started.
    Pending,
    /// Currently executing.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Deliberately skipped.
    Skipped,
}

impl StepStatus {
    /// Whether this status is terminal (the step will not run again).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

/// Lifecycle status of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Still being written by the agent.
    Draft,
    /// Awaiting user approval.
    Pending,
    /// Approved and executing.
    Approved,
    /// Rejected by the user.
    Rejected,
    /// All steps finished.
    Completed,
}

/// A finalized message within a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Server-assigned message id.
    pub id: String,
    /// Author role (`user`, `assistant`, `system`).
    pub role: String,
    /// Message text.
    pub content: String,
    /// Agent that produced the message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One plan step as carried by `step_update`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireStep {
    /// Step id, if the server assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable step title.
    pub title: String,
    /// Current step status.
    pub status: StepStatus,
}

/// Payload of `continuation_required`: the server is asking the user to
/// authorize additional execution iterations for a stalled plan step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinuationInfo {
    /// Step that hit its iteration ceiling.
    pub step_id: String,
    /// Title of that step.
    pub step_title: String,
    /// Iterations consumed so far.
    pub iterations_used: u32,
    /// Estimated fraction of the step already done, 0.0–1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_estimate: Option<f64>,
    /// Estimated iterations remaining.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_remaining: Option<u32>,
    /// Files modified while working on the step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_modified: Vec<String>,
    /// Free-form explanation from the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// An event frame pushed by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Session confirmation, sent once after the transport opens.
    Connected {
        /// Server-assigned session id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
    /// Heartbeat reply. Informational only.
    Pong,
    /// Subscription confirmation. Informational only.
    Subscribed {
        /// Conversation now subscribed.
        conversation_id: String,
    },
    /// Unsubscription confirmation. Informational only.
    Unsubscribed {
        /// Conversation no longer subscribed.
        conversation_id: String,
    },
    /// A finalized message was appended to the conversation.
    Message {
        /// The message.
        message: ChatMessage,
    },
    /// An incremental fragment of an in-progress assistant reply.
    Token {
        /// Text fragment, appended to the streaming buffer in arrival order.
        content: String,
    },
    /// An agent changed status.
    AgentStatus {
        /// Agent whose status changed.
        agent_id: String,
        /// New status string.
        status: String,
    },
    /// Acknowledgment that a client-originated message was received.
    MessageAck {
        /// The `message_id` from the original `chat` command.
        message_id: String,
    },
    /// Full plan content replacement.
    PlanUpdate {
        /// Plan text.
        content: String,
        /// Server's idea of the plan status. A hint only — the client
        /// recomputes from steps whenever a step list is present.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<PlanStatus>,
    },
    /// Full step-sequence replacement.
    StepUpdate {
        /// The complete ordered step list.
        steps: Vec<WireStep>,
        /// Index of the step currently executing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_step_index: Option<usize>,
    },
    /// Server-pushed plan status. A hint only, see `PlanUpdate::status`.
    PlanStatus {
        /// The pushed status.
        status: PlanStatus,
    },
    /// A plan step hit its iteration ceiling and needs user authorization
    /// to continue.
    ContinuationRequired {
        /// Continuation details.
        #[serde(flatten)]
        info: ContinuationInfo,
    },
    /// Preview of a pending file change.
    FileChangePreview {
        /// Path of the file being changed.
        path: String,
        /// Human-readable change summary.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
    /// Token/cost usage update for the conversation.
    UsageUpdate {
        /// Input tokens consumed.
        input_tokens: u64,
        /// Output tokens produced.
        output_tokens: u64,
        /// Accumulated cost in USD.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cost: Option<f64>,
    },
    /// A supervisor-agent reasoning note.
    SupervisorThought {
        /// Thought text.
        content: String,
    },
    /// Updated confidence estimate for the current approach.
    ConfidenceUpdate {
        /// Confidence, 0.0–1.0.
        confidence: f64,
    },
    /// The agent amended the plan mid-execution.
    PlanChange {
        /// Description of the amendment.
        description: String,
    },
    /// Todo-list completion progress.
    TodoProgress {
        /// Items completed.
        completed: u32,
        /// Total items.
        total: u32,
    },
    /// Server-side error. With a `message_id` it is correlated to a specific
    /// outbound message; without one it is a connection-level anomaly.
    Error {
        /// Error description.
        message: String,
        /// Outbound message this error is correlated to, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },
}

impl ServerEvent {
    /// The wire discriminator for this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Pong => "pong",
            Self::Subscribed { .. } => "subscribed",
            Self::Unsubscribed { .. } => "unsubscribed",
            Self::Message { .. } => "message",
            Self::Token { .. } => "token",
            Self::AgentStatus { .. } => "agent_status",
            Self::MessageAck { .. } => "message_ack",
            Self::PlanUpdate { .. } => "plan_update",
            Self::StepUpdate { .. } => "step_update",
            Self::PlanStatus { .. } => "plan_status",
            Self::ContinuationRequired { .. } => "continuation_required",
            Self::FileChangePreview { .. } => "file_change_preview",
            Self::UsageUpdate { .. } => "usage_update",
            Self::SupervisorThought { .. } => "supervisor_thought",
            Self::ConfidenceUpdate { .. } => "confidence_update",
            Self::PlanChange { .. } => "plan_change",
            Self::TodoProgress { .. } => "todo_progress",
            Self::Error { .. } => "error",
        }
    }
}

/// All event kinds this client understands, for exhaustive testing and
/// unknown-kind detection.
pub const KNOWN_EVENT_KINDS: &[&str] = &[
    "connected",
    "pong",
    "subscribed",
    "unsubscribed",
    "message",
    "token",
    "agent_status",
    "message_ack",
    "plan_update",
    "step_update",
    "plan_status",
    "continuation_required",
    "file_change_preview",
    "usage_update",
    "supervisor_thought",
    "confidence_update",
    "plan_change",
    "todo_progress",
    "error",
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_ack_roundtrip() {
        let json = r#"{"type":"message_ack","message_id":"m1"}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ServerEvent::MessageAck {
                message_id: "m1".into()
            }
        );
    }

    #[test]
    fn token_event_parses() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"type":"token","content":"Hel"}"#).unwrap();
        assert_eq!(
            event,
            ServerEvent::Token {
                content: "Hel".into()
            }
        );
    }

    #[test]
    fn step_update_parses_statuses() {
        let json = r#"{
            "type": "step_update",
            "steps": [
                {"title": "a", "status": "completed"},
                {"title": "b", "status": "in_progress"},
                {"title": "c", "status": "pending"}
            ],
            "current_step_index": 1
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        let ServerEvent::StepUpdate {
            steps,
            current_step_index,
        } = event
        else {
            panic!("wrong variant");
        };
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].status, StepStatus::InProgress);
        assert_eq!(current_step_index, Some(1));
    }

    #[test]
    fn continuation_required_flattens_info() {
        let json = r#"{
            "type": "continuation_required",
            "step_id": "s3",
            "step_title": "Migrate schema",
            "iterations_used": 25,
            "progress_estimate": 0.8,
            "files_modified": ["db/schema.sql"]
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        let ServerEvent::ContinuationRequired { info } = event else {
            panic!("wrong variant");
        };
        assert_eq!(info.step_id, "s3");
        assert_eq!(info.iterations_used, 25);
        assert_eq!(info.files_modified, vec!["db/schema.sql"]);
        assert_eq!(info.estimated_remaining, None);
    }

    #[test]
    fn error_without_message_id() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"type":"error","message":"boom"}"#).unwrap();
        assert_eq!(
            event,
            ServerEvent::Error {
                message: "boom".into(),
                message_id: None
            }
        );
    }

    #[test]
    fn unknown_fields_inside_known_kind_ignored() {
        let json = r#"{"type":"pong","server_time":12345}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, ServerEvent::Pong);
    }

    #[test]
    fn message_event_carries_chat_message() {
        let json = r#"{
            "type": "message",
            "message": {"id": "srv_1", "role": "assistant", "content": "done"}
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        let ServerEvent::Message { message } = event else {
            panic!("wrong variant");
        };
        assert_eq!(message.role, "assistant");
        assert!(message.created_at.is_none());
    }

    #[test]
    fn kind_strings_are_all_known() {
        let events = [
            ServerEvent::Pong,
            ServerEvent::Token {
                content: String::new(),
            },
            ServerEvent::MessageAck {
                message_id: String::new(),
            },
            ServerEvent::PlanStatus {
                status: PlanStatus::Draft,
            },
        ];
        for event in &events {
            assert!(KNOWN_EVENT_KINDS.contains(&event.kind()));
        }
    }

    #[test]
    fn known_kinds_deserialize_tag_matches_kind() {
        // Every kind string in the constant must be accepted as a tag for
        // some variant (given a permissive payload) or be covered by a
        // variant's kind(). Spot-check serialization side.
        let event = ServerEvent::AgentStatus {
            agent_id: "researcher".into(),
            status: "thinking".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "agent_status");
    }

    #[test]
    fn step_status_terminal_classification() {
        assert!(StepStatus::Completed.is_terminal());
        assert!(StepStatus::Failed.is_terminal());
        assert!(StepStatus::Skipped.is_terminal());
        assert!(!StepStatus::Pending.is_terminal());
        assert!(!StepStatus::InProgress.is_terminal());
    }

    #[test]
    fn plan_status_wire_names() {
        let value = serde_json::to_value(PlanStatus::Approved).unwrap();
        assert_eq!(value, json!("approved"));
        let back: PlanStatus = serde_json::from_value(json!("completed")).unwrap();
        assert_eq!(back, PlanStatus::Completed);
    }
}
