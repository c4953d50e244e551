//! Outbound commands sent from the client to the sync endpoint.
//!
//! Each variant serializes to a JSON object with a snake_case `type`
//! discriminator. The server treats redelivery of a `chat` with the same
//! `message_id` as at-most-once-effective, so `message_id` doubles as the
//! idempotency key for acknowledgment matching.

use serde::{Deserialize, Serialize};

/// Action verbs accepted by the `task_control` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    /// Pause the running task.
    Pause,
    /// Resume a paused task (also authorizes additional iterations for a
    /// stalled plan step).
    Resume,
    /// Cancel the task.
    Cancel,
}

/// A command frame sent by the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Submit a user chat message.
    Chat {
        /// Target conversation.
        conversation_id: String,
        /// Owning project, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        project_id: Option<String>,
        /// Message text.
        content: String,
        /// Client-generated idempotency key; echoed back in `message_ack`.
        message_id: String,
        /// Specific agent to address, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        target_agent: Option<String>,
    },
    /// Keep-alive probe. Carries no payload.
    Ping,
    /// Subscribe to pushes for a conversation.
    Subscribe {
        /// Conversation to subscribe to.
        conversation_id: String,
    },
    /// Unsubscribe from a conversation.
    Unsubscribe {
        /// Conversation to unsubscribe from.
        conversation_id: String,
    },
    /// Control a running task.
    TaskControl {
        /// What to do.
        action: TaskAction,
        /// Conversation whose task is controlled.
        conversation_id: String,
    },
    /// Append a note to a conversation without starting a turn.
    AddMessage {
        /// Note text.
        content: String,
        /// Target conversation.
        conversation_id: String,
    },
}

impl ClientCommand {
    /// The wire discriminator for this command.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "chat",
            Self::Ping => "ping",
            Self::Subscribe { .. } => "subscribe",
            Self::Unsubscribe { .. } => "unsubscribe",
            Self::TaskControl { .. } => "task_control",
            Self::AddMessage { .. } => "add_message",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_serializes_with_type_tag() {
        let cmd = ClientCommand::Chat {
            conversation_id: "conv_1".into(),
            project_id: None,
            content: "hello".into(),
            message_id: "m1".into(),
            target_agent: None,
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "chat",
                "conversation_id": "conv_1",
                "content": "hello",
                "message_id": "m1",
            })
        );
    }

    #[test]
    fn chat_includes_optional_fields_when_set() {
        let cmd = ClientCommand::Chat {
            conversation_id: "conv_1".into(),
            project_id: Some("proj_9".into()),
            content: "hi".into(),
            message_id: "m2".into(),
            target_agent: Some("researcher".into()),
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["project_id"], "proj_9");
        assert_eq!(value["target_agent"], "researcher");
    }

    #[test]
    fn ping_has_no_payload() {
        let value = serde_json::to_value(ClientCommand::Ping).unwrap();
        assert_eq!(value, json!({ "type": "ping" }));
    }

    #[test]
    fn task_control_action_is_snake_case() {
        let cmd = ClientCommand::TaskControl {
            action: TaskAction::Resume,
            conversation_id: "conv_1".into(),
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["type"], "task_control");
        assert_eq!(value["action"], "resume");
    }

    #[test]
    fn subscribe_roundtrip() {
        let cmd = ClientCommand::Subscribe {
            conversation_id: "conv_7".into(),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: ClientCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, back);
    }

    #[test]
    fn kind_matches_wire_tag() {
        let cmd = ClientCommand::AddMessage {
            content: "note".into(),
            conversation_id: "conv_1".into(),
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["type"], cmd.kind());
    }
}
