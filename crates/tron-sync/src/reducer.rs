//! Inbound event reducer.
//!
//! Folds each decoded [`ServerEvent`] into the active
//! [`ConversationSnapshot`]. Events are applied strictly sequentially, one
//! at a time in arrival order, by the connection task — the reducer never
//! observes interleaved partial updates and no other component writes the
//! snapshot.
//!
//! Queue-related events do not mutate conversation state here; they come
//! back as an [`Effect`] the caller routes to the outbound delivery queue,
//! keeping the ownership split (reducer owns the snapshot, outbox owns
//! message lifecycles) intact.

use tracing::{debug, warn};

use tron_wire::ServerEvent;

use crate::state::{ConversationSnapshot, FilePreview, PlanState, TodoProgress, UsageStats};

/// Side effect of applying an event, routed to the outbound delivery queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Nothing to forward.
    None,
    /// Acknowledge the outbound message with this id.
    Ack(String),
    /// Mark the outbound message with this id as failed.
    Fail {
        /// The failed message's id.
        message_id: String,
        /// Server-supplied reason.
        reason: String,
    },
}

/// Apply one event to the snapshot.
pub fn apply(snapshot: &mut ConversationSnapshot, event: &ServerEvent) -> Effect {
    match event {
        // Informational kinds: logged, no state mutation.
        ServerEvent::Connected { session_id } => {
            debug!(session_id = session_id.as_deref(), "session confirmed");
            Effect::None
        }
        ServerEvent::Pong => Effect::None,
        ServerEvent::Subscribed { conversation_id } => {
            debug!(conversation_id, "subscription confirmed");
            Effect::None
        }
        ServerEvent::Unsubscribed { conversation_id } => {
            debug!(conversation_id, "unsubscription confirmed");
            Effect::None
        }

        ServerEvent::Message { message } => {
            // The finalized message replaces whatever was streaming for
            // this turn.
            snapshot.streaming_buffer.clear();
            snapshot.messages.push(message.clone());
            Effect::None
        }
        ServerEvent::Token { content } => {
            snapshot.streaming_buffer.push_str(content);
            Effect::None
        }
        ServerEvent::AgentStatus { agent_id, status } => {
            let _ = snapshot
                .agent_statuses
                .insert(agent_id.clone(), status.clone());
            Effect::None
        }

        ServerEvent::MessageAck { message_id } => Effect::Ack(message_id.clone()),

        ServerEvent::PlanUpdate { content, status } => {
            let plan = snapshot.plan.get_or_insert_with(PlanState::default);
            plan.content = content.clone();
            // Server status is a hint, honored only while no step list
            // exists to derive from.
            if plan.steps.is_empty() {
                if let Some(status) = status {
                    plan.status = Some(*status);
                }
            }
            snapshot.continuation = None;
            Effect::None
        }
        ServerEvent::StepUpdate {
            steps,
            current_step_index,
        } => {
            let plan = snapshot.plan.get_or_insert_with(PlanState::default);
            plan.replace_steps(steps.clone(), *current_step_index);
            // A new plan state supersedes any live continuation request.
            snapshot.continuation = None;
            Effect::None
        }
        ServerEvent::PlanStatus { status } => {
            let plan = snapshot.plan.get_or_insert_with(PlanState::default);
            if plan.steps.is_empty() {
                plan.status = Some(*status);
            } else {
                debug!(
                    pushed = ?status,
                    derived = ?plan.status,
                    "ignoring pushed plan status, steps are authoritative"
                );
            }
            Effect::None
        }

        ServerEvent::ContinuationRequired { info } => {
            snapshot.continuation = Some(info.clone());
            Effect::None
        }

        ServerEvent::FileChangePreview { path, summary } => {
            snapshot.file_previews.push(FilePreview {
                path: path.clone(),
                summary: summary.clone(),
            });
            Effect::None
        }
        ServerEvent::UsageUpdate {
            input_tokens,
            output_tokens,
            cost,
        } => {
            snapshot.usage = Some(UsageStats {
                input_tokens: *input_tokens,
                output_tokens: *output_tokens,
                cost: *cost,
            });
            Effect::None
        }
        ServerEvent::SupervisorThought { content } => {
            snapshot.supervisor_thoughts.push(content.clone());
            Effect::None
        }
        ServerEvent::ConfidenceUpdate { confidence } => {
            snapshot.confidence = Some(*confidence);
            Effect::None
        }
        ServerEvent::PlanChange { description } => {
            snapshot.plan_changes.push(description.clone());
            Effect::None
        }
        ServerEvent::TodoProgress { completed, total } => {
            snapshot.todo = Some(TodoProgress {
                completed: *completed,
                total: *total,
            });
            Effect::None
        }

        ServerEvent::Error {
            message,
            message_id,
        } => match message_id {
            Some(id) => Effect::Fail {
                message_id: id.clone(),
                reason: message.clone(),
            },
            None => {
                // Connection-level anomaly: logged, no conversation mutation.
                warn!(message, "server error without message correlation");
                Effect::None
            }
        },
    }
}
