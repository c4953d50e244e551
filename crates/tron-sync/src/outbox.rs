//! Outbound delivery queue.
//!
//! Buffers user-originated messages while disconnected, hands them to the
//! connection task in FIFO order on the Connecting→Connected edge, and
//! reconciles server acknowledgments. A message is always in exactly one of
//! four places: queued, Sending in flight, Sent (removed), or Failed
//! (retained for retry/dismissal). Nothing is ever silently dropped.
//!
//! The queue itself never touches the transport. Transmission is gated by an
//! in-flight claim set held under the same lock as the entries: an entry is
//! handed out at most once per session, whether it leaves through the opening
//! drain ([`Outbox::drain_for_send`]) or through a direct send against the
//! live session ([`Outbox::claim`]). The lifecycle manager clears the claim
//! set when a session ends, which is what makes unacknowledged entries
//! eligible for retransmission on the next Connected edge.

use std::collections::HashSet;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use tron_wire::ClientCommand;

use crate::state::{DeliveryStatus, OutboundMessage};

#[derive(Default)]
struct Inner {
    entries: Vec<OutboundMessage>,
    /// Ids handed to the current session and not yet acknowledged or failed.
    in_flight: HashSet<String>,
}

/// The outbound delivery queue.
#[derive(Default)]
pub struct Outbox {
    inner: Mutex<Inner>,
}

impl Outbox {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and enqueue a message with status `Sending`.
    ///
    /// Returns a clone of the entry; the caller claims it for immediate
    /// transmission if a session is live, otherwise it waits for the next
    /// flush.
    pub fn enqueue(
        &self,
        conversation_id: impl Into<String>,
        project_id: Option<String>,
        content: impl Into<String>,
    ) -> OutboundMessage {
        let message = OutboundMessage {
            id: Uuid::now_v7().to_string(),
            conversation_id: conversation_id.into(),
            project_id,
            content: content.into(),
            status: DeliveryStatus::Sending,
            error: None,
            created_at: Utc::now(),
        };
        self.inner.lock().entries.push(message.clone());
        message
    }

    /// All unclaimed `Sending` entries in FIFO order, claimed in-flight.
    ///
    /// Called by the lifecycle manager immediately after reaching Connected.
    /// Entries already claimed by a concurrent direct send are skipped, so a
    /// message crosses the wire at most once per session. Failed entries are
    /// not resent automatically; the user retries them explicitly.
    pub fn drain_for_send(&self) -> Vec<OutboundMessage> {
        let mut inner = self.inner.lock();
        let Inner { entries, in_flight } = &mut *inner;
        entries
            .iter_mut()
            .filter_map(|m| {
                if m.status != DeliveryStatus::Sending || in_flight.contains(&m.id) {
                    return None;
                }
                m.error = None;
                let _ = in_flight.insert(m.id.clone());
                Some(m.clone())
            })
            .collect()
    }

    /// Claim one `Sending` entry for direct transmission.
    ///
    /// Returns `None` if the id is unknown, not in the `Sending` state, or
    /// already claimed (by the opening drain or an earlier direct send).
    pub fn claim(&self, message_id: &str) -> Option<OutboundMessage> {
        let mut inner = self.inner.lock();
        let Inner { entries, in_flight } = &mut *inner;
        let entry = entries
            .iter_mut()
            .find(|m| m.id == message_id && m.status == DeliveryStatus::Sending)?;
        if in_flight.contains(message_id) {
            return None;
        }
        let _ = in_flight.insert(entry.id.clone());
        entry.error = None;
        Some(entry.clone())
    }

    /// Return a claimed entry to the queue after a transmit failure, making
    /// it eligible for the next drain.
    pub fn release(&self, message_id: &str) {
        let _ = self.inner.lock().in_flight.remove(message_id);
    }

    /// Clear all in-flight claims when a session ends. Unacknowledged
    /// entries remain `Sending` and are retransmitted on the next Connected
    /// edge with the same id.
    pub fn reset_in_flight(&self) {
        self.inner.lock().in_flight.clear();
    }

    /// Match a server acknowledgment: mark `Sent` and remove from the queue.
    ///
    /// Idempotent — unknown or already-acknowledged ids are ignored.
    /// Returns whether an entry was matched.
    pub fn acknowledge(&self, message_id: &str) -> bool {
        let mut inner = self.inner.lock();
        let _ = inner.in_flight.remove(message_id);
        let before = inner.entries.len();
        inner.entries.retain(|m| m.id != message_id);
        before != inner.entries.len()
    }

    /// Mark a message `Failed` with the given reason and drop its claim.
    ///
    /// Unknown ids are ignored (the error may concern a message acknowledged
    /// in a previous session).
    pub fn fail(&self, message_id: &str, reason: impl Into<String>) {
        let mut inner = self.inner.lock();
        let _ = inner.in_flight.remove(message_id);
        if let Some(entry) = inner.entries.iter_mut().find(|m| m.id == message_id) {
            entry.status = DeliveryStatus::Failed;
            entry.error = Some(reason.into());
        }
    }

    /// Re-mark a failed message `Sending` for retransmission, keeping its
    /// id so the server can deduplicate.
    ///
    /// Returns the entry to transmit, or `None` if the id is unknown or the
    /// message is not in the failed state.
    pub fn retry(&self, message_id: &str) -> Option<OutboundMessage> {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .iter_mut()
            .find(|m| m.id == message_id && m.status == DeliveryStatus::Failed)?;
        entry.status = DeliveryStatus::Sending;
        entry.error = None;
        Some(entry.clone())
    }

    /// Remove a failed entry the user has dismissed.
    pub fn dismiss(&self, message_id: &str) {
        self.inner
            .lock()
            .entries
            .retain(|m| !(m.id == message_id && m.status == DeliveryStatus::Failed));
    }

    /// Read-only projection of the queue for the UI.
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.inner.lock().entries.clone()
    }

    /// Number of entries still tracked.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

/// Build the wire command for an outbound message.
pub fn chat_command(message: &OutboundMessage, target_agent: Option<String>) -> ClientCommand {
    ClientCommand::Chat {
        conversation_id: message.conversation_id.clone(),
        project_id: message.project_id.clone(),
        content: message.content.clone(),
        message_id: message.id.clone(),
        target_agent,
    }
}
