//! Subscription tracking for the single active conversation.
//!
//! Subscriptions do not survive a transport-level reconnect, so the manager
//! remembers the active id and re-issues a subscribe on every Connected
//! edge.

use parking_lot::Mutex;

use tron_wire::ClientCommand;

/// Tracks which conversation the client is subscribed to.
#[derive(Default)]
pub struct SubscriptionManager {
    active: Mutex<Option<String>>,
}

impl SubscriptionManager {
    /// A manager with no active subscription.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active conversation id.
    pub fn active(&self) -> Option<String> {
        self.active.lock().clone()
    }

    /// Switch the active conversation.
    ///
    /// Returns the commands to send while connected: an unsubscribe for the
    /// previous conversation (if any, and different) followed by a subscribe
    /// for the new one. Selecting the already-active conversation yields
    /// nothing.
    pub fn select(&self, conversation_id: &str) -> Vec<ClientCommand> {
        let mut active = self.active.lock();
        if active.as_deref() == Some(conversation_id) {
            return Vec::new();
        }
        let mut commands = Vec::with_capacity(2);
        if let Some(previous) = active.replace(conversation_id.to_string()) {
            commands.push(ClientCommand::Unsubscribe {
                conversation_id: previous,
            });
        }
        commands.push(ClientCommand::Subscribe {
            conversation_id: conversation_id.to_string(),
        });
        commands
    }

    /// Drop the active subscription.
    ///
    /// Returns the unsubscribe to send while connected.
    pub fn clear(&self) -> Option<ClientCommand> {
        self.active
            .lock()
            .take()
            .map(|conversation_id| ClientCommand::Unsubscribe { conversation_id })
    }

    /// The subscribe command to re-issue after a reconnect, if a
    /// conversation is active.
    pub fn resubscribe(&self) -> Option<ClientCommand> {
        self.active
            .lock()
            .clone()
            .map(|conversation_id| ClientCommand::Subscribe { conversation_id })
    }
}
