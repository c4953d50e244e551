//! Error types for the sync client.
//!
//! Transport and protocol failures are handled inside the client (reconnect
//! policy, warn-and-discard) and never surface here; [`SyncError`] covers
//! only what callers can observe per the propagation policy: direct-send
//! preconditions, terminal connection states, and collaborator failures.

use thiserror::Error;

/// Errors surfaced to callers of the sync client.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A direct send was attempted while no session is live.
    #[error("not connected")]
    NotConnected,

    /// The outbound command channel is full. The command was not sent;
    /// callers may retry once the session catches up.
    #[error("outbound channel full")]
    Busy,

    /// An operation that needs an active conversation ran with none
    /// selected.
    #[error("no active conversation")]
    NoConversation,

    /// The server rejected our credentials (close code 4001). Requires
    /// fresh credentials and an explicit reconnect.
    #[error("authentication rejected")]
    AuthRejected,

    /// The reconnect attempt ceiling was exhausted.
    #[error("reconnect attempts exhausted")]
    RetriesExhausted,

    /// Frame encoding failed.
    #[error(transparent)]
    Wire(#[from] tron_wire::WireError),

    /// The credential provider could not supply a token.
    #[error("credential error: {0}")]
    Credential(String),

    /// The snapshot provider could not fetch the initial conversation state.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Convenience type alias for sync results.
pub type Result<T> = std::result::Result<T, SyncError>;
