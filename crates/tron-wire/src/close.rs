//! Close-code classification.
//!
//! The server closes the connection with one of three intents, and the
//! reconnect policy hinges entirely on which one it was.

/// Why the connection closed, as derived from the close code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// Code 1000: clean, user-initiated. No reconnect.
    Clean,
    /// Code 4001: authentication rejected. Terminal — no reconnect until
    /// fresh credentials are supplied.
    AuthRejected,
    /// Any other code, or no close frame at all. Triggers the reconnect
    /// policy.
    Abnormal,
}

/// Close code for a clean, user-initiated shutdown.
pub const CLOSE_CODE_NORMAL: u16 = 1000;
/// Close code the server uses to reject authentication.
pub const CLOSE_CODE_AUTH_REJECTED: u16 = 4001;

impl CloseReason {
    /// Classify a close code. `None` means the transport dropped without a
    /// close frame, which is always abnormal.
    pub fn classify(code: Option<u16>) -> Self {
        match code {
            Some(CLOSE_CODE_NORMAL) => Self::Clean,
            Some(CLOSE_CODE_AUTH_REJECTED) => Self::AuthRejected,
            _ => Self::Abnormal,
        }
    }

    /// Whether this close should trigger a reconnect attempt.
    pub fn should_reconnect(self) -> bool {
        matches!(self, Self::Abnormal)
    }
}
