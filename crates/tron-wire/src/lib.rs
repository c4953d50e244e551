//! # tron-wire
//!
//! Wire envelope for the Tron realtime sync protocol.
//!
//! Every frame exchanged over the persistent connection is one JSON object
//! with a `type` discriminator. This crate defines the closed set of
//! outbound [`ClientCommand`]s and inbound [`ServerEvent`]s, the codec that
//! maps them to and from text frames, and close-code classification.
//!
//! The crate is pure and transport-free: no sockets, no state, no runtime.

pub mod close;
pub mod codec;
pub mod command;
pub mod error;
pub mod event;

pub use close::CloseReason;
pub use codec::{Decoded, decode_event, encode_command};
pub use command::{ClientCommand, TaskAction};
pub use error::{Result, WireError};
pub use event::{
    ChatMessage, ContinuationInfo, KNOWN_EVENT_KINDS, PlanStatus, ServerEvent, StepStatus,
    WireStep,
};
