//! # tron-sync
//!
//! Client-side realtime synchronization for the Tron agent service.
//!
//! [`SyncClient`] keeps a UI consistent with the server over one long-lived
//! WebSocket: it manages the connection lifecycle (heartbeat, exponential
//! reconnect backoff, deterministic teardown), guarantees at-least-once
//! delivery of user-originated messages through an offline-durable outbound
//! queue with acknowledgment reconciliation, and folds the server's push
//! stream into a typed [`ConversationSnapshot`](state::ConversationSnapshot)
//! — messages, streaming buffer, plan and step progress, agent statuses,
//! continuation requests.
//!
//! The client reconstructs *current* state only; history persistence is the
//! backend's job. REST CRUD, auth refresh, and rendering live elsewhere and
//! are reached through the [`CredentialProvider`] and [`SnapshotProvider`]
//! collaborator traits.

pub mod client;
pub mod config;
pub mod error;
pub mod outbox;
pub mod policy;
pub mod reducer;
pub mod state;
pub mod subscription;

pub use client::{ClientNotice, CredentialProvider, SnapshotProvider, SyncClient};
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use outbox::Outbox;
pub use reducer::Effect;
pub use state::{
    ConnectionState, ContinuationRequest, ConversationSnapshot, DeliveryStatus, OutboundMessage,
    PlanState, PlanStatus, PlanStep, StepStatus,
};
pub use subscription::SubscriptionManager;
