//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policy::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_HEARTBEAT_INTERVAL_SECS, DEFAULT_MAX_DELAY_MS,
    DEFAULT_MAX_RECONNECT_ATTEMPTS,
};

/// Default capacity of the outbound command channel.
pub const DEFAULT_COMMAND_BUFFER: usize = 64;

/// Configuration for the sync client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/sync`.
    pub url: String,
    /// Keep-alive interval while connected, in seconds (default: 25).
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Base delay for reconnect backoff in ms (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Cap on the reconnect delay in ms (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// Ceiling on consecutive reconnect attempts (default: 10).
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Capacity of the outbound command channel (default: 64).
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_heartbeat_interval_secs() -> u64 {
    DEFAULT_HEARTBEAT_INTERVAL_SECS
}
fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
fn default_max_reconnect_attempts() -> u32 {
    DEFAULT_MAX_RECONNECT_ATTEMPTS
}
fn default_command_buffer() -> usize {
    DEFAULT_COMMAND_BUFFER
}

impl SyncConfig {
    /// Configuration with defaults for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            reconnect_base_delay_ms: DEFAULT_BASE_DELAY_MS,
            reconnect_max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }

    /// Heartbeat period, clamped to at least one second so a zero value in
    /// a deserialized config cannot produce a zero-period timer.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }
}
