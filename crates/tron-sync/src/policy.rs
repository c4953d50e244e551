//! Heartbeat and reconnect-backoff policy.
//!
//! Pure functions of attempt count and configuration, independently
//! testable without a live connection. The connection task in
//! [`crate::client`] is the only consumer.

use std::time::Duration;

/// Default keep-alive interval while connected, in seconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 25;
/// Default base delay for reconnect backoff, in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
/// Default cap on the reconnect delay, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Default ceiling on consecutive reconnect attempts.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Delay before reconnect attempt `attempt` (zero-based).
///
/// Formula: `min(base · 2^attempt, cap)`. The shift saturates so large
/// attempt counts cannot overflow; the result is monotonically
/// non-decreasing and bounded by `cap_ms`.
pub fn reconnect_delay(attempt: u32, base_ms: u64, cap_ms: u64) -> Duration {
    let exponential = base_ms.saturating_mul(1u64 << attempt.min(31));
    Duration::from_millis(exponential.min(cap_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn delay_doubles_per_attempt() {
        assert_eq!(reconnect_delay(0, 1000, 30_000).as_millis(), 1000);
        assert_eq!(reconnect_delay(1, 1000, 30_000).as_millis(), 2000);
        assert_eq!(reconnect_delay(2, 1000, 30_000).as_millis(), 4000);
        assert_eq!(reconnect_delay(3, 1000, 30_000).as_millis(), 8000);
    }

    #[test]
    fn delay_caps_at_max() {
        assert_eq!(reconnect_delay(5, 1000, 30_000).as_millis(), 30_000);
        assert_eq!(reconnect_delay(9, 1000, 30_000).as_millis(), 30_000);
    }

    #[test]
    fn high_attempt_does_not_overflow() {
        let delay = reconnect_delay(u32::MAX, 1000, 30_000);
        assert_eq!(delay.as_millis(), 30_000);
    }

    #[test]
    fn defaults_match_contract() {
        assert_eq!(DEFAULT_HEARTBEAT_INTERVAL_SECS, 25);
        assert_eq!(DEFAULT_BASE_DELAY_MS, 1000);
        assert_eq!(DEFAULT_MAX_DELAY_MS, 30_000);
        assert_eq!(DEFAULT_MAX_RECONNECT_ATTEMPTS, 10);
    }

    proptest! {
        #[test]
        fn delay_is_bounded_by_cap(attempt in 0u32..64, base in 1u64..10_000, cap in 1u64..120_000) {
            let delay = reconnect_delay(attempt, base, cap);
            prop_assert!(delay.as_millis() <= u128::from(cap));
        }

        #[test]
        fn delay_is_non_decreasing(attempt in 0u32..63, base in 1u64..10_000, cap in 1u64..120_000) {
            let a = reconnect_delay(attempt, base, cap);
            let b = reconnect_delay(attempt + 1, base, cap);
            prop_assert!(b >= a);
        }

        #[test]
        fn delay_below_cap_is_exact_power_of_two(attempt in 0u32..10) {
            let delay = reconnect_delay(attempt, 1, u64::MAX);
            prop_assert_eq!(delay.as_millis(), 1u128 << attempt);
        }
    }
}
