//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Calculate exponential backoff delay with jitter.
///
/// `attempt` is 1-based; attempt 0 means "no delay".
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Reconnect schedule for a single long-lived stream.
///
/// The attempt counter resets whenever the stream makes progress, so a
/// stream that delivered events before dropping reconnects quickly.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    attempt: u32,
    base_ms: u64,
    min_base_ms: u64,
    max_ms: u64,
}

impl ReconnectBackoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            attempt: 0,
            base_ms,
            min_base_ms: base_ms,
            max_ms,
        }
    }

    /// Delay before the next reconnect; advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        calculate_backoff(self.attempt, self.base_ms, self.max_ms)
    }

    /// Forget previous failures.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Replace the base delay (server `retry:` hint).
    ///
    /// The hint is kept between the configured base and the maximum.
    pub fn set_base(&mut self, base_ms: u64) {
        self.base_ms = base_ms.clamp(self.min_base_ms.min(self.max_ms), self.max_ms);
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
