//! Exponential-backoff retry for fallible host operations.
//!
//! Transient failures are retried with a capped exponential delay;
//! failures whose text matches a permanent pattern stop retrying
//! immediately. When attempts run out, the last error is returned
//! unchanged — the retry-vs-abort decision above that point belongs to
//! the caller.

use crate::error::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based):
    /// `min(base * 2^attempt, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// True when the failure text marks a permanent condition not worth
/// retrying: "permission" together with "denied", or any "corrupt".
pub fn is_permanent_failure(text: &str) -> bool {
    let lower = text.to_lowercase();
    (lower.contains("permission") && lower.contains("denied")) || lower.contains("corrupt")
}

/// Runs `operation` until it succeeds, a permanent failure is detected, or
/// `max_retries` extra attempts are spent. Sleeps between attempts; this is
/// the only place in the engine that voluntarily suspends.
pub fn with_retry<T, F>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= config.max_retries || is_permanent_failure(&err.to_string()) {
                    return Err(err);
                }
                std::thread::sleep(config.delay_for(attempt));
                attempt += 1;
            }
        }
    }
}
