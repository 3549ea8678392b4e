// Retry logic for transient RPC failures
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given backoff delay in ms
    Retry(u64),
    /// Do not retry, the call has failed permanently
    GiveUp,
}

/// Exponential backoff policy
///
/// delay = base_delay * (backoff_factor ^ attempt) * (1.0 ± 0.1)
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            backoff_factor,
        }
    }

    /// Decide whether `attempt` (0-based, already failed) is followed by another
    ///
    /// `seed` keeps the jitter deterministic per operation, e.g. the RPC method name.
    pub fn should_retry(&self, seed: &str, attempt: u32) -> RetryDecision {
        if attempt + 1 >= self.max_attempts {
            warn!(
                operation = %seed,
                attempts = attempt + 1,
                max_attempts = self.max_attempts,
                "Max retry attempts reached"
            );
            return RetryDecision::GiveUp;
        }

        let base_delay_ms = self.base_delay_ms as f64 * self.backoff_factor.powi(attempt as i32);

        let jitter_seed = seed.chars().map(|c| c as u32).sum::<u32>();
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0); // 0.9 to 1.1

        let delay_ms = (base_delay_ms * jitter_factor) as u64;

        info!(
            operation = %seed,
            attempt = attempt + 1,
            max_attempts = self.max_attempts,
            delay_ms = delay_ms,
            "Scheduling retry"
        );

        RetryDecision::Retry(delay_ms)
    }
}
