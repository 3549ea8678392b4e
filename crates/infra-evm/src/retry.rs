// Retry wrapper for idempotent RPC calls

use fip_core::application::{RetryDecision, RetryPolicy};
use fip_core::port::ChainError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Run `op` until it succeeds, fails permanently or the policy gives up
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    method: &str,
    mut op: F,
) -> Result<T, ChainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => match policy.should_retry(method, attempt) {
                RetryDecision::Retry(delay_ms) => {
                    warn!(method = %method, attempt = attempt + 1, error = %e, "RPC call failed, retrying");
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp => return Err(e),
            },
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let policy = RetryPolicy::new(3, 1, 2.0);
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = with_retry(&policy, "eth_call", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ChainError::Transport("timeout".to_string()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_policy_limit() {
        let policy = RetryPolicy::new(2, 1, 2.0);
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), _> = with_retry(&policy, "eth_call", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ChainError::Transport("timeout".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ChainError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reverts_are_not_retried() {
        let policy = RetryPolicy::default();
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), _> = tokio_test::block_on(with_retry(&policy, "eth_call", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ChainError::Reverted("paused".to_string()))
        }));

        assert!(matches!(result, Err(ChainError::Reverted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
