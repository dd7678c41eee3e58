//! Deadline wrapper for remote calls.

use quest_core::{QuestError, Result};
use std::future::Future;
use std::time::Duration;

/// Runs a remote call under `timeout`.
///
/// Expiry is reported as `QuestError::Timeout`, separate from transport failures.
pub async fn remote_call<T, F>(operation: &str, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                "[RemoteCall] '{}' did not settle within {:?}",
                operation,
                timeout
            );
            Err(QuestError::timeout(operation, timeout.as_millis() as u64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let result: Result<()> = remote_call("get_quests", Duration::from_secs(2), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err, QuestError::timeout("get_quests", 2_000));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let result = remote_call("get_quests", Duration::from_secs(2), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
