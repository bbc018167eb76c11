//! Timeout enforcement.
//!
//! Wraps a fallible call in `tokio::time::timeout`, mapping expiry to the
//! caller's own error so timeouts stay distinguishable from call failures.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

/// Run `fut` with a deadline of `limit`.
///
/// On expiry the future is dropped and `on_timeout` builds the error.
pub async fn bounded<T, E, F>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce() -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_in_time() {
        let result: Result<u32, String> =
            bounded(Duration::from_secs(1), async { Ok(7) }, || "late".to_string()).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: Result<u32, String> = bounded(
            Duration::from_secs(1),
            async { Err("boom".to_string()) },
            || "late".to_string(),
        )
        .await;
        assert_eq!(result.unwrap_err(), "boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_maps_error() {
        let result: Result<u32, String> = bounded(
            Duration::from_millis(50),
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(1)
            },
            || "late".to_string(),
        )
        .await;
        assert_eq!(result.unwrap_err(), "late");
    }
}
