/*!
 * Small async and time helpers shared by the HDC crates.
 */
use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::{Error, Result};

/// Run a future with a timeout
///
/// # Arguments
///
/// * `duration` - The timeout duration
/// * `future` - The future to run
///
/// # Returns
///
/// The result of the future, or a timeout error if the timeout is reached
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::timeout(format!(
            "Operation timed out after {}ms",
            duration_to_millis(duration)
        ))),
    }
}

/// Convert a Duration to milliseconds
pub fn duration_to_millis(duration: Duration) -> u64 {
    duration.as_secs() * 1000 + u64::from(duration.subsec_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_failure() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, Error>(42)
        })
        .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_inner_error() {
        let result: Result<()> =
            with_timeout(Duration::from_secs(1), async { Err(Error::runtime("refused")) }).await;
        assert!(matches!(result, Err(Error::Runtime(_))));
    }

    #[test]
    fn test_duration_to_millis() {
        assert_eq!(duration_to_millis(Duration::from_millis(1234)), 1234);
        assert_eq!(duration_to_millis(Duration::from_secs(3)), 3000);
    }
}
