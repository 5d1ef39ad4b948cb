//! Email source abstraction and shared retry logic for provider adapters

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::error::{CleanerError, Result};
use crate::models::Email;

/// Capability the cleaner needs from a mail provider
///
/// Adapters own transport concerns (auth, pagination, retries). Fetch errors
/// should surface as `FetchFailed` and delete errors as `DeleteFailed`.
#[async_trait]
pub trait EmailClient: Send + Sync {
    /// Get every unread email; an empty mailbox is `Ok(vec![])`
    async fn get_unread_emails(&self) -> Result<Vec<Email>>;

    /// Delete the given emails as one batch; an empty slice is a no-op
    async fn delete_emails(&self, emails: &[Email]) -> Result<()>;
}

// Allow shared ownership of a client
#[async_trait]
impl<T: EmailClient + ?Sized> EmailClient for Arc<T> {
    async fn get_unread_emails(&self) -> Result<Vec<Email>> {
        self.as_ref().get_unread_emails().await
    }

    async fn delete_emails(&self, emails: &[Email]) -> Result<()> {
        self.as_ref().delete_emails(emails).await
    }
}

#[async_trait]
impl<T: EmailClient + ?Sized> EmailClient for Box<T> {
    async fn get_unread_emails(&self) -> Result<Vec<Email>> {
        self.as_ref().get_unread_emails().await
    }

    async fn delete_emails(&self, emails: &[Email]) -> Result<()> {
        self.as_ref().delete_emails(emails).await
    }
}

/// Upper bound for the delay between retries
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Wait before the next attempt: the backoff delay, or longer when the
/// server asked for it with `Retry-After`
fn retry_wait(error: &CleanerError, delay: Duration) -> Duration {
    match error {
        CleanerError::RateLimitExceeded { retry_after } => {
            delay.max(Duration::from_secs(*retry_after))
        }
        _ => delay,
    }
}

/// Execute an async operation with exponential backoff retry
///
/// Only transient errors are retried; the delay starts at `initial_delay`
/// and doubles up to 30 seconds. Rate-limit errors wait at least their
/// `retry_after`.
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    max_retries: u32,
    initial_delay: Duration,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = initial_delay;
    let mut attempts = 0;

    loop {
        attempts += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() && attempts <= max_retries => {
                let wait = retry_wait(&e, delay);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                    operation_name,
                    attempts,
                    max_retries + 1,
                    e,
                    wait
                );
                tokio::time::sleep(wait).await;
                delay = std::cmp::min(delay * 2, MAX_RETRY_DELAY);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_with_retry_succeeds_after_transient_error() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = with_retry("test_op", 3, Duration::from_millis(1), || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                let current = count.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    Err(CleanerError::NetworkError("Connection timeout".to_string()))
                } else {
                    Ok("success".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_fails_on_permanent_error() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = with_retry("test_op", 3, Duration::from_millis(1), || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(CleanerError::AuthError("Invalid credentials".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(CleanerError::AuthError(_))));
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_exhausts_all_retries() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = with_retry("test_op", 3, Duration::from_millis(1), || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(CleanerError::RateLimitExceeded { retry_after: 1 })
            }
        })
        .await;

        assert!(result.is_err());
        // initial + 3 retries
        assert_eq!(attempt_count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_with_retry_zero_retries_runs_once() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = with_retry("test_op", 0, Duration::from_millis(1), || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(CleanerError::NetworkError("down".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_wait_honors_retry_after() {
        let rate_limited = CleanerError::RateLimitExceeded { retry_after: 10 };
        assert_eq!(
            retry_wait(&rate_limited, Duration::from_secs(1)),
            Duration::from_secs(10)
        );
        assert_eq!(
            retry_wait(&rate_limited, Duration::from_secs(16)),
            Duration::from_secs(16)
        );

        let network = CleanerError::NetworkError("reset".to_string());
        assert_eq!(
            retry_wait(&network, Duration::from_secs(2)),
            Duration::from_secs(2)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_sleeps_for_retry_after() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);
        let started = tokio::time::Instant::now();

        let result = with_retry("test_op", 1, Duration::from_millis(1), || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                if count.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(CleanerError::RateLimitExceeded { retry_after: 7 })
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(7));
    }

    struct EmptyMailbox;

    #[async_trait]
    impl EmailClient for EmptyMailbox {
        async fn get_unread_emails(&self) -> Result<Vec<Email>> {
            Ok(Vec::new())
        }

        async fn delete_emails(&self, _emails: &[Email]) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_shared_client_delegates() {
        let client: Arc<dyn EmailClient> = Arc::new(EmptyMailbox);
        assert!(client.get_unread_emails().await.unwrap().is_empty());
        client.delete_emails(&[]).await.unwrap();

        let boxed: Box<dyn EmailClient> = Box::new(EmptyMailbox);
        assert!(boxed.get_unread_emails().await.unwrap().is_empty());
    }
}
