//! Capped exponential backoff.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::Result;

/// Jitter applied when enabled, as a fraction of the delay.
const JITTER_FACTOR: f64 = 0.1;

/// Retry policy derived from [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub use_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_retries.saturating_add(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier.max(1.0),
            use_jitter: config.jitter,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt.
    pub fn none() -> Self {
        Self::from(&RetryConfig::none())
    }

    /// Delay before retry number `attempt + 1`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(base as u64).min(self.max_delay);

        if self.use_jitter {
            add_jitter(delay)
        } else {
            delay
        }
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts. Returns the last error.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_retryable() || attempt + 1 >= attempts {
                        return Err(err);
                    }

                    let delay = self.calculate_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Remote request failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn add_jitter(delay: Duration) -> Duration {
    let range = delay.as_millis() as f64 * JITTER_FACTOR;
    if range <= 0.0 {
        return delay;
    }
    let jitter = rand::thread_rng().gen_range(-range..=range);
    Duration::from_millis((delay.as_millis() as f64 + jitter).max(0.0) as u64)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::error::ClientError;

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy::from(
            &RetryConfig::default()
                .with_max_retries(retries)
                .with_initial_delay_ms(1)
                .with_jitter(false),
        )
    }

    #[test]
    fn delay_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            backoff_multiplier: 2.0,
            use_jitter: false,
        };
        assert_eq!(policy.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(300));
        assert_eq!(policy.calculate_delay(6), Duration::from_millis(300));
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let policy = RetryPolicy {
            use_jitter: true,
            ..fast_policy(1)
        };
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            ..policy
        };
        for _ in 0..50 {
            let delay = policy.calculate_delay(0).as_millis();
            assert!((900..=1100).contains(&delay), "{}", delay);
        }
    }

    #[tokio::test]
    async fn retries_transient_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = fast_policy(2)
            .execute(|| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ClientError::Network("reset".to_string()))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = fast_policy(1)
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::Timeout(10))
                }
            })
            .await;

        assert!(matches!(result.unwrap_err(), ClientError::Timeout(10)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = fast_policy(3)
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::Api {
                        status: 400,
                        message: "bad request".to_string(),
                    })
                }
            })
            .await;

        assert_eq!(result.unwrap_err().status(), Some(400));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
