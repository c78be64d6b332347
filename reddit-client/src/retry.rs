use radar_core::{CoreError, ErrorExt};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts including the first
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,  // 1 second
            max_delay_ms: 30000,  // 30 seconds
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Create retry config optimized for the Reddit API
    pub fn reddit() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000, // Start with 2 seconds for Reddit API
            max_delay_ms: 60000, // Max 1 minute delay
            backoff_multiplier: 2.0,
            jitter_factor: 0.2, // 20% jitter to prevent thundering herd
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponential =
            self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32 - 1);
        let capped = exponential.min(self.max_delay_ms as f64);
        let jitter = capped * self.jitter_factor * fastrand::f64();
        Duration::from_millis((capped + jitter) as u64)
    }
}

/// Run an operation with bounded retries. Only errors classified as
/// retryable are attempted again; a server-mandated retry-after overrides
/// the computed backoff.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    mut run: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempt = 1;
    loop {
        match run().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                let delay = e
                    .retry_after()
                    .unwrap_or_else(|| config.delay_for_attempt(attempt));
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    operation, attempt, config.max_attempts, e, delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                debug!("{} giving up after attempt {}: {}", operation, attempt, e);
                return Err(e);
            }
        }
    }
}
