// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Bounded retry with linearly increasing backoff.
///
/// Every attempt runs under its own timeout; an attempt that exceeds it is
/// cancelled and counted as a failure.
use std::time::Duration;

use masterror::AppError;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Configuration for retry behavior with linear backoff.
#[derive(Debug, Clone,)]
pub struct RetryConfig
{
    /// Maximum number of attempts (default: 3).
    pub max_attempts:    u32,
    /// Delay added per failed attempt in milliseconds (default: 500), so the
    /// n-th retry waits `n * delay_step_ms`.
    pub delay_step_ms:   u64,
    /// Upper bound for a single attempt (default: 10 seconds).
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig
{
    fn default() -> Self
    {
        Self {
            max_attempts:    3,
            delay_step_ms:   500,
            attempt_timeout: Duration::from_secs(10,),
        }
    }
}

impl RetryConfig
{
    /// Delay awaited after the failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32,) -> Duration
    {
        Duration::from_millis(self.delay_step_ms.saturating_mul(u64::from(attempt,),),)
    }
}

/// Executes an async operation with bounded retries.
///
/// # Arguments
///
/// * `config` - Retry configuration (attempts, delays, timeout)
/// * `operation_name` - Name of the operation for logging
/// * `f` - Async function producing a fresh attempt
///
/// # Errors
///
/// Returns the last error encountered if all attempts fail. A timed out
/// attempt surfaces as a service [`AppError`].
///
/// # Example
///
/// ```no_run
/// use masterror::AppError;
/// use sponsorwall::{RetryConfig, retry_with_backoff};
///
/// # async fn example() -> Result<(), AppError> {
/// let config = RetryConfig::default();
/// let result = retry_with_backoff(&config, "fetch avatar", || async {
///     Ok::<_, AppError,>(42,)
/// },)
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T,>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
) -> Result<T, AppError,>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError,>,>,
{
    let mut attempt = 1;

    loop {
        let outcome = match timeout(config.attempt_timeout, f(),).await {
            Ok(result,) => result,
            Err(_,) => Err(AppError::service(format!(
                "{operation_name} timed out after {}ms",
                config.attempt_timeout.as_millis()
            ),),),
        };

        match outcome {
            Ok(result,) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result,);
            }
            Err(error,) => {
                if attempt >= config.max_attempts {
                    warn!(
                        "{} failed after {} attempts: {}",
                        operation_name, config.max_attempts, error
                    );
                    return Err(error,);
                }

                let delay = config.delay_after(attempt,);
                debug!(
                    "{} failed on attempt {}/{}: {}. Retrying in {}ms...",
                    operation_name,
                    attempt,
                    config.max_attempts,
                    error,
                    delay.as_millis()
                );

                sleep(delay,).await;
                attempt += 1;
            }
        }
    }
}
