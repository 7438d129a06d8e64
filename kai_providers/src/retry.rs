use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Delays between attempts of a retried operation.
///
/// The operation runs once, then once more after each of `base_delays`,
/// then `final_retries` more times separated by `final_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delays: Vec<Duration>,
    pub final_retries: usize,
    pub final_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_secs(&[1, 2], 1, 4)
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_secs(base_delays: &[u64], final_retries: usize, final_delay: u64) -> Self {
        Self {
            base_delays: base_delays.iter().copied().map(Duration::from_secs).collect(),
            final_retries,
            final_delay: Duration::from_secs(final_delay),
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            base_delays: Vec::new(),
            final_retries: 0,
            final_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> usize {
        1 + self.base_delays.len() + self.final_retries
    }

    fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        self.base_delays
            .iter()
            .copied()
            .chain(std::iter::repeat_n(self.final_delay, self.final_retries))
    }
}

/// Retry an async operation following `policy`.
///
/// Returns the first success, or the error of the last attempt.
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let total = policy.max_attempts();
    let mut result = operation().await;

    for (i, delay) in policy.delays().enumerate() {
        let Err(e) = &result else {
            return result;
        };
        warn!(
            "Request failed (attempt {}/{total}): {e}. Retrying after {}ms...",
            i + 1,
            delay.as_millis()
        );
        sleep(delay).await;
        result = operation().await;
    }

    result
}
