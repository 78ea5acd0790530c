//! Retry policy for provider fetches.
//!
//! A [`RetryPolicy`] is built once per client from [`HttpSettings`] and wraps
//! every fetch of a provider URL. Transient failures (timeouts, connection
//! failures, 429, 5xx) are retried; a 429 carrying `Retry-After` waits for
//! what the provider asked, anything else backs off exponentially.

use std::future::Future;
use std::time::Duration;

use crate::client::HttpSettings;
use crate::error::ProviderError;

const MAX_DELAY_MS: u64 = 10_000;

/// Returns `true` for errors that are worth retrying after a delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection reset.
/// - [`ProviderError::RateLimited`]: the provider asked us to back off.
/// - [`ProviderError::UnexpectedStatus`] with a 5xx status.
///
/// **Not retriable:**
/// - 4xx statuses other than 429.
/// - [`ProviderError::Deserialize`]: malformed body.
/// - [`ProviderError::InvalidEndpoint`]: configuration problem.
pub(crate) fn is_retriable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ProviderError::RateLimited { .. } => true,
        ProviderError::UnexpectedStatus { status, .. } => *status >= 500,
        ProviderError::Deserialize { .. } | ProviderError::InvalidEndpoint { .. } => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    max_retries: u32,
    backoff_base_ms: u64,
}

impl RetryPolicy {
    pub(crate) fn from_settings(settings: &HttpSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        }
    }

    /// Upper bound of the back-off before retry number `attempt` (1-based),
    /// before jitter: `backoff_base_ms * 2^(attempt-1)`, capped at 10 s.
    fn backoff_ceiling_ms(&self, attempt: u32) -> u64 {
        let shift = attempt.saturating_sub(1).min(16);
        self.backoff_base_ms
            .saturating_mul(1u64 << shift)
            .min(MAX_DELAY_MS)
    }

    /// Delay before retry number `attempt` after `err`.
    ///
    /// A provider-supplied `Retry-After` is honoured as-is up to the 10 s cap.
    /// Otherwise the exponential ceiling is scaled by a random factor in
    /// `[0.75, 1.25)`.
    fn delay_for(&self, attempt: u32, err: &ProviderError) -> Duration {
        if let ProviderError::RateLimited {
            retry_after_secs: Some(secs),
            ..
        } = err
        {
            return Duration::from_millis(secs.saturating_mul(1_000).min(MAX_DELAY_MS));
        }

        let ceiling = self.backoff_ceiling_ms(attempt);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let jittered = (ceiling as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        Duration::from_millis(jittered)
    }

    /// Fetches `url` through `fetch`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns the first non-retriable error, or the last error once
    /// `max_retries` extra attempts have been spent.
    pub(crate) async fn run<T, F, Fut>(&self, url: &str, mut fetch: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match fetch().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !is_retriable(&err) || attempt >= self.max_retries {
                return Err(err);
            }
            attempt += 1;
            let delay = self.delay_for(attempt, &err);
            tracing::warn!(
                url,
                attempt,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "transient provider error, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
