//! Retry with exponential backoff.
//!
//! Retries only when the exchange itself failed (connection failures,
//! timeouts). Invalid URLs and headers, undeclared statuses and invalid
//! bodies are returned immediately without retry.

use std::time::Duration;

use async_trait::async_trait;

use super::{Middleware, Next};
use crate::action::{CallAction, CallResult};
use crate::config::ClientOptions;
use crate::error::TyrannError;

/// Default number of retry attempts after the initial call.
const MAX_RETRIES: u32 = 3;

/// Default base delay between retries (doubles each attempt: 200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Re-runs the rest of the chain on transport errors.
#[derive(Debug, Clone)]
pub struct RetryMiddleware {
    max_retries: u32,
    base_delay: Duration,
}

impl Default for RetryMiddleware {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
        }
    }
}

impl RetryMiddleware {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[async_trait]
impl Middleware for RetryMiddleware {
    async fn handle(
        &self,
        action: &CallAction,
        _options: &ClientOptions,
        next: Next<'_>,
    ) -> Result<CallResult, TyrannError> {
        // Retry attempts with backoff, then one final attempt without retry.
        for attempt in 0..self.max_retries {
            match next.run().await {
                Err(TyrannError::Transport(e)) if e.is_retryable() => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        method = %action.method,
                        endpoint = %action.name,
                        "call failed before a response arrived, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
        next.run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double() {
        let retry = RetryMiddleware::default();
        assert_eq!(retry.delay(0), Duration::from_millis(200));
        assert_eq!(retry.delay(1), Duration::from_millis(400));
        assert_eq!(retry.delay(2), Duration::from_millis(800));
    }

    #[test]
    fn delay_saturates() {
        let retry = RetryMiddleware::new(100, Duration::from_secs(1));
        assert_eq!(retry.delay(64), Duration::from_secs(1).saturating_mul(u32::MAX));
    }
}
