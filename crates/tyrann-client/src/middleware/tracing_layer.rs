//! Per-call tracing span.

use std::time::Instant;

use async_trait::async_trait;
use tracing::Instrument;

use super::{Middleware, Next};
use crate::action::{CallAction, CallResult};
use crate::config::ClientOptions;
use crate::error::TyrannError;

/// Wraps the rest of the chain in an `info` span named `tyrann.call` and
/// logs the outcome with its latency.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

#[async_trait]
impl Middleware for TracingMiddleware {
    async fn handle(
        &self,
        action: &CallAction,
        _options: &ClientOptions,
        next: Next<'_>,
    ) -> Result<CallResult, TyrannError> {
        let span = tracing::info_span!(
            "tyrann.call",
            method = %action.method,
            endpoint = %action.name,
        );
        let started = Instant::now();
        let outcome = next.run().instrument(span.clone()).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        span.in_scope(|| match &outcome {
            Ok(result) => tracing::info!(status = result.status(), latency_ms, "call completed"),
            Err(e) => tracing::warn!(status = e.status(), latency_ms, error = %e, "call failed"),
        });
        outcome
    }
}
