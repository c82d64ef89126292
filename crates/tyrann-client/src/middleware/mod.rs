//! # Middleware Chain
//!
//! Calls pass through an onion of middlewares before reaching the pipeline
//! that encodes, sends and decodes them. Given the chain `[A, B, C]`, a call
//! enters `A`, then `B`, then `C`, then the pipeline, and the result unwinds
//! through `C`, `B`, `A`.
//!
//! Each middleware receives the action, the call's options and a [`Next`]
//! continuation. It may:
//! - call [`Next::run`] to continue unchanged,
//! - call [`Next::run_with`] to continue with a different action or options,
//! - call `next` more than once (see [`RetryMiddleware`]),
//! - return without calling `next` at all.

mod retry;
mod tracing_layer;

pub use retry::RetryMiddleware;
pub use tracing_layer::TracingMiddleware;

use std::sync::Arc;

use async_trait::async_trait;

use crate::action::{CallAction, CallResult};
use crate::client::Tyrann;
use crate::config::ClientOptions;
use crate::error::TyrannError;

/// A layer around every call.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(
        &self,
        action: &CallAction,
        options: &ClientOptions,
        next: Next<'_>,
    ) -> Result<CallResult, TyrannError>;
}

/// The rest of the chain after the current middleware.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    client: &'a Tyrann,
    chain: &'a [Arc<dyn Middleware>],
    action: &'a CallAction,
    options: &'a ClientOptions,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        client: &'a Tyrann,
        chain: &'a [Arc<dyn Middleware>],
        action: &'a CallAction,
        options: &'a ClientOptions,
    ) -> Self {
        Self {
            client,
            chain,
            action,
            options,
        }
    }

    /// Continue with the action and options this middleware received.
    pub async fn run(self) -> Result<CallResult, TyrannError> {
        self.run_with(self.action, self.options).await
    }

    /// Continue with a replacement action or options.
    pub async fn run_with(
        self,
        action: &CallAction,
        options: &ClientOptions,
    ) -> Result<CallResult, TyrannError> {
        match self.chain.split_first() {
            Some((middleware, rest)) => {
                let next = Next::new(self.client, rest, action, options);
                middleware.handle(action, options, next).await
            }
            None => self.client.dispatch(action, options).await,
        }
    }

    /// Middlewares still to run after this point.
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }
}
