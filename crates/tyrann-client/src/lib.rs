//! # tyrann-client -- Typed Request/Response Client
//!
//! Declare an API once as endpoint descriptors, then make calls whose
//! requests are encoded and whose responses are validated against those
//! descriptors.
//!
//! ## Architecture
//!
//! - [`endpoint`]: [`Apis`] → [`Endpoint`] → [`Operation`]. Each operation
//!   declares schemas for its query, path and body sections and one schema
//!   per accepted response status.
//! - [`action`]: [`CallAction`] describes a call as plain data;
//!   [`CallResult`] is a validated response tagged with its status.
//! - [`client`]: [`Tyrann`] runs a call through the middleware chain and
//!   then the pipeline (encode, send, look up the status schema, validate).
//! - [`middleware`]: the onion chain plus [`RetryMiddleware`] and
//!   [`TracingMiddleware`].
//! - [`transport`]: the [`Transport`] seam and its `reqwest` implementation.
//!
//! ## Failure model
//!
//! Non-2xx responses are not errors by themselves. A call fails with
//! [`TyrannError::StatusNotHandled`] when the status has no declared schema,
//! and with [`TyrannError::BadResponse`] when the body does not satisfy it.
//! Both keep the request and the response.
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.

pub mod action;
pub mod client;
pub mod config;
pub mod encoding;
pub mod endpoint;
pub mod error;
pub mod middleware;
pub mod transport;

pub use action::{CallAction, CallResult, Request};
pub use client::Tyrann;
pub use config::{ClientOptions, ConfigError, ConfigSource, RequestConfig};
pub use encoding::{Body, BodyEncoder, EncodeError, PathEncoder, QueryEncoder};
pub use endpoint::{Apis, Endpoint, Method, Operation, OperationOptions};
pub use error::TyrannError;
pub use middleware::{Middleware, Next, RetryMiddleware, TracingMiddleware};
pub use transport::{
    ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
