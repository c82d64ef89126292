//! Client configuration.
//!
//! [`RequestConfig`] carries the transport-level settings that apply to every
//! request (base URL, default headers, timeout). [`ClientOptions`] bundles a
//! config source with the transport and the middleware list; a client holds a
//! global set and each call may pass a local set that overrides it field by
//! field.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::middleware::Middleware;
use crate::transport::Transport;

/// Header holding credentials. Its value is redacted from `Debug` output.
pub const AUTHORIZATION: &str = "authorization";

/// Transport settings applied to a request.
///
/// Header names are stored lowercase, so merging overrides them
/// case-insensitively.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestConfig {
    /// Prefix for relative request targets.
    pub base_url: Option<Url>,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if name == AUTHORIZATION {
                    "[REDACTED]"
                } else {
                    value.as_str()
                };
                (name.as_str(), shown)
            })
            .collect();
        f.debug_struct("RequestConfig")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("headers", &headers)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RequestConfig {
    /// Empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Add a default header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add an `Authorization: Bearer <token>` header.
    pub fn bearer(self, token: &str) -> Self {
        self.with_header(AUTHORIZATION, format!("Bearer {token}"))
    }

    /// Layer `overrides` on top of `self`. Scalar settings present in
    /// `overrides` win; headers are unioned with `overrides` taking
    /// precedence.
    pub fn merge(&self, overrides: &RequestConfig) -> RequestConfig {
        let mut headers = self.headers.clone();
        headers.extend(
            overrides
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        RequestConfig {
            base_url: overrides.base_url.clone().or_else(|| self.base_url.clone()),
            headers,
            timeout: overrides.timeout.or(self.timeout),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables (all optional):
    /// - `TYRANN_BASE_URL`: base URL for relative targets
    /// - `TYRANN_TIMEOUT_SECS`: request timeout in whole seconds
    /// - `TYRANN_BEARER_TOKEN`: sent as `Authorization: Bearer <token>`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Some(raw) = var("TYRANN_BASE_URL") {
            let url = Url::parse(&raw)
                .map_err(|e| ConfigError::InvalidUrl("TYRANN_BASE_URL".to_string(), e.to_string()))?;
            config.base_url = Some(url);
        }

        if let Some(raw) = var("TYRANN_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        if let Some(token) = var("TYRANN_BEARER_TOKEN") {
            config = config.bearer(&token);
        }

        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid TYRANN_TIMEOUT_SECS value {0:?}: expected whole seconds")]
    InvalidTimeout(String),
}

type ConfigFn = dyn Fn() -> RequestConfig + Send + Sync;

/// Where a client's [`RequestConfig`] comes from.
#[derive(Clone)]
pub enum ConfigSource {
    /// A fixed configuration.
    Static(RequestConfig),
    /// Re-evaluated on every call, e.g. to pick up a rotated token.
    Dynamic(Arc<ConfigFn>),
}

impl ConfigSource {
    /// Source backed by `provider`, evaluated once per call.
    pub fn dynamic<F>(provider: F) -> Self
    where
        F: Fn() -> RequestConfig + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(provider))
    }

    /// Produce the configuration for one call.
    pub fn resolve(&self) -> RequestConfig {
        match self {
            Self::Static(config) => config.clone(),
            Self::Dynamic(provider) => provider(),
        }
    }
}

impl From<RequestConfig> for ConfigSource {
    fn from(config: RequestConfig) -> Self {
        Self::Static(config)
    }
}

impl fmt::Debug for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(config) => f.debug_tuple("Static").field(config).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Options a client is created with, or a call is made with.
///
/// Every field is optional. When a call passes its own options, each field
/// it sets replaces the client's; request configs are merged instead, with
/// the call's settings on top.
#[derive(Clone, Default)]
pub struct ClientOptions {
    /// Transport used to perform requests.
    pub transport: Option<Arc<dyn Transport>>,
    /// Source of transport settings.
    pub request_config: Option<ConfigSource>,
    /// Middleware chain, outermost first.
    pub middlewares: Option<Vec<Arc<dyn Middleware>>>,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("transport", &self.transport)
            .field("request_config", &self.request_config)
            .field(
                "middlewares",
                &self.middlewares.as_ref().map(|chain| chain.len()),
            )
            .finish()
    }
}

impl ClientOptions {
    /// Options with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `transport` for requests.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use an already shared transport.
    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a fixed or dynamic request config.
    pub fn with_request_config(mut self, config: impl Into<ConfigSource>) -> Self {
        self.request_config = Some(config.into());
        self
    }

    /// Evaluate `provider` on every call for the request config.
    pub fn with_dynamic_config<F>(self, provider: F) -> Self
    where
        F: Fn() -> RequestConfig + Send + Sync + 'static,
    {
        self.with_request_config(ConfigSource::dynamic(provider))
    }

    /// Append `middleware` to the chain. It runs inside those added before it.
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares
            .get_or_insert_with(Vec::new)
            .push(Arc::new(middleware));
        self
    }

    /// Replace the chain. An empty list disables the client's middlewares.
    pub fn with_middlewares(mut self, middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        self.middlewares = Some(middlewares);
        self
    }
}
