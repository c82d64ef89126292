//! HTTP transport seam.
//!
//! The call pipeline never talks to the network directly; it hands a
//! [`TransportRequest`] to a [`Transport`] and gets back a
//! [`TransportResponse`] for every status code. Only failures to obtain a
//! response at all (connection refused, timeout, malformed URL) are errors.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::config::RequestConfig;
use crate::encoding::Body;
use crate::endpoint::Method;

/// A fully encoded request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Target: the encoded path plus `?query`, relative to the config's base
    /// URL unless absolute.
    pub url: String,
    pub method: Method,
    pub body: Option<Body>,
    /// Merged global and per-call settings.
    pub config: RequestConfig,
}

/// What came back over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON body. An empty body is `null`; a body that is not JSON is
    /// kept as a string.
    pub data: Value,
}

impl TransportResponse {
    /// Response with no headers.
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            data,
        }
    }

    /// Interpret raw body bytes.
    pub fn parse_body(bytes: &[u8]) -> Value {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Value::Null;
        }
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }
}

/// Errors that prevent a response from being obtained.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP exchange itself failed.
    #[error("HTTP error calling {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Raised by custom transports.
    #[error("{0}")]
    Custom(String),
}

impl TransportError {
    /// Whether sending again might succeed. URL and header problems fail the
    /// same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Custom(_))
    }
}

/// Performs requests. Implementations must return a response for every
/// status code the server sends.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn request(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Whether `target` starts with `scheme://`. A `://` later in the target
/// (for example inside a path parameter) does not make it absolute.
fn is_absolute(target: &str) -> bool {
    let Some((scheme, _)) = target.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Join `target` onto `base`, appending to the base path rather than
/// replacing it. Absolute targets are used as they are.
pub fn resolve_url(base: Option<&Url>, target: &str) -> Result<Url, TransportError> {
    let invalid = |e: url::ParseError, url: String| TransportError::InvalidUrl {
        reason: e.to_string(),
        url,
    };

    if is_absolute(target) {
        return Url::parse(target).map_err(|e| invalid(e, target.to_string()));
    }

    match base {
        Some(base) => {
            let joined = format!(
                "{}/{}",
                base.as_str().trim_end_matches('/'),
                target.trim_start_matches('/')
            );
            Url::parse(&joined).map_err(|e| invalid(e, joined.clone()))
        }
        None => Url::parse(target).map_err(|e| invalid(e, target.to_string())),
    }
}

/// [`Transport`] over a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing client, keeping its connection pool and defaults.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Patch => reqwest::Method::PATCH,
        Method::Trace => reqwest::Method::TRACE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = resolve_url(request.config.base_url.as_ref(), &request.url)?;
        let endpoint = url.to_string();

        let mut builder = self.http.request(to_reqwest_method(request.method), url);
        for (name, value) in &request.config.headers {
            let header = reqwest::header::HeaderValue::from_str(value).map_err(|e| {
                TransportError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            builder = builder.header(name.as_str(), header);
        }
        if let Some(timeout) = request.config.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match &request.body {
            Some(Body::Json(value)) => builder.json(value),
            Some(Body::Text(text)) => builder.body(text.clone()),
            None => builder,
        };

        let resp = builder.send().await.map_err(|e| TransportError::Http {
            url: endpoint.clone(),
            source: e,
        })?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let bytes = resp.bytes().await.map_err(|e| TransportError::Http {
            url: endpoint.clone(),
            source: e,
        })?;

        tracing::debug!(url = %endpoint, status, bytes = bytes.len(), "received response");

        Ok(TransportResponse {
            status,
            headers,
            data: TransportResponse::parse_body(&bytes),
        })
    }
}
