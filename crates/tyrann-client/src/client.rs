//! The client and its call pipeline.
//!
//! ```text
//! call ─▶ middlewares ─▶ resolve operation ─▶ encode sections ─▶ merge config
//!                                                                    │
//!   CallResult ◀─ validate body ◀─ look up status schema ◀─ transport┘
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::action::{CallAction, CallResult, Request};
use crate::config::{ClientOptions, ConfigSource, RequestConfig};
use crate::encoding::{Body, EncodeError};
use crate::endpoint::{Apis, Method, Operation};
use crate::error::TyrannError;
use crate::middleware::Next;
use crate::transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};

/// Typed client over a set of endpoint descriptors.
///
/// Cheap to clone; clones share the descriptors and the transport.
#[derive(Debug, Clone)]
pub struct Tyrann {
    apis: Arc<Apis>,
    options: ClientOptions,
    /// The configured transport, or a [`ReqwestTransport`] when none was given.
    transport: Arc<dyn Transport>,
}

impl Tyrann {
    /// Client with default options: a fresh [`ReqwestTransport`], no base
    /// URL and no middlewares.
    pub fn new(apis: Apis) -> Self {
        Self::with_options(apis, ClientOptions::default())
    }

    pub fn with_options(apis: Apis, options: ClientOptions) -> Self {
        let transport = match &options.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(ReqwestTransport::new()),
        };
        Self {
            apis: Arc::new(apis),
            options,
            transport,
        }
    }

    pub fn apis(&self) -> &Apis {
        &self.apis
    }

    /// The global options this client was created with.
    pub fn client_options(&self) -> &ClientOptions {
        &self.options
    }

    /// Describe a call without performing it.
    pub fn create_call(&self, method: Method, name: impl Into<String>, request: Request) -> CallAction {
        CallAction::new(method, name, request)
    }

    /// Perform `action` with the client's options.
    pub async fn call(&self, action: &CallAction) -> Result<CallResult, TyrannError> {
        self.call_with(action, &ClientOptions::default()).await
    }

    /// Perform `action` with per-call `options` layered over the client's.
    pub async fn call_with(
        &self,
        action: &CallAction,
        options: &ClientOptions,
    ) -> Result<CallResult, TyrannError> {
        let chain = options
            .middlewares
            .as_deref()
            .or(self.options.middlewares.as_deref())
            .unwrap_or(&[]);
        Next::new(self, chain, action, options).run().await
    }

    pub async fn get(&self, name: &str, request: Request) -> Result<CallResult, TyrannError> {
        self.call(&self.create_call(Method::Get, name, request)).await
    }

    pub async fn post(&self, name: &str, request: Request) -> Result<CallResult, TyrannError> {
        self.call(&self.create_call(Method::Post, name, request)).await
    }

    pub async fn put(&self, name: &str, request: Request) -> Result<CallResult, TyrannError> {
        self.call(&self.create_call(Method::Put, name, request)).await
    }

    pub async fn delete(&self, name: &str, request: Request) -> Result<CallResult, TyrannError> {
        self.call(&self.create_call(Method::Delete, name, request)).await
    }

    pub async fn options(&self, name: &str, request: Request) -> Result<CallResult, TyrannError> {
        self.call(&self.create_call(Method::Options, name, request)).await
    }

    pub async fn patch(&self, name: &str, request: Request) -> Result<CallResult, TyrannError> {
        self.call(&self.create_call(Method::Patch, name, request)).await
    }

    // -- Pipeline -------------------------------------------------------------

    /// The innermost step of every chain: encode, send, decode.
    pub(crate) async fn dispatch(
        &self,
        action: &CallAction,
        options: &ClientOptions,
    ) -> Result<CallResult, TyrannError> {
        let operation = self
            .apis
            .operation(&action.name, action.method)
            .ok_or_else(|| TyrannError::OperationNotDeclared {
                method: action.method,
                name: action.name.clone(),
            })?;

        let request = TransportRequest {
            url: encode_target(operation, action)?,
            method: action.method,
            body: encode_body(operation, &action.request)?,
            config: self.request_config(options),
        };

        let transport = options.transport.as_ref().unwrap_or(&self.transport);

        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let response = transport.request(&request).await?;
        decode_response(operation, request, response)
    }

    /// Global config with the call's config merged on top. Dynamic sources
    /// are evaluated here, once per call.
    fn request_config(&self, options: &ClientOptions) -> RequestConfig {
        let resolve = |source: Option<&ConfigSource>| {
            source.map(ConfigSource::resolve).unwrap_or_default()
        };
        let global = resolve(self.options.request_config.as_ref());
        match options.request_config.as_ref() {
            Some(local) => global.merge(&local.resolve()),
            None => global,
        }
    }
}

/// Encoded path (or the bare name) plus `?query` when there is one.
fn encode_target(operation: &Operation, action: &CallAction) -> Result<String, TyrannError> {
    let request = &action.request;

    let path = match (&operation.path, &request.path) {
        (Some(schema), params) => {
            let encoded = schema.encode(params.clone().unwrap_or(Value::Null));
            operation.options.path_encoder().encode(&action.name, &encoded)?
        }
        (None, Some(_)) => return Err(EncodeError::UndeclaredSection { section: "path" }.into()),
        (None, None) => action.name.clone(),
    };

    let query = match (&operation.query, &request.query) {
        (Some(schema), params) => {
            let encoded = schema.encode(params.clone().unwrap_or(Value::Null));
            operation.options.query_encoder().encode(&encoded)?
        }
        (None, Some(_)) => return Err(EncodeError::UndeclaredSection { section: "query" }.into()),
        (None, None) => String::new(),
    };

    if query.is_empty() {
        Ok(path)
    } else {
        Ok(format!("{path}?{query}"))
    }
}

fn encode_body(operation: &Operation, request: &Request) -> Result<Option<Body>, TyrannError> {
    let encoded = match (&operation.body, &request.body) {
        (Some(schema), Some(body)) => schema.encode(body.clone()),
        // A defaultable body schema still produces a body when none is given.
        (Some(schema), None) => match schema.encode(Value::Null) {
            Value::Null => return Ok(None),
            filled => filled,
        },
        (None, Some(_)) => return Err(EncodeError::UndeclaredSection { section: "body" }.into()),
        (None, None) => return Ok(None),
    };
    Ok(Some(operation.options.body_encoder().encode(encoded)?))
}

fn decode_response(
    operation: &Operation,
    request: TransportRequest,
    response: TransportResponse,
) -> Result<CallResult, TyrannError> {
    let Some(schema) = operation.response_schema(response.status) else {
        tracing::warn!(
            status = response.status,
            method = %request.method,
            url = %request.url,
            "response status is not declared for this operation"
        );
        return Err(TyrannError::StatusNotHandled {
            status: response.status,
            request: Box::new(request),
            response: Box::new(response),
        });
    };

    match schema.validate(&response.data) {
        Ok(value) => {
            tracing::debug!(status = response.status, url = %request.url, "response decoded");
            Ok(CallResult::new(response, value))
        }
        Err(errors) => {
            tracing::warn!(
                status = response.status,
                url = %request.url,
                errors = errors.len(),
                "response body failed validation"
            );
            Err(TyrannError::BadResponse {
                errors,
                request: Box::new(request),
                response: Box::new(response),
            })
        }
    }
}
