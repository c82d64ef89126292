//! # Endpoint Descriptors
//!
//! Declarative description of a remote API:
//!
//! ```text
//! Apis ── name ──▶ Endpoint ── method ──▶ Operation
//!                                          ├─ query / path / body schemas
//!                                          ├─ status ──▶ response schema
//!                                          └─ encoder overrides
//! ```
//!
//! An endpoint name doubles as its path template (`/brotli/{id}`) when the
//! operation declares a path schema.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tyrann_schema::{IntoSchema, Schema};

use crate::encoding::{
    BodyEncoder, IdentityBodyEncoder, PathEncoder, QueryEncoder, QueryStringEncoder,
    TemplatePathEncoder,
};

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Patch,
    Trace,
}

impl Method {
    /// Lowercase name, as used in call actions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-operation replacements for the default wire encoders.
#[derive(Clone, Default)]
pub struct OperationOptions {
    pub query_encoder: Option<Arc<dyn QueryEncoder>>,
    pub path_encoder: Option<Arc<dyn PathEncoder>>,
    pub body_encoder: Option<Arc<dyn BodyEncoder>>,
}

impl OperationOptions {
    pub fn query_encoder(&self) -> &dyn QueryEncoder {
        self.query_encoder.as_deref().unwrap_or(&QueryStringEncoder)
    }

    pub fn path_encoder(&self) -> &dyn PathEncoder {
        self.path_encoder.as_deref().unwrap_or(&TemplatePathEncoder)
    }

    pub fn body_encoder(&self) -> &dyn BodyEncoder {
        self.body_encoder.as_deref().unwrap_or(&IdentityBodyEncoder)
    }
}

impl fmt::Debug for OperationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationOptions")
            .field("custom_query_encoder", &self.query_encoder.is_some())
            .field("custom_path_encoder", &self.path_encoder.is_some())
            .field("custom_body_encoder", &self.body_encoder.is_some())
            .finish()
    }
}

/// One method of one endpoint.
///
/// A request section may only be sent when its schema is declared. A
/// response is accepted only for declared status codes, and its body must
/// satisfy that status's schema.
#[derive(Debug, Clone, Default)]
pub struct Operation {
    pub query: Option<Schema>,
    pub path: Option<Schema>,
    pub body: Option<Schema>,
    pub responses: BTreeMap<u16, Schema>,
    pub options: OperationOptions,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the query schema.
    pub fn query(mut self, schema: impl IntoSchema) -> Self {
        self.query = Some(schema.into_schema());
        self
    }

    /// Declare the path-parameter schema. Its fields fill the `{name}`
    /// placeholders of the endpoint name.
    pub fn path(mut self, schema: impl IntoSchema) -> Self {
        self.path = Some(schema.into_schema());
        self
    }

    /// Declare the body schema.
    pub fn body(mut self, schema: impl IntoSchema) -> Self {
        self.body = Some(schema.into_schema());
        self
    }

    /// Declare the body schema of responses with `status`.
    pub fn response(mut self, status: u16, schema: impl IntoSchema) -> Self {
        self.responses.insert(status, schema.into_schema());
        self
    }

    pub fn query_encoder(mut self, encoder: impl QueryEncoder + 'static) -> Self {
        self.options.query_encoder = Some(Arc::new(encoder));
        self
    }

    pub fn path_encoder(mut self, encoder: impl PathEncoder + 'static) -> Self {
        self.options.path_encoder = Some(Arc::new(encoder));
        self
    }

    pub fn body_encoder(mut self, encoder: impl BodyEncoder + 'static) -> Self {
        self.options.body_encoder = Some(Arc::new(encoder));
        self
    }

    /// Schema for responses with `status`, if declared.
    pub fn response_schema(&self, status: u16) -> Option<&Schema> {
        self.responses.get(&status)
    }

    /// Declared status codes, ascending.
    pub fn statuses(&self) -> impl Iterator<Item = u16> + '_ {
        self.responses.keys().copied()
    }
}

/// The operations available under one endpoint name.
#[derive(Debug, Clone, Default)]
pub struct Endpoint {
    operations: BTreeMap<Method, Operation>,
}

impl Endpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `operation` for `method`, replacing any earlier one.
    pub fn operation(mut self, method: Method, operation: Operation) -> Self {
        self.operations.insert(method, operation);
        self
    }

    pub fn get(self, operation: Operation) -> Self {
        self.operation(Method::Get, operation)
    }

    pub fn post(self, operation: Operation) -> Self {
        self.operation(Method::Post, operation)
    }

    pub fn put(self, operation: Operation) -> Self {
        self.operation(Method::Put, operation)
    }

    pub fn delete(self, operation: Operation) -> Self {
        self.operation(Method::Delete, operation)
    }

    pub fn options(self, operation: Operation) -> Self {
        self.operation(Method::Options, operation)
    }

    pub fn patch(self, operation: Operation) -> Self {
        self.operation(Method::Patch, operation)
    }

    pub fn trace(self, operation: Operation) -> Self {
        self.operation(Method::Trace, operation)
    }

    pub fn operation_for(&self, method: Method) -> Option<&Operation> {
        self.operations.get(&method)
    }

    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.operations.keys().copied()
    }
}

/// Every endpoint of an API, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Apis {
    endpoints: BTreeMap<String, Endpoint>,
}

impl Apis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `endpoint` under `name`, replacing any earlier one.
    pub fn endpoint(mut self, name: impl Into<String>, endpoint: Endpoint) -> Self {
        self.endpoints.insert(name.into(), endpoint);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// The operation declared for `name` and `method`.
    pub fn operation(&self, name: &str, method: Method) -> Option<&Operation> {
        self.get(name)?.operation_for(method)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{Body, JsonStringEncoder};
    use serde_json::json;
    use tyrann_schema::{number, object, string};

    fn apis() -> Apis {
        Apis::new()
            .endpoint(
                "/brotli",
                Endpoint::new().get(
                    Operation::new()
                        .query(object().field("brotli", string()))
                        .response(200, object().field("result", number())),
                ),
            )
            .endpoint(
                "/body",
                Endpoint::new().post(Operation::new().body(object()).body_encoder(JsonStringEncoder::new())),
            )
    }

    #[test]
    fn lookup_by_name_and_method() {
        let apis = apis();
        assert!(apis.operation("/brotli", Method::Get).is_some());
        assert!(apis.operation("/brotli", Method::Post).is_none());
        assert!(apis.operation("/missing", Method::Get).is_none());
        assert_eq!(apis.names().collect::<Vec<_>>(), ["/body", "/brotli"]);
    }

    #[test]
    fn response_schemas_keyed_by_status() {
        let apis = apis();
        let op = apis.operation("/brotli", Method::Get).unwrap();
        assert_eq!(op.statuses().collect::<Vec<_>>(), [200]);
        assert!(op.response_schema(200).unwrap().is(&json!({ "result": 1 })));
        assert!(op.response_schema(404).is_none());
    }

    #[test]
    fn encoder_overrides_replace_defaults() {
        let apis = apis();
        let op = apis.operation("/body", Method::Post).unwrap();
        assert_eq!(
            op.options.body_encoder().encode(json!({ "x": 1 })).unwrap(),
            Body::Text("{\"x\":1}".into())
        );
        let plain = apis.operation("/brotli", Method::Get).unwrap();
        assert_eq!(
            plain.options.body_encoder().encode(json!(1)).unwrap(),
            Body::Json(json!(1))
        );
    }

    #[test]
    fn method_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Method::Patch).unwrap(), json!("patch"));
        assert_eq!(
            serde_json::from_value::<Method>(json!("delete")).unwrap(),
            Method::Delete
        );
        assert_eq!(Method::Options.to_string(), "options");
    }
}
