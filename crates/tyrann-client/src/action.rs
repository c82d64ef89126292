//! Call actions and call results.
//!
//! A [`CallAction`] is a plain, serializable description of one call. It is
//! built without I/O and can be logged, queued or inspected by middleware
//! before anything is sent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::endpoint::Method;
use crate::error::TyrannError;
use crate::transport::TransportResponse;

/// Prefix of every action's `type` field.
pub const ACTION_TYPE_PREFIX: &str = "tyrann/";

/// The request sections of a call. Absent sections are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_path(mut self, path: Value) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` and use it as the body section.
    pub fn with_json_body<T: Serialize>(self, body: &T) -> Result<Self, serde_json::Error> {
        Ok(self.with_body(serde_json::to_value(body)?))
    }
}

/// A described, not yet performed, call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallAction {
    /// `tyrann/<name>`.
    #[serde(rename = "type")]
    pub kind: String,
    pub method: Method,
    /// Endpoint name.
    pub name: String,
    pub request: Request,
}

impl CallAction {
    pub fn new(method: Method, name: impl Into<String>, request: Request) -> Self {
        let name = name.into();
        Self {
            kind: format!("{ACTION_TYPE_PREFIX}{name}"),
            method,
            name,
            request,
        }
    }
}

/// A successful call: a declared status whose body passed its schema.
#[derive(Debug, Clone)]
pub struct CallResult {
    pub response: TransportResponse,
    value: Value,
}

impl CallResult {
    /// Pair a response with its validated body.
    pub fn new(response: TransportResponse, value: Value) -> Self {
        Self { response, value }
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// The validated body, if the call ended with `status`.
    pub fn get(&self, status: u16) -> Option<&Value> {
        (self.status() == status).then_some(&self.value)
    }

    /// The validated body, whatever the status.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Deserialize the body of a `status` result into `T`.
    pub fn decode<T: DeserializeOwned>(&self, status: u16) -> Result<T, TyrannError> {
        let value = self.get(status).ok_or(TyrannError::UnexpectedStatus {
            expected: status,
            actual: self.status(),
        })?;
        Ok(T::deserialize(value)?)
    }
}
