//! # Wire Encoders
//!
//! Second half of request encoding. A section's schema first turns the typed
//! payload into a plain JSON value ([`tyrann_schema::Schema::encode`]); the
//! encoders here turn that plain value into what goes on the wire:
//!
//! | Section | Default | Output |
//! |---------|---------|--------|
//! | query | [`QueryStringEncoder`] | `a=1&ids=1&ids=2` |
//! | path | [`TemplatePathEncoder`] | `/items/42` from `/items/{id}` |
//! | body | [`IdentityBodyEncoder`] | the JSON value itself |
//!
//! Operations can override any of them through
//! [`OperationOptions`](crate::endpoint::OperationOptions).

use std::fmt;

use serde_json::Value;
use tyrann_schema::coerce::to_display_string;
use url::form_urlencoded::byte_serialize;

/// Request body handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Serialized as JSON by the transport.
    Json(Value),
    /// Sent verbatim.
    Text(String),
}

/// Errors raised while encoding a request.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// A `{name}` placeholder had no matching parameter.
    #[error("path template {template} references missing parameter `{name}`")]
    MissingPathParameter {
        /// The endpoint path template.
        template: String,
        /// The placeholder name.
        name: String,
    },

    /// A `{` was never closed.
    #[error("path template {template} has an unterminated placeholder")]
    UnterminatedPlaceholder {
        /// The endpoint path template.
        template: String,
    },

    /// Query and path parameters must be JSON objects.
    #[error("{section} parameters must encode to an object, got {found}")]
    NotAnObject {
        /// `query` or `path`.
        section: &'static str,
        /// The JSON type that was found instead.
        found: &'static str,
    },

    /// The call carries a section its operation does not declare.
    #[error("request carries a {section} section but the operation declares no {section} schema")]
    UndeclaredSection {
        /// `query`, `path` or `body`.
        section: &'static str,
    },

    /// Body serialization failed.
    #[error("failed to serialize body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Turns an encoded query object into a query string (without `?`).
pub trait QueryEncoder: Send + Sync {
    /// Encode `value`.
    fn encode(&self, value: &Value) -> Result<String, EncodeError>;
}

/// Turns encoded path parameters into a request target.
pub trait PathEncoder: Send + Sync {
    /// Encode `value` against the endpoint's path `template`.
    fn encode(&self, template: &str, value: &Value) -> Result<String, EncodeError>;
}

/// Turns an encoded body into a transport body.
pub trait BodyEncoder: Send + Sync {
    /// Encode `value`.
    fn encode(&self, value: Value) -> Result<Body, EncodeError>;
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// -- Query --------------------------------------------------------------------

/// `application/x-www-form-urlencoded` query strings.
///
/// Keys are emitted in sorted order. Arrays repeat their key once per
/// element, `null` emits the bare key, nested objects are sent as JSON
/// text, and an empty object yields an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryStringEncoder;

impl QueryStringEncoder {
    fn push_pair(out: &mut Vec<String>, key: &str, value: &Value) {
        let key: String = byte_serialize(key.as_bytes()).collect();
        let rendered = match value {
            Value::Null => {
                out.push(key);
                return;
            }
            Value::Object(_) => value.to_string(),
            other => to_display_string(other),
        };
        let rendered: String = byte_serialize(rendered.as_bytes()).collect();
        out.push(format!("{key}={rendered}"));
    }
}

impl QueryEncoder for QueryStringEncoder {
    fn encode(&self, value: &Value) -> Result<String, EncodeError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(String::new()),
            other => {
                return Err(EncodeError::NotAnObject {
                    section: "query",
                    found: json_type(other),
                })
            }
        };

        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();

        let mut pairs = Vec::new();
        for key in keys {
            match &map[key.as_str()] {
                Value::Array(items) => {
                    for item in items {
                        Self::push_pair(&mut pairs, key, item);
                    }
                }
                single => Self::push_pair(&mut pairs, key, single),
            }
        }
        Ok(pairs.join("&"))
    }
}

// -- Path ---------------------------------------------------------------------

/// `{name}` placeholder substitution against the endpoint name.
///
/// `{{` and `}}` produce literal braces. A placeholder whose parameter is
/// absent or `null` is an error.
///
/// Values are inserted as their display string without escaping, so a value
/// containing `/`, `?` or `#` changes the shape of the URL. Callers that
/// need a single opaque segment should encode it first, or install their
/// own [`PathEncoder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatePathEncoder;

impl PathEncoder for TemplatePathEncoder {
    fn encode(&self, template: &str, value: &Value) -> Result<String, EncodeError> {
        let params = match value {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(EncodeError::NotAnObject {
                    section: "path",
                    found: json_type(other),
                })
            }
        };

        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => {
                                return Err(EncodeError::UnterminatedPlaceholder {
                                    template: template.to_string(),
                                })
                            }
                        }
                    }
                    let param = params
                        .and_then(|map| map.get(&name))
                        .filter(|v| !v.is_null())
                        .ok_or_else(|| EncodeError::MissingPathParameter {
                            template: template.to_string(),
                            name: name.clone(),
                        })?;
                    out.push_str(&to_display_string(param));
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }
}

// -- Body ---------------------------------------------------------------------

/// Passes the value through as a JSON body.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityBodyEncoder;

impl BodyEncoder for IdentityBodyEncoder {
    fn encode(&self, value: Value) -> Result<Body, EncodeError> {
        Ok(Body::Json(value))
    }
}

/// Serializes the value to JSON text up front and sends it verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStringEncoder {
    pretty: bool,
}

impl JsonStringEncoder {
    /// Compact output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl BodyEncoder for JsonStringEncoder {
    fn encode(&self, value: Value) -> Result<Body, EncodeError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(Body::Text(text))
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}
