//! # Validation Failures
//!
//! Every validator returns a [`Validation`]: either the validated value or a
//! non-empty [`ValidationErrors`] list. Each [`ValidationError`] carries the
//! offending input, the path from the root down to it (as
//! [`ContextEntry`] pairs of key and expected type), and an optional
//! author-supplied message.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// One hop of the path from the root input to a failing value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    /// Object key or array index. Empty for the root.
    pub key: String,
    /// Label of the schema expected at this position.
    pub expected: String,
}

impl ContextEntry {
    /// Create a context entry.
    pub fn new(key: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expected: expected.into(),
        }
    }
}

/// A validation path, root first.
pub type Context = [ContextEntry];

/// Outcome of running a schema against an input.
pub type Validation<T> = Result<T, ValidationErrors>;

/// A single failed check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The input that was rejected.
    pub value: Value,
    /// Where in the input the rejection happened.
    pub context: Vec<ContextEntry>,
    /// Author-supplied message, if the failing step carried one.
    pub message: Option<String>,
}

impl ValidationError {
    /// Create an error without a message.
    pub fn new(value: Value, context: &Context) -> Self {
        Self {
            value,
            context: context.to_vec(),
            message: None,
        }
    }

    /// Render the context as `key: type` hops joined by `/`.
    pub fn path(&self) -> String {
        self.context
            .iter()
            .map(|entry| format!("{}: {}", entry.key, entry.expected))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => write!(f, "Invalid value {} supplied to {}", self.value, self.path()),
        }
    }
}

/// Non-empty list of validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Wrap a single error.
    pub fn single(error: ValidationError) -> Self {
        Self(vec![error])
    }

    /// Build from a list collected by a composite validator.
    ///
    /// Returns `None` for an empty list so that an empty failure can never
    /// be constructed.
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// Number of individual failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the individual failures.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// The underlying list.
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    /// Consume into the underlying list.
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }

    /// Replace the message of every failure in the list.
    pub(crate) fn with_message(mut self, message: &str) -> Self {
        for error in &mut self.0 {
            error.message = Some(message.to_string());
        }
        self
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&report(self).join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Shorthand for a failing outcome at `context`.
pub fn failure<T>(value: Value, context: &Context) -> Validation<T> {
    Err(ValidationErrors::single(ValidationError::new(value, context)))
}

/// One human readable line per failure.
pub fn report(errors: &ValidationErrors) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}

/// Failure to turn an input into a typed value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input was rejected by the schema.
    #[error("invalid value: {0}")]
    Invalid(#[from] ValidationErrors),

    /// The validated value does not deserialize into the requested type.
    #[error("validated value does not fit the target type: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Raised by [`unwrap`] when the outcome it was handed is a failure.
#[derive(Debug, Error)]
#[error("unwrap of a failed validation: {errors}")]
pub struct UnwrapError {
    /// The failures that made the unwrap impossible.
    pub errors: ValidationErrors,
}

/// Force a successful outcome, turning a failure into a generic error.
///
/// For callers that have already decided a failure is fatal.
pub fn unwrap<T>(outcome: Validation<T>) -> Result<T, UnwrapError> {
    outcome.map_err(|errors| UnwrapError { errors })
}
