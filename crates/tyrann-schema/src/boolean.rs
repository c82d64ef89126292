//! Boolean schema, truthiness cast and the `"true"`/`"false"` reader.

use serde_json::Value;

use crate::coerce::is_truthy;
use crate::error::failure;
use crate::kind::Bool;
use crate::schema::{Schema, Shape, Step};

/// Accepts `true` and `false`.
pub fn boolean() -> Schema<Bool> {
    Schema::from_shape(Shape::Boolean)
}

impl Schema<Bool> {
    /// Arbitrary predicate over the boolean.
    pub fn refine<F>(&self, predicate: F) -> Self
    where
        F: Fn(bool) -> bool + Send + Sync + 'static,
    {
        self.refine_value(move |value| value.as_bool().is_some_and(|b| predicate(b)))
    }

    /// Only `true`.
    pub fn only_true(&self) -> Self {
        self.refine(|b| b)
    }

    /// Only `false`.
    pub fn only_false(&self) -> Self {
        self.refine(|b| !b)
    }

    /// Replace every step with a truthiness conversion. Never fails.
    pub fn cast(&self) -> Self {
        self.replace_steps(vec![Step::custom(|input, _| {
            Ok(Value::Bool(is_truthy(&input)))
        })])
    }

    /// Replace every step with a reader accepting only the strings
    /// `"true"` and `"false"`.
    pub fn booleanish(&self) -> Self {
        self.replace_steps(vec![Step::custom(|input, context| match input.as_str() {
            Some("true") => Ok(Value::Bool(true)),
            Some("false") => Ok(Value::Bool(false)),
            _ => failure(input, context),
        })])
    }
}
