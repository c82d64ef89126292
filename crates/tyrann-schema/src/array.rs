//! Array schema. Every element is validated by the item schema and all
//! element failures are reported, each under its index.

use std::sync::Arc;

use serde_json::Value;

use crate::kind::Arr;
use crate::schema::{IntoSchema, Schema, Shape};

/// Accepts arrays whose every element conforms to `item`.
pub fn array(item: impl IntoSchema) -> Schema<Arr> {
    Schema::from_shape(Shape::Array(Arc::new(item.into_schema())))
}

impl Schema<Arr> {
    /// Arbitrary predicate over the validated elements.
    pub fn refine<F>(&self, predicate: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        self.refine_value(move |value| value.as_array().is_some_and(|items| predicate(items)))
    }

    /// At least `n` elements.
    pub fn min(&self, n: usize) -> Self {
        self.refine(move |items| items.len() >= n)
    }

    /// At most `n` elements.
    pub fn max(&self, n: usize) -> Self {
        self.refine(move |items| items.len() <= n)
    }

    /// Non-empty; same as `min(1)`.
    pub fn required(&self) -> Self {
        self.min(1)
    }
}
