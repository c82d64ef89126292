//! # Omittable and Defaultable Transforms
//!
//! [`omittable`] widens a schema to also accept `null` or absence.
//! [`defaultable`] keeps the inner schema's validation and backfills
//! missing fields from a trusted placeholder when the value is encoded.

use std::sync::Arc;

use serde_json::Value;

use crate::schema::{IntoSchema, Schema, Shape};

/// Accept the inner schema's values, `null`, or absence. No default is
/// substituted.
pub fn omittable(inner: impl IntoSchema) -> Schema {
    Schema::from_shape(Shape::Omittable(Arc::new(inner.into_schema())))
}

/// Validate with `inner`, then on encode merge the value over
/// `placeholder`: fields that are absent or `null` in the value take the
/// placeholder's.
///
/// The placeholder is trusted author input and is never validated.
pub fn defaultable(inner: impl IntoSchema, placeholder: Value) -> Schema {
    Schema::from_shape(Shape::Defaultable {
        inner: Arc::new(inner.into_schema()),
        placeholder: Arc::new(placeholder),
    })
}

/// `{...placeholder, ...value}` skipping `null` fields of `value`.
pub(crate) fn merge_placeholder(placeholder: &Value, value: Value) -> Value {
    match (placeholder, value) {
        (Value::Object(defaults), Value::Object(fields)) => {
            let mut merged = defaults.clone();
            for (key, field) in fields {
                if !field.is_null() {
                    merged.insert(key, field);
                }
            }
            Value::Object(merged)
        }
        (_, Value::Null) => placeholder.clone(),
        (_, value) => value,
    }
}
