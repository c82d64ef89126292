//! # Validator Core
//!
//! A [`Schema`] is a persistent value: a shape (the kind tag with its
//! kind-specific data), an ordered list of validation steps, a label and a
//! description. Builders never mutate the receiver; they return a new schema
//! whose step list is a copy of the old one plus (or instead of) the new
//! step. Nested schemas are shared through `Arc`, so cloning is shallow.
//!
//! ## Step semantics
//!
//! Steps run strictly in order. The first step receives the raw input, each
//! later step receives the previous step's output, and the first failure
//! short-circuits. A fresh schema has a single *base* step which performs
//! the structural check of its shape; refinements appended after it may
//! therefore assume the shape's type guarantees.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{
    failure, Context, ContextEntry, DecodeError, Validation, ValidationError, ValidationErrors,
};
use crate::kind::{Dynamic, Kind};
use crate::transform::merge_placeholder;
use crate::union::TaggedUnion;

/// Signature of a custom validation step.
///
/// Receives the output of the previous step and the context of the schema
/// being validated.
pub type StepFn = dyn Fn(Value, &Context) -> Validation<Value> + Send + Sync;

#[derive(Clone)]
enum StepAction {
    /// Structural check derived from the schema's shape.
    Base,
    Custom(Arc<StepFn>),
}

#[derive(Clone)]
pub(crate) struct Step {
    action: StepAction,
    message: Option<Arc<str>>,
}

impl Step {
    pub(crate) fn base() -> Self {
        Self {
            action: StepAction::Base,
            message: None,
        }
    }

    pub(crate) fn custom<F>(f: F) -> Self
    where
        F: Fn(Value, &Context) -> Validation<Value> + Send + Sync + 'static,
    {
        Self {
            action: StepAction::Custom(Arc::new(f)),
            message: None,
        }
    }

    fn run(&self, shape: &Shape, input: Value, context: &Context) -> Validation<Value> {
        let outcome = match &self.action {
            StepAction::Base => shape.validate(input, context),
            StepAction::Custom(f) => f(input, context),
        };
        match (&self.message, outcome) {
            (Some(message), Err(errors)) => Err(errors.with_message(message)),
            (_, outcome) => outcome,
        }
    }
}

/// Kind tag of a schema together with its kind-specific data.
#[derive(Clone)]
pub(crate) enum Shape {
    Any,
    String,
    Number,
    Boolean,
    Literal(Value),
    Array(Arc<Schema>),
    Object(Arc<Vec<(String, Schema)>>),
    Union(Arc<TaggedUnion>),
    Omittable(Arc<Schema>),
    Defaultable {
        inner: Arc<Schema>,
        placeholder: Arc<Value>,
    },
}

impl Shape {
    fn name(&self) -> String {
        match self {
            Self::Any => "unknown".into(),
            Self::String => "string".into(),
            Self::Number => "number".into(),
            Self::Boolean => "boolean".into(),
            Self::Literal(value) => value.to_string(),
            Self::Array(item) => format!("Array<{}>", item.label()),
            Self::Object(fields) if fields.is_empty() => "{}".into(),
            Self::Object(fields) => {
                let body = fields
                    .iter()
                    .map(|(key, schema)| format!("{key}: {}", schema.label()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{ {body} }}")
            }
            Self::Union(union) => union.name(),
            Self::Omittable(inner) => format!("({} | null | undefined)", inner.label()),
            Self::Defaultable { inner, .. } => format!("Defaultable<{}>", inner.label()),
        }
    }

    fn validate(&self, input: Value, context: &Context) -> Validation<Value> {
        match self {
            Self::Any => Ok(input),
            Self::String if input.is_string() => Ok(input),
            Self::Number if input.is_number() => Ok(input),
            Self::Boolean if input.is_boolean() => Ok(input),
            Self::Literal(expected) if *expected == input => Ok(input),
            Self::String | Self::Number | Self::Boolean | Self::Literal(_) => {
                failure(input, context)
            }
            Self::Array(item) => validate_array(item, input, context),
            Self::Object(fields) => validate_object(fields, input, context),
            Self::Union(union) => union.validate(input, context),
            Self::Omittable(_) if input.is_null() => Ok(Value::Null),
            Self::Omittable(inner) | Self::Defaultable { inner, .. } => {
                inner.validate_in(input, context)
            }
        }
    }

    fn is(&self, input: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::String => input.is_string(),
            Self::Number => input.is_number(),
            Self::Boolean => input.is_boolean(),
            Self::Literal(expected) => expected == input,
            Self::Array(item) => input
                .as_array()
                .is_some_and(|items| items.iter().all(|v| item.is(v))),
            Self::Object(fields) => input.as_object().is_some_and(|map| {
                fields
                    .iter()
                    .all(|(key, schema)| schema.is(map.get(key).unwrap_or(&Value::Null)))
            }),
            Self::Union(union) => union.is(input),
            Self::Omittable(inner) => input.is_null() || inner.is(input),
            Self::Defaultable { inner, .. } => inner.is(input),
        }
    }

    fn encode(&self, value: Value) -> Value {
        match self {
            Self::Array(item) => match value {
                Value::Array(items) => {
                    Value::Array(items.into_iter().map(|v| item.encode(v)).collect())
                }
                other => other,
            },
            Self::Object(fields) => match value {
                Value::Object(mut map) => {
                    for (key, schema) in fields.iter() {
                        if let Some(field) = map.remove(key) {
                            map.insert(key.clone(), schema.encode(field));
                        }
                    }
                    Value::Object(map)
                }
                other => other,
            },
            Self::Omittable(_) if value.is_null() => Value::Null,
            Self::Omittable(inner) => inner.encode(value),
            Self::Defaultable { inner, placeholder } => {
                merge_placeholder(placeholder, inner.encode(value))
            }
            Self::Any
            | Self::String
            | Self::Number
            | Self::Boolean
            | Self::Literal(_)
            | Self::Union(_) => value,
        }
    }
}

fn validate_array(item: &Schema, input: Value, context: &Context) -> Validation<Value> {
    let items = match input {
        Value::Array(items) => items,
        other => return failure(other, context),
    };

    let mut out = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (index, value) in items.into_iter().enumerate() {
        let child = child_context(context, index.to_string(), &item.label());
        match item.validate_in(value, &child) {
            Ok(v) => out.push(v),
            Err(e) => errors.extend(e),
        }
    }

    match ValidationErrors::from_vec(errors) {
        Some(errors) => Err(errors),
        None => Ok(Value::Array(out)),
    }
}

fn validate_object(
    fields: &[(String, Schema)],
    input: Value,
    context: &Context,
) -> Validation<Value> {
    let mut map = match input {
        Value::Object(map) => map,
        other => return failure(other, context),
    };

    let mut errors: Vec<ValidationError> = Vec::new();
    for (key, schema) in fields {
        // Absent fields are validated as null and stay absent if they pass.
        let present = map.contains_key(key);
        let value = map.remove(key).unwrap_or(Value::Null);
        let child = child_context(context, key.clone(), &schema.label());
        match schema.validate_in(value, &child) {
            Ok(v) if present || !v.is_null() => {
                map.insert(key.clone(), v);
            }
            Ok(_) => {}
            Err(e) => errors.extend(e),
        }
    }

    match ValidationErrors::from_vec(errors) {
        Some(errors) => Err(errors),
        None => Ok(Value::Object(map)),
    }
}

/// Append one hop to a validation path.
pub(crate) fn child_context(
    context: &Context,
    key: impl Into<String>,
    expected: &str,
) -> Vec<ContextEntry> {
    let mut child = context.to_vec();
    child.push(ContextEntry::new(key, expected));
    child
}

/// A composable validator over JSON values.
///
/// `K` is a compile-time marker selecting the kind-specific refinements
/// (see [`crate::kind`]); [`Schema`] without a parameter is the erased form
/// used wherever schemas of different kinds are stored together.
pub struct Schema<K: Kind = Dynamic> {
    pub(crate) shape: Shape,
    steps: Vec<Step>,
    label: Option<String>,
    description: String,
    kind: PhantomData<fn() -> K>,
}

impl<K: Kind> Clone for Schema<K> {
    fn clone(&self) -> Self {
        Self {
            shape: self.shape.clone(),
            steps: self.steps.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            kind: PhantomData,
        }
    }
}

impl<K: Kind> fmt::Debug for Schema<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("label", &self.label())
            .field("description", &self.description)
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl<K: Kind> Schema<K> {
    pub(crate) fn from_shape(shape: Shape) -> Self {
        Self::from_parts(shape, vec![Step::base()])
    }

    pub(crate) fn from_parts(shape: Shape, steps: Vec<Step>) -> Self {
        Self {
            shape,
            steps,
            label: None,
            description: String::new(),
            kind: PhantomData,
        }
    }

    /// Clone with the step list overwritten. Used by casts, which start a
    /// new validation origin and drop every earlier step.
    pub(crate) fn replace_steps(&self, steps: Vec<Step>) -> Self {
        let mut schema = self.clone();
        schema.steps = steps;
        schema
    }

    pub(crate) fn replace_shape(&self, shape: Shape) -> Self {
        let mut schema = self.clone();
        schema.shape = shape;
        schema
    }

    fn retag<J: Kind>(&self) -> Schema<J> {
        Schema {
            shape: self.shape.clone(),
            steps: self.steps.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            kind: PhantomData,
        }
    }

    /// Structural type name, e.g. `number` or `{ id: number }`.
    pub fn name(&self) -> String {
        self.shape.name()
    }

    /// Label used in error paths. Defaults to [`Schema::name`].
    pub fn label(&self) -> Cow<'_, str> {
        match &self.label {
            Some(label) => Cow::Borrowed(label),
            None => Cow::Owned(self.name()),
        }
    }

    /// Free-form description; empty unless set.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Clone with a new label. Validation behavior is unchanged.
    pub fn with_label(&self, label: impl Into<String>) -> Self {
        let mut schema = self.clone();
        schema.label = Some(label.into());
        schema
    }

    /// Clone with a new description. Validation behavior is unchanged.
    pub fn with_description(&self, description: impl Into<String>) -> Self {
        let mut schema = self.clone();
        schema.description = description.into();
        schema
    }

    /// Number of validation steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Clone with one more validation step appended.
    pub fn extend<F>(&self, step: F) -> Self
    where
        F: Fn(Value, &Context) -> Validation<Value> + Send + Sync + 'static,
    {
        let mut steps = self.steps.clone();
        steps.push(Step::custom(step));
        self.replace_steps(steps)
    }

    /// Clone whose last step reports `message` on failure.
    ///
    /// `string().min(5).with_message("Too short.")` attaches the message to
    /// the `min` refinement only.
    pub fn with_message(&self, message: impl Into<String>) -> Self {
        let mut steps = self.steps.clone();
        if let Some(last) = steps.last_mut() {
            last.message = Some(Arc::from(message.into()));
        }
        self.replace_steps(steps)
    }

    pub(crate) fn refine_value<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.extend(move |input, context| {
            if predicate(&input) {
                Ok(input)
            } else {
                failure(input, context)
            }
        })
    }

    /// Validate `input` from the root.
    pub fn validate(&self, input: &Value) -> Validation<Value> {
        let root = [ContextEntry::new("", self.label())];
        self.validate_in(input.clone(), &root)
    }

    /// Validate `input` at a position inside a larger structure.
    pub fn validate_in(&self, input: Value, context: &Context) -> Validation<Value> {
        let mut current = input;
        for step in &self.steps {
            current = step.run(&self.shape, current, context)?;
        }
        Ok(current)
    }

    /// Cheap structural membership test. Refinements are not run.
    pub fn is(&self, input: &Value) -> bool {
        self.shape.is(input)
    }

    /// Turn a validated value back into its wire representation.
    pub fn encode(&self, value: Value) -> Value {
        self.shape.encode(value)
    }

    /// Validate, then deserialize the validated value into `T`.
    pub fn decode<T: DeserializeOwned>(&self, input: &Value) -> Result<T, DecodeError> {
        let value = self.validate(input)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Conversion into the erased [`Schema`] form.
pub trait IntoSchema {
    /// Drop the compile-time kind marker.
    fn into_schema(self) -> Schema;
}

impl<K: Kind> IntoSchema for Schema<K> {
    fn into_schema(self) -> Schema {
        self.retag()
    }
}

impl<K: Kind> IntoSchema for &Schema<K> {
    fn into_schema(self) -> Schema {
        self.retag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{any, number, object, string};
    use serde_json::json;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn schemas_are_shareable_across_tasks() {
        assert_send_sync::<Schema>();
        assert_send_sync::<Schema<crate::kind::Str>>();
    }

    #[test]
    fn extend_does_not_mutate_receiver() {
        let base = string();
        let longer = base.min(3);
        assert_eq!(base.step_count(), 1);
        assert_eq!(longer.step_count(), 2);
        assert!(base.validate(&json!("a")).is_ok());
        assert!(longer.validate(&json!("a")).is_err());
    }

    #[test]
    fn steps_receive_previous_output() {
        let doubled = any()
            .extend(|v, _| Ok(json!(v.as_f64().unwrap_or(0.0) * 2.0)))
            .extend(|v, _| Ok(json!(v.as_f64().unwrap_or(0.0) + 1.0)));
        assert_eq!(doubled.validate(&json!(4)).unwrap(), json!(9.0));
    }

    #[test]
    fn first_failure_short_circuits() {
        let reached = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = reached.clone();
        let schema = number().extend(move |v, _| {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(v)
        });
        assert!(schema.validate(&json!("nope")).is_err());
        assert!(!reached.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn labels_default_to_name_and_are_cloned() {
        let plain = number();
        let labelled = plain.with_label("age").with_description("years");
        assert_eq!(plain.label(), "number");
        assert_eq!(plain.description(), "");
        assert_eq!(labelled.label(), "age");
        assert_eq!(labelled.description(), "years");
        assert_eq!(labelled.validate(&json!(3)), plain.validate(&json!(3)));
    }

    #[test]
    fn label_appears_in_error_context() {
        let schema = object().field("age", number().with_label("Age"));
        let errors = schema.validate(&json!({ "age": "x" })).unwrap_err();
        let err = &errors.as_slice()[0];
        assert_eq!(err.context.last().unwrap().expected, "Age");
        assert_eq!(err.context.last().unwrap().key, "age");
    }

    #[test]
    fn with_message_applies_to_last_step_only() {
        let schema = string().with_message("not a string").min(5).with_message("too short");
        let short = schema.validate(&json!("abc")).unwrap_err();
        assert_eq!(short.as_slice()[0].message.as_deref(), Some("too short"));
        let wrong = schema.validate(&json!(1)).unwrap_err();
        assert_eq!(wrong.as_slice()[0].message.as_deref(), Some("not a string"));
    }

    #[test]
    fn decode_produces_typed_value() {
        #[derive(serde::Deserialize)]
        struct Point {
            x: f64,
        }
        let schema = object().field("x", number());
        let point: Point = schema.decode(&json!({ "x": 1.5 })).unwrap();
        assert_eq!(point.x, 1.5);
        assert!(matches!(
            schema.decode::<Point>(&json!({ "x": "1" })),
            Err(DecodeError::Invalid(_))
        ));
    }

    #[test]
    fn object_name_lists_fields() {
        let schema = object().field("id", number()).field("name", string());
        assert_eq!(schema.name(), "{ id: number, name: string }");
    }
}
