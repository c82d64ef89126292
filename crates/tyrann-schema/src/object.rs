//! Object, literal and unconstrained schemas.
//!
//! Objects are open: a value conforms when every declared field conforms,
//! and undeclared fields are carried through untouched.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::kind::{Dynamic, Obj};
use crate::schema::{IntoSchema, Schema, Shape};

/// An object schema with no declared fields yet.
pub fn object() -> Schema<Obj> {
    Schema::from_shape(Shape::Object(Arc::new(Vec::new())))
}

/// Accepts exactly `value`.
pub fn literal(value: impl Into<Value>) -> Schema {
    Schema::from_shape(Shape::Literal(value.into()))
}

/// Accepts anything. A starting point for `refine`-only schemas.
pub fn any() -> Schema {
    Schema::from_shape(Shape::Any)
}

impl Schema<Obj> {
    fn declared(&self) -> &[(String, Schema)] {
        match &self.shape {
            Shape::Object(fields) => fields.as_slice(),
            _ => &[],
        }
    }

    /// Clone with `name` declared as `schema`. Redeclaring a field replaces
    /// it in place.
    pub fn field(&self, name: impl Into<String>, schema: impl IntoSchema) -> Self {
        let name = name.into();
        let schema = schema.into_schema();
        let mut fields = self.declared().to_vec();
        match fields.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = schema,
            None => fields.push((name, schema)),
        }
        self.replace_shape(Shape::Object(Arc::new(fields)))
    }

    pub(crate) fn prepend_field(&self, name: &str, schema: impl IntoSchema) -> Self {
        let mut fields = vec![(name.to_string(), schema.into_schema())];
        fields.extend(
            self.declared()
                .iter()
                .filter(|(key, _)| key != name)
                .cloned(),
        );
        self.replace_shape(Shape::Object(Arc::new(fields)))
    }

    /// Declared field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.declared().iter().map(|(key, _)| key.as_str())
    }

    /// Schema declared for `name`.
    pub fn field_schema(&self, name: &str) -> Option<&Schema> {
        self.declared()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, schema)| schema)
    }

    /// Cross-field invariant over the whole object.
    pub fn refine<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> bool + Send + Sync + 'static,
    {
        self.refine_value(move |value| value.as_object().is_some_and(|map| predicate(map)))
    }
}

impl Schema<Dynamic> {
    /// Arbitrary predicate over the value.
    pub fn refine<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refine_value(predicate)
    }
}
