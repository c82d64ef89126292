//! # Discriminated Union
//!
//! Dispatches validation to one of several tagged object schemas based on
//! the value of a tag field. Members are searched in declaration order and
//! the first member whose tag literal equals the input's tag wins, so of two
//! members sharing a tag the later one is unreachable.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{failure, Context, Validation};
use crate::kind::Obj;
use crate::object::literal;
use crate::schema::{Schema, Shape};

/// Default name of the discriminating field.
pub const DEFAULT_TAG_FIELD: &str = "tag";

/// One alternative of a tagged union.
#[derive(Debug, Clone)]
pub struct Member {
    tag: String,
    schema: Schema<Obj>,
}

impl Member {
    /// Alternative selected when the tag field equals `tag`.
    ///
    /// `schema` declares the remaining fields; the tag field itself is added
    /// by the union.
    pub fn new(tag: impl Into<String>, schema: Schema<Obj>) -> Self {
        Self {
            tag: tag.into(),
            schema,
        }
    }

    /// The tag literal selecting this member.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

pub(crate) struct TaggedUnion {
    tag_field: String,
    members: Vec<Member>,
}

impl TaggedUnion {
    pub(crate) fn name(&self) -> String {
        self.members
            .iter()
            .map(|m| m.schema.label().into_owned())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn select(&self, input: &Value) -> Option<&Schema<Obj>> {
        let tag = input.as_object()?.get(&self.tag_field)?;
        self.members
            .iter()
            .find(|m| tag.as_str() == Some(m.tag.as_str()))
            .map(|m| &m.schema)
    }

    pub(crate) fn validate(&self, input: Value, context: &Context) -> Validation<Value> {
        match self.select(&input) {
            Some(member) => member.validate_in(input, context),
            None => failure(input, context),
        }
    }

    pub(crate) fn is(&self, input: &Value) -> bool {
        self.select(input).is_some_and(|member| member.is(input))
    }
}

/// Union discriminated on the `tag` field.
pub fn tagged_union(members: impl IntoIterator<Item = Member>) -> Schema {
    tagged_union_on(DEFAULT_TAG_FIELD, members)
}

/// Union discriminated on `tag_field`.
pub fn tagged_union_on(
    tag_field: impl Into<String>,
    members: impl IntoIterator<Item = Member>,
) -> Schema {
    let tag_field = tag_field.into();
    let members = members
        .into_iter()
        .map(|member| Member {
            schema: member
                .schema
                .prepend_field(&tag_field, literal(Value::String(member.tag.clone()))),
            tag: member.tag,
        })
        .collect();

    Schema::from_shape(Shape::Union(Arc::new(TaggedUnion { tag_field, members })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{number, object};
    use serde_json::json;

    fn a() -> Member {
        Member::new("a", object().field("a", number()))
    }

    fn b() -> Member {
        Member::new("b", object().field("b", number()))
    }

    #[test]
    fn single_member_union() {
        let schema = tagged_union([a()]);
        assert!(schema.validate(&json!({ "tag": "a", "a": 1 })).is_ok());
        assert!(schema.validate(&json!({ "tag": "a", "a": "1" })).is_err());
    }

    #[test]
    fn dispatches_on_tag() {
        let schema = tagged_union([a(), b()]);
        assert!(schema.validate(&json!({ "tag": "a", "a": 1 })).is_ok());
        assert!(schema.validate(&json!({ "tag": "a", "a": "1" })).is_err());
        assert!(schema.validate(&json!({ "tag": "b", "b": 1 })).is_ok());
        // Member fields are checked, not just the tag.
        assert!(schema.validate(&json!({ "tag": "b", "a": 1 })).is_err());
    }

    #[test]
    fn unknown_tag_fails_at_union_path() {
        let schema = tagged_union([a(), b()]);
        let errors = schema.validate(&json!({ "tag": "z" })).unwrap_err();
        assert_eq!(errors.len(), 1);
        let err = &errors.as_slice()[0];
        assert_eq!(err.context.len(), 1);
        assert_eq!(err.context[0].key, "");
    }

    #[test]
    fn non_object_input_fails() {
        let schema = tagged_union([a()]);
        assert!(schema.validate(&json!(null)).is_err());
        assert!(schema.validate(&json!("a")).is_err());
        assert!(schema.validate(&json!([{ "tag": "a", "a": 1 }])).is_err());
    }

    #[test]
    fn duplicate_tag_resolves_to_first_member() {
        let schema = tagged_union([
            a(),
            b(),
            Member::new("b", object().field("c", number())),
        ]);
        // Satisfies the first "b" member.
        assert!(schema.validate(&json!({ "tag": "b", "b": 1 })).is_ok());
        // Would satisfy the second "b" member, but the first one is chosen.
        assert!(schema.validate(&json!({ "tag": "b", "c": 1 })).is_err());
        // Satisfies both; still validated by the first.
        assert!(schema
            .validate(&json!({ "tag": "b", "b": 1, "c": 1 }))
            .is_ok());
    }

    #[test]
    fn member_errors_carry_field_context() {
        let schema = tagged_union([
            Member::new(
                "LWH",
                object()
                    .field("length", number().min(5.0).with_message("too small"))
                    .field("width", number().min(5.0).with_message("too small"))
                    .field("height", number().min(5.0).with_message("too small")),
            ),
            Member::new(
                "WV",
                object()
                    .field("weight", number().min(5.0).with_message("too small"))
                    .field("volume", number().min(5.0).with_message("too small")),
            ),
        ]);

        let errors = schema
            .validate(&json!({ "tag": "WV", "weight": 0, "volume": 0 }))
            .unwrap_err();
        let keys: Vec<_> = errors
            .iter()
            .map(|e| e.context.last().unwrap().key.clone())
            .collect();
        assert_eq!(keys, vec!["weight", "volume"]);
        assert!(errors.iter().all(|e| e.message.as_deref() == Some("too small")));
    }

    #[test]
    fn is_uses_selected_member() {
        let schema = tagged_union([a(), b()]);
        assert!(schema.is(&json!({ "tag": "a", "a": 1 })));
        assert!(!schema.is(&json!({ "tag": "a", "b": 1 })));
        assert!(!schema.is(&json!({ "tag": "q" })));
    }

    #[test]
    fn custom_tag_field() {
        let schema = tagged_union_on("kind", [a()]);
        assert!(schema.validate(&json!({ "kind": "a", "a": 1 })).is_ok());
        assert!(schema.validate(&json!({ "tag": "a", "a": 1 })).is_err());
    }

    #[test]
    fn encode_is_identity() {
        let schema = tagged_union([a(), b()]);
        let value = json!({ "tag": "b", "b": 2 });
        assert_eq!(schema.encode(value.clone()), value);
    }
}
