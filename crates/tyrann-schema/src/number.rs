//! Number schema: range and sign refinements, safe-integer check, and the
//! two casts.
//!
//! `cast` and `cast_string` start a new validation origin: they replace the
//! whole step list, so refinements added before them are dropped.
//! `number().positive().cast()` accepts `-5`; add refinements after the cast.

use std::sync::Arc;

use serde_json::Value;

use crate::coerce::{number_value, parse_number, to_number, MAX_SAFE_INTEGER};
use crate::error::failure;
use crate::kind::Num;
use crate::schema::{IntoSchema, Schema, Shape, Step};

/// Accepts any JSON number.
pub fn number() -> Schema<Num> {
    Schema::from_shape(Shape::Number)
}

/// A number that may be absent: `null`, absence and blank strings succeed
/// as `null`, numbers and numeric strings succeed as numbers, anything else
/// fails.
pub fn omittable_number() -> Schema<Num> {
    Schema::from_parts(
        Shape::Omittable(Arc::new(number().into_schema())),
        vec![Step::custom(|input, context| {
            let converted = match &input {
                Value::Null => Some(Value::Null),
                Value::Number(_) => Some(input.clone()),
                Value::String(s) if s.trim().is_empty() => Some(Value::Null),
                Value::String(s) => parse_number(s).and_then(number_value),
                _ => None,
            };
            match converted {
                Some(value) => Ok(value),
                None => failure(input, context),
            }
        })],
    )
}

impl Schema<Num> {
    /// Arbitrary predicate over the number.
    ///
    /// `null` passes untouched so that refinements compose with
    /// [`omittable_number`]; plain `number()` never lets `null` reach them.
    pub fn refine<F>(&self, predicate: F) -> Self
    where
        F: Fn(f64) -> bool + Send + Sync + 'static,
    {
        self.refine_value(move |value| match value {
            Value::Null => true,
            other => other.as_f64().is_some_and(|n| predicate(n)),
        })
    }

    /// At least `n`.
    pub fn min(&self, n: f64) -> Self {
        self.refine(move |v| v >= n)
    }

    /// At most `n`.
    pub fn max(&self, n: f64) -> Self {
        self.refine(move |v| v <= n)
    }

    /// Strictly greater than zero.
    pub fn positive(&self) -> Self {
        self.refine(|v| v > 0.0)
    }

    /// Strictly less than zero.
    pub fn negative(&self) -> Self {
        self.refine(|v| v < 0.0)
    }

    /// Integral and within ±(2^53 − 1).
    pub fn integer(&self) -> Self {
        self.refine(|v| v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER)
    }

    /// Replace every step with a numeric conversion of any input. Fails when
    /// the conversion is not-a-number or not finite.
    pub fn cast(&self) -> Self {
        self.replace_steps(vec![Step::custom(|input, context| {
            match to_number(&input).and_then(number_value) {
                Some(n) => Ok(n),
                None => failure(input, context),
            }
        })])
    }

    /// Replace every step with a numeric conversion that only accepts
    /// non-blank strings.
    pub fn cast_string(&self) -> Self {
        self.replace_steps(vec![Step::custom(|input, context| {
            let converted = input
                .as_str()
                .filter(|s| !s.trim().is_empty())
                .and_then(parse_number)
                .and_then(number_value);
            match converted {
                Some(n) => Ok(n),
                None => failure(input, context),
            }
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn range_and_sign() {
        assert!(number().min(5.0).validate(&json!(5)).is_ok());
        assert!(number().min(5.0).validate(&json!(4.9)).is_err());
        assert!(number().max(5.0).validate(&json!(6)).is_err());
        assert!(number().positive().validate(&json!(0)).is_err());
        assert!(number().negative().validate(&json!(-0.1)).is_ok());
    }

    #[test]
    fn integer_is_a_safe_integer_check() {
        let schema = number().integer();
        assert!(schema.validate(&json!(3)).is_ok());
        assert!(schema.validate(&json!(3.5)).is_err());
        assert!(schema.validate(&json!(9_007_199_254_740_991_i64)).is_ok());
        assert!(schema.validate(&json!(9_007_199_254_740_993_i64)).is_err());
    }

    #[test]
    fn rejects_numeric_strings_without_cast() {
        assert!(number().validate(&json!("5")).is_err());
    }

    #[test]
    fn cast_replaces_earlier_refinements() {
        let schema = number().positive().cast();
        assert_eq!(schema.step_count(), 1);
        assert_eq!(schema.validate(&json!(-5)).unwrap(), json!(-5));
    }

    #[test]
    fn cast_string_replaces_earlier_refinements() {
        let schema = number().positive().integer().cast_string();
        assert_eq!(schema.step_count(), 1);
        assert_eq!(schema.validate(&json!("-5")).unwrap(), json!(-5));
        assert_eq!(schema.validate(&json!("2.5")).unwrap(), json!(2.5));
    }

    #[test]
    fn refinements_after_cast_still_apply() {
        let schema = number().cast().positive();
        assert!(schema.validate(&json!("-5")).is_err());
        assert_eq!(schema.validate(&json!("5")).unwrap(), json!(5));
    }

    #[test]
    fn cast_converts_loosely() {
        let schema = number().cast();
        assert_eq!(schema.validate(&json!("42")).unwrap(), json!(42));
        assert_eq!(schema.validate(&json!(" 1.5 ")).unwrap(), json!(1.5));
        assert_eq!(schema.validate(&json!(true)).unwrap(), json!(1));
        assert_eq!(schema.validate(&json!(null)).unwrap(), json!(0));
        assert_eq!(schema.validate(&json!("")).unwrap(), json!(0));
        assert!(schema.validate(&json!("forty-two")).is_err());
        assert!(schema.validate(&json!({})).is_err());
        assert!(schema.validate(&json!("Infinity")).is_err());
    }

    #[test]
    fn cast_string_is_stricter_than_cast() {
        let schema = number().cast_string();
        assert_eq!(schema.validate(&json!("7")).unwrap(), json!(7));
        assert!(schema.validate(&json!("")).is_err());
        assert!(schema.validate(&json!("  ")).is_err());
        assert!(schema.validate(&json!(7)).is_err());
        assert!(schema.validate(&json!(true)).is_err());
        assert!(schema.validate(&json!("x")).is_err());
    }

    #[test]
    fn omittable_number_treats_blank_as_absent() {
        let schema = omittable_number();
        assert_eq!(schema.validate(&json!(null)).unwrap(), Value::Null);
        assert_eq!(schema.validate(&json!("   ")).unwrap(), Value::Null);
        assert_eq!(schema.validate(&json!("")).unwrap(), Value::Null);
        assert_eq!(schema.validate(&json!("12")).unwrap(), json!(12));
        assert_eq!(schema.validate(&json!(3.5)).unwrap(), json!(3.5));
        assert!(schema.validate(&json!("twelve")).is_err());
        assert!(schema.validate(&json!(false)).is_err());
    }

    #[test]
    fn omittable_number_composes_with_refinements() {
        let schema = omittable_number().min(10.0);
        assert_eq!(schema.validate(&json!("")).unwrap(), Value::Null);
        assert!(schema.validate(&json!("9")).is_err());
        assert!(schema.validate(&json!("10")).is_ok());
    }

    #[test]
    fn omittable_number_inside_object_keeps_absence() {
        let schema = crate::object().field("page", omittable_number());
        assert_eq!(schema.validate(&json!({})).unwrap(), json!({}));
        assert_eq!(
            schema.validate(&json!({ "page": " " })).unwrap(),
            json!({ "page": null })
        );
    }
}
