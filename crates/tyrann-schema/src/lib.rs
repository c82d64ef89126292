//! # tyrann-schema -- Composable Validators
//!
//! A small validator engine over [`serde_json::Value`]. Schemas are built
//! from primitives and chained with refinements, casts, labels and
//! transforms; every builder call returns a new schema, so a schema can be
//! defined once and shared freely between concurrent callers.
//!
//! ## Building blocks
//!
//! - **Primitives:** [`string`], [`number`], [`omittable_number`],
//!   [`boolean`], [`array`], [`object`], [`literal`], [`any`].
//! - **Discriminated unions:** [`tagged_union`] dispatches on a literal tag
//!   field; the first declared member with a matching tag wins.
//! - **Transforms:** [`omittable`] widens acceptance to `null`/absence,
//!   [`defaultable`] backfills missing fields from a placeholder on encode.
//!
//! ## Outcomes
//!
//! [`Schema::validate`] returns a [`Validation`]: the validated value, or a
//! [`ValidationErrors`] list whose entries carry the rejected input, the
//! path from the root to it, and an optional message.
//!
//! ```
//! use serde_json::json;
//! use tyrann_schema::{number, object, string};
//!
//! let user = object()
//!     .field("name", string().required())
//!     .field("age", number().integer().min(0.0));
//!
//! assert!(user.validate(&json!({ "name": "Ada", "age": 36 })).is_ok());
//! assert!(user.validate(&json!({ "name": "", "age": 36 })).is_err());
//! ```

pub mod array;
pub mod boolean;
pub mod coerce;
pub mod error;
pub mod kind;
pub mod number;
pub mod object;
pub mod schema;
pub mod string;
pub mod transform;
pub mod union;

// Re-export primary types.
pub use array::array;
pub use boolean::boolean;
pub use error::{
    failure, report, unwrap, Context, ContextEntry, DecodeError, UnwrapError, Validation,
    ValidationError, ValidationErrors,
};
pub use number::{number, omittable_number};
pub use object::{any, literal, object};
pub use schema::{IntoSchema, Schema, StepFn};
pub use string::string;
pub use transform::{defaultable, omittable};
pub use union::{tagged_union, tagged_union_on, Member};
