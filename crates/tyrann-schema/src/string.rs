//! String schema and its length/pattern refinements. Lengths are counted in
//! characters, not bytes.

use regex::Regex;

use crate::kind::Str;
use crate::schema::{Schema, Shape};

/// Accepts any string.
pub fn string() -> Schema<Str> {
    Schema::from_shape(Shape::String)
}

impl Schema<Str> {
    /// Arbitrary predicate over the string.
    pub fn refine<F>(&self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.refine_value(move |value| value.as_str().is_some_and(|s| predicate(s)))
    }

    /// Exactly `n` characters.
    pub fn length(&self, n: usize) -> Self {
        self.refine(move |s| s.chars().count() == n)
    }

    /// At least `n` characters.
    pub fn min(&self, n: usize) -> Self {
        self.refine(move |s| s.chars().count() >= n)
    }

    /// At most `n` characters.
    pub fn max(&self, n: usize) -> Self {
        self.refine(move |s| s.chars().count() <= n)
    }

    /// Non-empty; same as `min(1)`.
    pub fn required(&self) -> Self {
        self.min(1)
    }

    /// Contains a match of `pattern`.
    pub fn matches(&self, pattern: &Regex) -> Self {
        let pattern = pattern.clone();
        self.refine(move |s| pattern.is_match(s))
    }
}
