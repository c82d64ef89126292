//! Zero-sized markers selecting which refinements a [`Schema`](crate::Schema)
//! offers. The runtime behavior lives in the schema's shape; the marker only
//! gates the builder API at compile time.

mod sealed {
    pub trait Sealed {}
}

/// Marker trait implemented by every schema kind.
pub trait Kind: sealed::Sealed + 'static {}

macro_rules! kinds {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug)]
            pub enum $name {}

            impl sealed::Sealed for $name {}
            impl Kind for $name {}
        )*
    };
}

kinds! {
    /// Any value: objects-as-values, literals, unions, transforms.
    Dynamic,
    /// Strings.
    Str,
    /// Numbers.
    Num,
    /// Booleans.
    Bool,
    /// Arrays of one item schema.
    Arr,
    /// Objects with declared fields.
    Obj,
}
