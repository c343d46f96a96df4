//! Macros for declaring schemas with minimal boilerplate.
//!
//! # Available Macros
//!
//! - [`object!`]: an [`ObjectSchema`](crate::validators::ObjectSchema) from
//!   `key: schema` pairs

// ============================================================================
// OBJECT MACRO
// ============================================================================

/// Builds an [`ObjectSchema`](crate::validators::ObjectSchema) from field
/// declarations, in order.
///
/// Keys are identifiers or string literals (for keys that are not valid
/// identifiers); values are anything that converts into a
/// [`Schema`](crate::schema::Schema).
///
/// ```rust,ignore
/// use warden_validator::prelude::*;
///
/// let user = object! {
///     name: string().min(1),
///     age: number().int().optional(),
///     "content-type": literal("json"),
/// };
///
/// // modifiers and shape operations chain as usual
/// let strict_user = object! { id: string().uuid() }.strict();
/// ```
#[macro_export]
macro_rules! object {
    () => {
        $crate::validators::object(::std::iter::empty::<(&str, $crate::schema::Schema)>())
    };
    ($($key:tt : $schema:expr),+ $(,)?) => {
        $crate::validators::object([
            $((
                $crate::__object_key!($key),
                $crate::schema::Schema::from($schema),
            )),+
        ])
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __object_key {
    ($key:ident) => {
        stringify!($key)
    };
    ($key:literal) => {
        $key
    };
}
