//! Built-in schemas
//!
//! Every schema is built by a factory function and configured with
//! chainable, consuming builder methods. Configuration never mutates a
//! schema another value still holds: children are shared `Schema` handles.
//!
//! # Categories
//!
//! - **Primitives**: [`string`], [`number`], [`bigint`], [`date`],
//!   [`boolean`], [`symbol`], [`null`], [`undefined`], [`any`],
//!   [`unknown`], [`never`], [`void`]
//! - **Literals**: [`literal`], [`enumeration`], [`native_enum`]
//! - **Containers**: [`object`], [`array`], [`tuple`], [`record`], [`map`],
//!   [`set`]
//! - **Composition**: [`union`], [`discriminated_union`], [`intersection`]
//!
//! ```rust,ignore
//! use warden_validator::prelude::*;
//!
//! let user = object! {
//!     name: string().min(1),
//!     age: number().int().nonnegative().optional(),
//!     roles: array(enumeration(["admin", "user"])),
//! };
//! ```

mod array;
mod bigint;
mod collection;
mod date;
mod intersection;
mod literal;
mod number;
mod object;
mod primitive;
mod string;
mod union;

pub use array::{ArraySchema, TupleSchema, array, tuple};
pub use bigint::{BigIntSchema, bigint};
pub use collection::{MapSchema, RecordSchema, SetSchema, map, record, set};
pub(crate) use collection::record_key;
pub use date::{DateSchema, date};
pub use intersection::{IntersectionSchema, intersection};
pub use literal::{
    EnumSchema, LiteralSchema, NativeEnumSchema, enumeration, literal, native_enum,
};
pub use number::{MAX_SAFE_INTEGER, NumberSchema, number};
pub use object::{ObjectSchema, UnknownKeys, object};
pub use primitive::{
    PrimitiveKind, PrimitiveSchema, any, boolean, never, null, symbol, undefined, unknown, void,
};
pub use string::{StringSchema, string};
pub use union::{DiscriminatedUnionSchema, UnionSchema, discriminated_union, union};
