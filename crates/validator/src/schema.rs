//! The type-erased schema node.
//!
//! Typed builders ([`StringSchema`], [`ObjectSchema`], ...) convert into a
//! [`Schema`]: an `Arc` around the closed [`SchemaKind`] enum. Child schemas
//! are held as `Schema`, so configuring a copy of a composite shares every
//! child with the original and nothing is ever mutated after construction.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::combinators::{LazySchema, ModifiedSchema};
use crate::foundation::{Validate, ValidationContext, ValidationResult};
use crate::validators::{
    ArraySchema, BigIntSchema, DateSchema, DiscriminatedUnionSchema, EnumSchema,
    IntersectionSchema, LiteralSchema, MapSchema, NativeEnumSchema, NumberSchema, ObjectSchema,
    PrimitiveSchema, RecordSchema, SetSchema, StringSchema, TupleSchema, UnionSchema,
};
use crate::value::Value;

/// Every kind of schema node.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    String(StringSchema),
    Number(NumberSchema),
    BigInt(BigIntSchema),
    Date(DateSchema),
    Literal(LiteralSchema),
    Enum(EnumSchema),
    NativeEnum(NativeEnumSchema),
    Primitive(PrimitiveSchema),
    Object(ObjectSchema),
    Array(ArraySchema),
    Tuple(TupleSchema),
    Record(RecordSchema),
    Map(MapSchema),
    Set(SetSchema),
    Union(UnionSchema),
    DiscriminatedUnion(DiscriminatedUnionSchema),
    Intersection(IntersectionSchema),
    Lazy(LazySchema),
    Modified(ModifiedSchema),
}

impl SchemaKind {
    /// Short name of the node kind, for logs and debugging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::Date(_) => "date",
            Self::Literal(_) => "literal",
            Self::Enum(_) => "enum",
            Self::NativeEnum(_) => "native_enum",
            Self::Primitive(p) => p.kind().name(),
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
            Self::Record(_) => "record",
            Self::Map(_) => "map",
            Self::Set(_) => "set",
            Self::Union(_) => "union",
            Self::DiscriminatedUnion(_) => "discriminated_union",
            Self::Intersection(_) => "intersection",
            Self::Lazy(_) => "lazy",
            Self::Modified(_) => "modified",
        }
    }
}

/// A shareable, immutable schema node.
#[derive(Clone)]
pub struct Schema(Arc<SchemaKind>);

impl Schema {
    #[must_use]
    pub fn new(kind: SchemaKind) -> Self {
        Self(Arc::new(kind))
    }

    #[must_use]
    pub fn kind(&self) -> &SchemaKind {
        &self.0
    }

    /// `true` if both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Lazy nodes may be self-referential; print only the kind for them.
        match self.kind() {
            SchemaKind::Lazy(_) => f.write_str("Schema(lazy)"),
            kind => f.debug_tuple("Schema").field(kind).finish(),
        }
    }
}

macro_rules! dispatch {
    ($schema:expr, $node:ident => $body:expr) => {
        match $schema.kind() {
            SchemaKind::String($node) => $body,
            SchemaKind::Number($node) => $body,
            SchemaKind::BigInt($node) => $body,
            SchemaKind::Date($node) => $body,
            SchemaKind::Literal($node) => $body,
            SchemaKind::Enum($node) => $body,
            SchemaKind::NativeEnum($node) => $body,
            SchemaKind::Primitive($node) => $body,
            SchemaKind::Object($node) => $body,
            SchemaKind::Array($node) => $body,
            SchemaKind::Tuple($node) => $body,
            SchemaKind::Record($node) => $body,
            SchemaKind::Map($node) => $body,
            SchemaKind::Set($node) => $body,
            SchemaKind::Union($node) => $body,
            SchemaKind::DiscriminatedUnion($node) => $body,
            SchemaKind::Intersection($node) => $body,
            SchemaKind::Lazy($node) => $body,
            SchemaKind::Modified($node) => $body,
        }
    };
}

impl Validate for Schema {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        dispatch!(self, node => node.validate_in(value, ctx))
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        dispatch!(self, node => node.is_in(value, depth))
    }

    fn validate_async_in<'a>(
        &'a self,
        value: &'a Value,
        ctx: ValidationContext,
    ) -> BoxFuture<'a, ValidationResult> {
        dispatch!(self, node => node.validate_async_in(value, ctx))
    }
}

macro_rules! into_schema {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for SchemaKind {
                fn from(node: $ty) -> Self {
                    Self::$variant(node)
                }
            }

            impl From<$ty> for Schema {
                fn from(node: $ty) -> Self {
                    Self::new(SchemaKind::$variant(node))
                }
            }
        )+
    };
}

into_schema! {
    String(StringSchema),
    Number(NumberSchema),
    BigInt(BigIntSchema),
    Date(DateSchema),
    Literal(LiteralSchema),
    Enum(EnumSchema),
    NativeEnum(NativeEnumSchema),
    Primitive(PrimitiveSchema),
    Object(ObjectSchema),
    Array(ArraySchema),
    Tuple(TupleSchema),
    Record(RecordSchema),
    Map(MapSchema),
    Set(SetSchema),
    Union(UnionSchema),
    DiscriminatedUnion(DiscriminatedUnionSchema),
    Intersection(IntersectionSchema),
    Lazy(LazySchema),
    Modified(ModifiedSchema),
}

impl From<&Schema> for Schema {
    fn from(schema: &Schema) -> Self {
        schema.clone()
    }
}
