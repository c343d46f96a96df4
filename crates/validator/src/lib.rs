//! # warden-validator
//!
//! Schema validation for untrusted runtime values.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use warden_validator::prelude::*;
//!
//! let user = object! {
//!     name: string().min(1),
//!     email: string().email(),
//!     age: number().int().min(18.0).optional(),
//!     roles: array(enumeration(["admin", "user"])),
//! };
//!
//! let input = Value::from(serde_json::json!({
//!     "name": "Ada",
//!     "email": "ada@example.com",
//!     "roles": ["admin"],
//! }));
//! let output = user.parse(&input)?;
//! ```
//!
//! ## Layout
//!
//! - [`value`]: the dynamic [`Value`](value::Value) model being validated
//! - [`foundation`]: the [`Validate`](foundation::Validate) trait, error
//!   codes and error values
//! - [`validators`]: schema builders for primitives and containers
//! - [`combinators`]: modifiers (`optional`, `refine`, `transform`, ...)
//!   and lazy schemas
//! - [`compiler`]: schemas turned into closure trees
//! - [`cache`]: result memoization
//! - [`security`]: ReDoS and prototype-pollution guards
//!
//! Validation failures are values: [`validate`](foundation::Validate::validate)
//! returns every error found, with a dot-joined path and a stable
//! `SCREAMING_SNAKE_CASE` code.

// Every error carries its path, message, received value and meta; boxing it
// would add an allocation to every failing check.
#![allow(clippy::result_large_err)]

pub mod cache;
pub mod combinators;
pub mod compiler;
pub mod foundation;
mod macros;
pub mod prelude;
pub mod schema;
pub mod security;
pub mod validators;
pub mod value;
