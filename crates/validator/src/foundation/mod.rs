//! Core validation types and traits
//!
//! - **Trait**: [`Validate`]
//! - **Errors**: [`ErrorCode`], [`ValidationError`], [`ValidationErrors`],
//!   [`SchemaError`]
//! - **State**: [`ValidationContext`]
//!
//! Validation failures are plain data: a failed call returns every error
//! found, each with its own dot-joined path and a code from the closed
//! [`ErrorCode`] taxonomy. Rust errors ([`SchemaError`], the guard errors)
//! are reserved for misuse and for typed guard outcomes.

pub mod code;
pub mod context;
pub mod error;
pub mod traits;

pub use code::{ErrorCategory, ErrorCode};
pub use context::{GuardFailure, ValidationContext};
pub use error::{SchemaError, ValidationError, ValidationErrors, ValidationResult};
pub use traits::Validate;

pub(crate) use error::finish;
