//! Core value model, tables, type codes, and errors for apidemo.
//!
//! This crate provides:
//! - [`Value`] - The tagged union for every value a simulated stack can hold
//! - [`TableRef`] - Shared, mutable, identity-compared tables
//! - [`LuaType`] - Type codes and names as the embedding API reports them
//! - [`Error`] - Rich error types with context
//! - Number formatting and string-to-number coercion ([`number`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod number;
pub mod table;
pub mod types;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind};
pub use table::{TableKey, TableRef};
pub use types::LuaType;
pub use value::{FunctionRef, ObjectId, ThreadRef, UserdataRef, Value};

/// Result type for apidemo operations.
pub type Result<T> = std::result::Result<T, Error>;
