//! Emulated Lua 5.1 state for apidemo.
//!
//! This crate provides the live execution surface the simulator drives:
//! - [`LuaState`] - Value stack, registry, globals, and call frames
//! - Stack, table, metatable, and call primitives of the embedding API
//! - The auxiliary library (argument checks, references, chunk loading)
//! - A small chunk language ([`chunk`]) and the base library
//!
//! Errors raised inside the state are [`apidemo_foundation::Error`] values of
//! kind `Runtime`, carrying the raised value.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod access;
mod auxlib;
mod baselib;
pub mod chunk;
pub mod consts;
pub mod function;
mod ops;
mod state;

pub use function::{Callable, NativeFn, native};
pub use state::LuaState;
