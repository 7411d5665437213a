//! Function bodies the host knows how to call.
//!
//! A [`FunctionRef`] only carries identity and an opaque body. The host
//! stores a [`Callable`] in that body and downcasts it at call time.

use std::rc::Rc;

use apidemo_foundation::{FunctionRef, Value};

use crate::chunk::Chunk;
use crate::state::LuaState;

/// A native function.
///
/// Arguments occupy the frame's stack slots `1..=n`. The function leaves
/// its results on top of the stack and returns how many there are.
pub type NativeFn = fn(&mut LuaState) -> apidemo_foundation::Result<usize>;

/// What a host function value runs when called.
pub enum Callable {
    /// A Rust function working on the stack frame.
    Native(NativeFn),
    /// A compiled chunk.
    Chunk(Rc<Chunk>),
}

/// Wraps a native function as a function value.
#[must_use]
pub fn native(name: &str, f: NativeFn) -> Value {
    Value::Function(FunctionRef::new(Some(name), Rc::new(Callable::Native(f))))
}

/// Wraps a compiled chunk as a function value.
#[must_use]
pub fn chunk_function(chunk: Rc<Chunk>) -> Value {
    Value::Function(FunctionRef::new(None, Rc::new(Callable::Chunk(chunk))))
}
