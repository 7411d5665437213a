//! apidemo - a simulated Lua C API, driven one call at a time
//!
//! This crate re-exports all layers of the apidemo system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: apidemo_runtime    - Command language, REPL, CLI, session files
//! Layer 2: apidemo_core       - State store, stack printer, catalog, dispatcher
//! Layer 1: apidemo_host       - Emulated Lua state and its embedding API
//! Layer 0: apidemo_foundation - Core types (Value, TableRef, LuaType, Error)
//! ```

pub use apidemo_core as core;
pub use apidemo_foundation as foundation;
pub use apidemo_host as host;
pub use apidemo_runtime as runtime;
