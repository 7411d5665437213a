//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, TableRef, LuaType, number conversion, and Error.

mod errors;
mod tables;
mod values;
