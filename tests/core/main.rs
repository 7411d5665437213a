//! Integration tests for Layer 2: Core
//!
//! Tests the state store, the stack printer, and whole operation sequences
//! run through the dispatcher.

mod dispatch;
mod store;
