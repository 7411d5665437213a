//! Integration tests for Layer 1: Host
//!
//! Tests the emulated state through its embedding API: stack manipulation,
//! tables and metatables, calls, and the auxiliary library.

mod auxiliary;
mod calls;
mod stack;
mod tables;
