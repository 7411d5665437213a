//! Integration tests for Layer 3: Runtime
//!
//! Tests the command language, sessions driven line by line, scripts run
//! through the REPL, and saving and loading sessions.

mod commands;
mod persistence;
mod scripts;
mod session;
