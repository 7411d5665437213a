//! Command language, REPL, CLI, and session persistence for apidemo.
//!
//! This crate provides:
//! - [`Session`] - Variables bound to machines and captured values, on top of
//!   a [`Dispatcher`](apidemo_core::Dispatcher)
//! - [`Repl`] - Interactive read-eval-print loop and script runner
//! - [`parse_command`] - The one-line command grammar
//! - [`serialize`] - Saving and loading whole sessions
//!
//! ```
//! use apidemo_core::DispatcherConfig;
//! use apidemo_runtime::{Binding, Session};
//!
//! let mut session = Session::with_config(DispatcherConfig::new().quiet());
//! session.eval_line("L = luaL_newstate()").unwrap();
//! session.eval_line("lua_pushinteger(L, 3)").unwrap();
//! session.eval_line("n = lua_gettop(L)").unwrap();
//! assert!(matches!(session.variable("n"), Some(Binding::Value(_))));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod command;
mod editor;
mod highlight;
mod repl;
pub mod serialize;
mod session;

pub use command::{Command, Operand, parse_command};
pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use highlight::CommandHighlighter;
pub use repl::{Repl, is_complete};
pub use serialize::SavedSession;
pub use session::{Binding, COMMANDS, LoadReport, NEWSTATE, Outcome, Session};
