//! The simulator proper: machines, the stack printer, and the dispatcher.
//!
//! This crate provides:
//! - [`StateStore`] - Persists each simulated machine's stack in the host
//!   registry and swaps it onto the live surface for one operation
//! - [`StackPrinter`] - Renders a stack as a single `stack:` line
//! - [`Catalog`] - Declarative descriptors for every supported operation
//! - [`Dispatcher`] - Runs a descriptor: validate, check out, run, echo,
//!   check in, package
//! - [`StackEcho`] - Where printed stack lines go, with a bounded history
//!
//! # Example
//!
//! ```
//! use apidemo_core::{Dispatcher, DispatcherConfig};
//! use apidemo_foundation::Value;
//!
//! let mut dispatcher = Dispatcher::new(DispatcherConfig::new().quiet());
//! let l = dispatcher.create().unwrap();
//! dispatcher.invoke("lua_pushnumber", l, &[Value::from(10)]).unwrap();
//! dispatcher.invoke("lua_pushstring", l, &[Value::from("hi")]).unwrap();
//! assert_eq!(dispatcher.echo().last(), Some("stack: 10 'hi'"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod echo;
pub mod help;
pub mod printer;
pub mod store;

pub use catalog::{ArgShape, Catalog, Category, DESCRIPTORS, Descriptor, OutShape};
pub use config::DispatcherConfig;
pub use dispatch::Dispatcher;
pub use echo::{EchoTarget, StackEcho};
pub use printer::StackPrinter;
pub use store::{Checkout, Handle, StateStore};
