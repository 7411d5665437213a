//! The generic operation dispatcher.
//!
//! Every operation runs the same way:
//!
//! 1. Validate the declared arguments (positions after the handle).
//! 2. Check the machine out onto the live surface.
//! 3. Run the primitive.
//! 4. Render the surface and emit the line to the echo sink.
//! 5. Check the machine back in.
//! 6. Package the result.
//!
//! A failing primitive skips steps 4 and 6: the surface is checked in as it
//! stands and the error propagates. The error-propagating operation
//! (`lua_error`) renders and saves the surface without its top value, the
//! payload, and then raises it.

use apidemo_foundation::number::number_to_integer;
use apidemo_foundation::{Error, Result, Value};
use apidemo_host::LuaState;
use tracing::{debug, trace};

use crate::catalog::{Arg, ArgShape, Args, Catalog, Descriptor};
use crate::config::DispatcherConfig;
use crate::echo::StackEcho;
use crate::help;
use crate::printer::StackPrinter;
use crate::store::{Handle, StateStore};

/// Runs catalog operations against simulated machines.
///
/// Owns the host state every machine shares, the store of machine
/// snapshots, the printer, and the echo sink.
#[derive(Debug)]
pub struct Dispatcher {
    host: LuaState,
    store: StateStore,
    catalog: Catalog,
    printer: StackPrinter,
    echo: StackEcho,
}

impl Dispatcher {
    /// Creates a dispatcher with the standard catalog.
    #[must_use]
    pub fn new(config: DispatcherConfig) -> Self {
        let printer = if config.detect_cycles {
            StackPrinter::new().with_cycle_detection()
        } else {
            StackPrinter::new()
        };
        Self {
            host: LuaState::new(),
            store: StateStore::new(),
            catalog: Catalog::standard(),
            printer,
            echo: StackEcho::new(config.echo, config.history_size),
        }
    }

    // =========================================================================
    // Machines
    // =========================================================================

    /// Creates a machine with an empty stack (`luaL_newstate`).
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot allocate the machine.
    pub fn create(&mut self) -> Result<Handle> {
        self.store.create(&mut self.host)
    }

    /// Creates a machine whose stack is `values`, bottom first.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot allocate the machine.
    pub fn restore(&mut self, values: Vec<Value>) -> Result<Handle> {
        self.store.create_with(&mut self.host, values)
    }

    /// Returns every machine, oldest first.
    #[must_use]
    pub fn handles(&self) -> Vec<Handle> {
        self.store.handles(&self.host)
    }

    /// Returns true if `handle` names a machine.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.store.contains(&self.host, handle)
    }

    /// Returns a copy of a machine's stack.
    ///
    /// # Panics
    ///
    /// Panics if `handle` names no machine.
    #[must_use]
    pub fn snapshot(&mut self, handle: Handle) -> Vec<Value> {
        self.store.snapshot(&mut self.host, handle)
    }

    /// Renders a machine's stack without emitting it.
    ///
    /// # Panics
    ///
    /// Panics if `handle` names no machine.
    #[must_use]
    pub fn render(&mut self, handle: Handle) -> String {
        let values = self.snapshot(handle);
        self.printer.render_values(&values, self.host.globals())
    }

    /// Renders one value the way the printer shows it.
    #[must_use]
    pub fn render_value(&self, value: &Value) -> String {
        self.printer.render_value(value, self.host.globals())
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Runs operation `name` on `handle` with `args`.
    ///
    /// Returns the packaged result, or `None` for operations without one.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOperation` for names outside the catalog,
    /// `ArgumentType` when an argument has the wrong shape (before the
    /// machine is touched), and any error the operation raises.
    ///
    /// # Panics
    ///
    /// Panics if `handle` names no machine.
    pub fn invoke(&mut self, name: &str, handle: Handle, args: &[Value]) -> Result<Option<Value>> {
        let descriptor = self.catalog.lookup(name)?;
        self.dispatch(descriptor, handle, args)
    }

    /// Runs `descriptor` on `handle` with `args`.
    ///
    /// # Errors
    ///
    /// See [`invoke`](Self::invoke).
    ///
    /// # Panics
    ///
    /// Panics if `handle` names no machine.
    pub fn dispatch(
        &mut self,
        descriptor: &Descriptor,
        handle: Handle,
        args: &[Value],
    ) -> Result<Option<Value>> {
        let args = validate(descriptor, args)?;
        trace!(operation = descriptor.name, %handle, "dispatching");

        let mut guard = self.store.acquire(&mut self.host, handle);
        match (descriptor.primitive)(guard.host(), &args) {
            Ok(ret) => {
                self.echo.emit(self.printer.render(guard.host_ref(), 0));
                guard.checkin(0);
                Ok(ret.into_value())
            }
            Err(err) if descriptor.error_propagating => {
                self.echo.emit(self.printer.render(guard.host_ref(), 1));
                guard.checkin(1);
                debug!(operation = descriptor.name, %handle, error = %err, "raised");
                Err(err)
            }
            Err(err) => {
                drop(guard);
                debug!(operation = descriptor.name, %handle, error = %err, "operation failed");
                Err(err)
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the echo sink.
    #[must_use]
    pub fn echo(&self) -> &StackEcho {
        &self.echo
    }

    /// Returns the echo sink for reconfiguration.
    pub fn echo_mut(&mut self) -> &mut StackEcho {
        &mut self.echo
    }

    /// Returns the machine checked out onto the live surface, if any.
    ///
    /// Always `None` between operations.
    #[must_use]
    pub fn active(&self) -> Option<Handle> {
        self.store.active()
    }

    /// Returns the host state.
    #[must_use]
    pub fn host(&self) -> &LuaState {
        &self.host
    }

    /// Drains lines written by `print` inside the machines.
    pub fn take_output(&mut self) -> Vec<String> {
        self.host.take_output()
    }

    /// Renders the full help text.
    #[must_use]
    pub fn help(&self) -> String {
        help::render(&self.catalog)
    }

    /// Renders help for one operation.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOperation` for names outside the catalog.
    pub fn help_for(&self, name: &str) -> Result<String> {
        Ok(help::describe(self.catalog.lookup(name)?))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

/// Checks `args` against the declared inputs of `descriptor`.
///
/// Extra arguments are ignored. Positions in errors count the handle as 1.
///
/// # Errors
///
/// Returns `ArgumentType` for a missing or mistyped argument.
pub fn validate(descriptor: &Descriptor, args: &[Value]) -> Result<Args> {
    let mut validated = Vec::with_capacity(descriptor.inputs.len());
    for (i, shape) in descriptor.inputs.iter().enumerate() {
        let value = args.get(i);
        let arg = value.and_then(|v| convert(*shape, v)).ok_or_else(|| {
            Error::argument_type(
                i + 2,
                descriptor.name,
                shape.expected(),
                value.map_or("no value", Value::type_name),
            )
        })?;
        validated.push(arg);
    }
    Ok(Args::new(validated))
}

fn convert(shape: ArgShape, value: &Value) -> Option<Arg> {
    match shape {
        ArgShape::Int => value.to_number().map(|n| Arg::Int(number_to_integer(n))),
        ArgShape::Number => value.to_number().map(Arg::Number),
        ArgShape::Str => value.to_str().map(Arg::Str),
    }
}
