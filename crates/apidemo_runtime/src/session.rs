//! Session state for the REPL.
//!
//! The session owns the dispatcher and the variables bound by
//! `name = operation(...)`. Variables hold either a machine handle or a
//! captured result.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write};
use std::path::Path;

use apidemo_core::{Dispatcher, DispatcherConfig, Handle, OutShape};
use apidemo_foundation::{Error, LuaType, Result, Value};
use apidemo_host::consts::{NAMED_CONSTANTS, named_constant};
use tracing::debug;

use crate::command::{Command, Operand, parse_command};
use crate::serialize::{self, SavedBinding, SavedMachine, SavedSession, SavedValue};

/// Name of the operation that creates a machine.
pub const NEWSTATE: &str = "luaL_newstate";

/// Commands that are not operations.
pub const COMMANDS: &[&str] = &["help", "history", "machines", "save", "load"];

/// What a session variable holds.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    /// A machine handle, from `luaL_newstate()`.
    Machine(Handle),
    /// A captured operation result.
    Value(Value),
}

/// The result of executing one command.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Nothing to show.
    Nothing,
    /// A new machine.
    Machine(Handle),
    /// An operation result.
    Value(Value),
    /// Text for the user.
    Text(String),
}

/// Summary of a `load`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    /// Machines created.
    pub machines: usize,
    /// Variables bound.
    pub variables: usize,
    /// Types of values that came back as `nil`.
    pub lost: Vec<LuaType>,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loaded {} machine(s), {} variable(s)",
            self.machines, self.variables
        )?;
        if !self.lost.is_empty() {
            let names: Vec<_> = self.lost.iter().map(|t| t.name()).collect();
            write!(f, "; restored as nil: {}", names.join(", "))?;
        }
        Ok(())
    }
}

/// Session state for an interactive or batch run.
#[derive(Debug)]
pub struct Session {
    dispatcher: Dispatcher,
    variables: BTreeMap<String, Binding>,
}

impl Session {
    /// Creates a session with the default dispatcher configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Creates a session with the given dispatcher configuration.
    #[must_use]
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(config),
            variables: BTreeMap::new(),
        }
    }

    /// Returns the dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the dispatcher mutably.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    // =========================================================================
    // Variables
    // =========================================================================

    /// Gets a variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Binding> {
        self.variables.get(name)
    }

    /// Binds a variable, replacing any previous binding.
    pub fn set_variable(&mut self, name: impl Into<String>, binding: Binding) {
        self.variables.insert(name.into(), binding);
    }

    /// Returns every variable, sorted by name.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Words for tab completion: operations, commands, constants, variables.
    #[must_use]
    pub fn completions(&self) -> Vec<String> {
        let mut words: Vec<String> = self.dispatcher.catalog().names().map(String::from).collect();
        words.push(NEWSTATE.to_string());
        words.extend(COMMANDS.iter().map(|c| (*c).to_string()));
        words.extend(NAMED_CONSTANTS.iter().map(|(name, _)| (*name).to_string()));
        words.extend(self.variables.keys().cloned());
        words.sort();
        words.dedup();
        words
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Parses and executes one command.
    ///
    /// # Errors
    ///
    /// Returns parse errors and anything the command raises.
    pub fn eval_line(&mut self, line: &str) -> Result<Outcome> {
        let command = parse_command(line)?;
        self.execute(command)
    }

    /// Executes a parsed command.
    ///
    /// # Errors
    ///
    /// Returns anything the command raises.
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Empty => Ok(Outcome::Nothing),
            Command::Call {
                target,
                operation,
                operands,
            } => self.call(target, &operation, &operands),
            Command::Help(None) => Ok(Outcome::Text(self.dispatcher.help())),
            Command::Help(Some(operation)) if operation == NEWSTATE => Ok(Outcome::Text(
                "lua_State *luaL_newstate(void)\n  create a machine with an empty stack\n"
                    .to_string(),
            )),
            Command::Help(Some(operation)) => {
                Ok(Outcome::Text(self.dispatcher.help_for(&operation)?))
            }
            Command::History(count) => Ok(Outcome::Text(self.history(count))),
            Command::Machines => Ok(Outcome::Text(self.machines())),
            Command::Save(path) => {
                self.save(&path)?;
                Ok(Outcome::Text(format!("saved to {path}")))
            }
            Command::Load(path) => Ok(Outcome::Text(self.load(&path)?.to_string())),
            Command::Show(name) => self.show(&name),
        }
    }

    fn call(
        &mut self,
        target: Option<String>,
        operation: &str,
        operands: &[Operand],
    ) -> Result<Outcome> {
        if operation == NEWSTATE {
            let handle = self.dispatcher.create()?;
            if let Some(name) = target {
                self.set_variable(name, Binding::Machine(handle));
            }
            return Ok(Outcome::Machine(handle));
        }

        let descriptor = self.dispatcher.catalog().lookup(operation)?;
        if target.is_some() && descriptor.output == OutShape::None {
            return Err(Error::syntax(format!("{operation} returns no value")));
        }

        let handle = match operands.first().map(|o| self.resolve(o)).transpose()? {
            Some(Binding::Machine(handle)) => handle,
            Some(Binding::Value(value)) => {
                return Err(Error::argument_type(1, operation, "machine", value.type_name()));
            }
            None => return Err(Error::argument_type(1, operation, "machine", "no value")),
        };
        let mut args = Vec::with_capacity(operands.len().saturating_sub(1));
        for (i, operand) in operands.iter().enumerate().skip(1) {
            match self.resolve(operand)? {
                Binding::Value(value) => args.push(value),
                Binding::Machine(_) => {
                    return Err(Error::argument_type(i + 1, operation, "value", "machine"));
                }
            }
        }

        match self.dispatcher.dispatch(descriptor, handle, &args)? {
            Some(value) => {
                if let Some(name) = target {
                    self.set_variable(name, Binding::Value(value.clone()));
                }
                Ok(Outcome::Value(value))
            }
            None => Ok(Outcome::Nothing),
        }
    }

    /// Resolves an operand. Booleans become C truth values.
    ///
    /// # Errors
    ///
    /// Returns `UnknownVariable` for a name that is neither a variable nor a
    /// named constant.
    pub fn resolve(&self, operand: &Operand) -> Result<Binding> {
        let value = match operand {
            Operand::Number(n) => Value::Number(*n),
            Operand::String(s) => Value::from(s.as_str()),
            Operand::Boolean(b) => Value::from(i32::from(*b)),
            Operand::Nil => Value::Nil,
            Operand::Name(name) => {
                if let Some(binding) = self.variables.get(name) {
                    return Ok(binding.clone());
                }
                let n = named_constant(name).ok_or_else(|| Error::unknown_variable(name))?;
                Value::from(n)
            }
        };
        Ok(Binding::Value(value))
    }

    fn show(&mut self, name: &str) -> Result<Outcome> {
        match self.resolve(&Operand::Name(name.to_string()))? {
            Binding::Machine(handle) => Ok(Outcome::Text(self.dispatcher.render(handle))),
            Binding::Value(value) => Ok(Outcome::Value(value)),
        }
    }

    /// Renders the most recent echo lines, oldest first.
    #[must_use]
    pub fn history(&self, count: Option<usize>) -> String {
        let echo = self.dispatcher.echo();
        let lines = echo.recent(count.unwrap_or(echo.len()));
        lines.iter().map(|line| format!("{line}\n")).collect()
    }

    /// Lists every machine with the variables naming it and its stack.
    pub fn machines(&mut self) -> String {
        let mut names: HashMap<Handle, Vec<&str>> = HashMap::new();
        for (name, binding) in &self.variables {
            if let Binding::Machine(handle) = binding {
                names.entry(*handle).or_default().push(name);
            }
        }

        let mut out = String::new();
        for handle in self.dispatcher.handles() {
            let label = names
                .get(&handle)
                .map(|n| format!(" ({})", n.join(", ")))
                .unwrap_or_default();
            let stack = self.dispatcher.render(handle);
            let _ = writeln!(out, "{handle}{label}: {stack}");
        }
        if out.is_empty() {
            out.push_str("no machines\n");
        }
        out
    }

    /// Drains lines written by `print`.
    pub fn take_output(&mut self) -> Vec<String> {
        self.dispatcher.take_output()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Captures every machine and variable.
    pub fn snapshot(&mut self) -> SavedSession {
        let globals = self.dispatcher.host().globals().clone();
        let machines = self
            .dispatcher
            .handles()
            .into_iter()
            .map(|handle| SavedMachine {
                handle: handle.raw(),
                stack: self
                    .dispatcher
                    .snapshot(handle)
                    .iter()
                    .map(|v| SavedValue::save(v, &globals))
                    .collect(),
            })
            .collect();
        let variables = self
            .variables
            .iter()
            .map(|(name, binding)| {
                let saved = match binding {
                    Binding::Machine(handle) => SavedBinding::Machine(handle.raw()),
                    Binding::Value(value) => SavedBinding::Value(SavedValue::save(value, &globals)),
                };
                (name.clone(), saved)
            })
            .collect();
        SavedSession {
            machines,
            variables,
            ..SavedSession::default()
        }
    }

    /// Adds saved machines and variables to this session.
    ///
    /// Every saved machine becomes a new machine; variables that named a
    /// saved machine are rebound to its replacement.
    ///
    /// # Errors
    ///
    /// Returns an error if a machine cannot be created.
    pub fn restore(&mut self, saved: SavedSession) -> Result<LoadReport> {
        let globals = self.dispatcher.host().globals().clone();
        let mut report = LoadReport::default();
        let mut handles = HashMap::new();

        for machine in saved.machines {
            let values = machine
                .stack
                .iter()
                .map(|v| v.restore(&globals, &mut report.lost))
                .collect();
            let handle = self.dispatcher.restore(values)?;
            debug!(saved = machine.handle, %handle, "restored machine");
            handles.insert(machine.handle, handle);
            report.machines += 1;
        }

        for (name, binding) in saved.variables {
            let binding = match binding {
                SavedBinding::Machine(raw) => match handles.get(&raw) {
                    Some(handle) => Binding::Machine(*handle),
                    None => {
                        debug!(%name, raw, "variable names a machine that was not saved");
                        continue;
                    }
                },
                SavedBinding::Value(value) => Binding::Value(value.restore(&globals, &mut report.lost)),
            };
            self.set_variable(name, binding);
            report.variables += 1;
        }

        Ok(report)
    }

    /// Saves the session to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let saved = self.snapshot();
        serialize::save_to_file(&saved, &path)?;
        debug!(
            path = %path.as_ref().display(),
            machines = saved.machines.len(),
            "saved session"
        );
        Ok(())
    }

    /// Loads a saved session into this one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds no session.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadReport> {
        let saved = serialize::load_from_file(path)?;
        self.restore(saved)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
