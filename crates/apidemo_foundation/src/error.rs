//! Error types for apidemo.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Recoverable failures travel as [`Error`]; contract violations in the
//! state store are panics and never appear here.

use std::fmt;

use thiserror::Error;

use crate::value::Value;

/// The main error type for apidemo operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an argument type error for a dispatched operation.
    ///
    /// `position` counts the leading handle as argument 1.
    #[must_use]
    pub fn argument_type(
        position: usize,
        function: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::ArgumentType {
            position,
            function: function.into(),
            expected: expected.into(),
            actual: actual.into(),
        })
    }

    /// Creates a raised runtime error carrying `payload`.
    #[must_use]
    pub fn runtime(payload: impl Into<Value>) -> Self {
        Self::new(ErrorKind::Runtime(payload.into()))
    }

    /// Creates a chunk syntax error.
    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax(message.into()))
    }

    /// Creates an unknown operation error.
    #[must_use]
    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownOperation(name.into()))
    }

    /// Creates an unknown variable error.
    #[must_use]
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownVariable(name.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns the value a protected call would observe for this error.
    ///
    /// Runtime errors yield their payload; every other kind yields its
    /// message as a string.
    #[must_use]
    pub fn payload(&self) -> Value {
        match &self.kind {
            ErrorKind::Runtime(value) => value.clone(),
            ErrorKind::Syntax(message) => Value::from(message.as_str()),
            other => Value::from(other.to_string()),
        }
    }

    /// Returns true if this is a raised runtime error.
    #[must_use]
    pub const fn is_runtime(&self) -> bool {
        matches!(self.kind, ErrorKind::Runtime(_))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    /// A dispatched operation received an argument of the wrong shape.
    #[error("bad argument #{position} to '{function}' ({expected} expected, got {actual})")]
    ArgumentType {
        /// Argument position, the handle being 1.
        position: usize,
        /// The operation name.
        function: String,
        /// The expected shape.
        expected: String,
        /// The type actually supplied.
        actual: String,
    },

    /// An error raised inside the host runtime, with its payload.
    #[error("{}", describe_payload(.0))]
    Runtime(Value),

    /// A chunk failed to parse.
    #[error("{0}")]
    Syntax(String),

    /// No catalog entry with this name.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// No session variable with this name.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// I/O failure (session files, script files).
    #[error("I/O error: {0}")]
    Io(String),

    /// Session encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

fn describe_payload(payload: &Value) -> String {
    match payload {
        Value::String(_) | Value::Number(_) => payload.to_string(),
        other => format!("(error object is a {} value)", other.type_name()),
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(err.to_string()))
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Chunk name, script file, or operation name.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<usize>,
    /// Column number in source.
    pub column: Option<usize>,
    /// Operations or calls the error passed through.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            line: None,
            column: None,
            stack: Vec::new(),
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
