//! Session persistence using `MessagePack`.
//!
//! A saved session holds every machine's stack and the session variables, so
//! that a later process can continue the same simulated machines. Values are
//! stored structurally:
//!
//! - tables are copied, so two slots that shared a table no longer do, and a
//!   table reachable from itself is cut at the back reference
//! - functions are stored by the global name they are bound to
//! - userdata, threads, unnamed functions, and cut tables are recorded only by
//!   type and come back as `nil`

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use apidemo_foundation::{Error, ErrorKind, LuaType, ObjectId, Result, TableRef, Value};
use serde::{Deserialize, Serialize};

/// Format version written into every saved session.
pub const FORMAT_VERSION: u32 = 1;

/// A value in saved form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SavedValue {
    /// `nil`
    Nil,
    /// A number.
    Number(f64),
    /// A boolean.
    Boolean(bool),
    /// A string.
    String(String),
    /// A table's pairs, in traversal order.
    Table(Vec<(SavedValue, SavedValue)>),
    /// A function bound to this global name.
    Function(String),
    /// A value that could not be saved.
    Lost(LuaType),
}

/// A machine's stack, bottom first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedMachine {
    /// Handle number when saved. Loading assigns fresh handles.
    pub handle: i64,
    /// The stack.
    pub stack: Vec<SavedValue>,
}

/// What a session variable was bound to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SavedBinding {
    /// A machine, by its saved handle number.
    Machine(i64),
    /// A captured value.
    Value(SavedValue),
}

/// Everything a session persists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    /// Always [`FORMAT_VERSION`] when written.
    pub version: u32,
    /// Every machine, oldest first.
    pub machines: Vec<SavedMachine>,
    /// Session variables, sorted by name.
    pub variables: Vec<(String, SavedBinding)>,
}

impl Default for SavedSession {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            machines: Vec::new(),
            variables: Vec::new(),
        }
    }
}

// =============================================================================
// Value Conversion
// =============================================================================

impl SavedValue {
    /// Converts a live value. `globals` names functions.
    #[must_use]
    pub fn save(value: &Value, globals: &TableRef) -> Self {
        Self::save_inner(value, globals, &mut Vec::new())
    }

    fn save_inner(value: &Value, globals: &TableRef, open: &mut Vec<ObjectId>) -> Self {
        match value {
            Value::Nil => Self::Nil,
            Value::Number(n) => Self::Number(*n),
            Value::Boolean(b) => Self::Boolean(*b),
            Value::String(s) => Self::String(s.to_string()),
            Value::Table(table) => {
                if open.contains(&table.id()) {
                    return Self::Lost(LuaType::Table);
                }
                open.push(table.id());
                let pairs = table
                    .pairs()
                    .iter()
                    .map(|(k, v)| {
                        (
                            Self::save_inner(k, globals, open),
                            Self::save_inner(v, globals, open),
                        )
                    })
                    .collect();
                open.pop();
                Self::Table(pairs)
            }
            Value::Function(_) => global_name(value, globals)
                .map_or(Self::Lost(LuaType::Function), Self::Function),
            Value::Opaque(_) | Value::Thread(_) => Self::Lost(value.lua_type()),
        }
    }

    /// Rebuilds a live value, appending the type of anything that cannot be
    /// rebuilt to `lost`.
    pub fn restore(&self, globals: &TableRef, lost: &mut Vec<LuaType>) -> Value {
        match self {
            Self::Nil => Value::Nil,
            Self::Number(n) => Value::Number(*n),
            Self::Boolean(b) => Value::Boolean(*b),
            Self::String(s) => Value::from(s.as_str()),
            Self::Table(pairs) => {
                let table = TableRef::new();
                for (k, v) in pairs {
                    let key = k.restore(globals, lost);
                    let value = v.restore(globals, lost);
                    // A key that came back as nil is dropped with its value.
                    let _ = table.set(key, value);
                }
                Value::Table(table)
            }
            Self::Function(name) => {
                let bound = globals.get_str(name);
                if bound.as_function().is_some() {
                    bound
                } else {
                    lost.push(LuaType::Function);
                    Value::Nil
                }
            }
            Self::Lost(ty) => {
                lost.push(*ty);
                Value::Nil
            }
        }
    }
}

fn global_name(function: &Value, globals: &TableRef) -> Option<String> {
    globals.pairs().into_iter().find_map(|(key, bound)| {
        if bound.raw_equal(function) {
            key.as_str().map(String::from)
        } else {
            None
        }
    })
}

// =============================================================================
// Encoding
// =============================================================================

/// Serializes a session using `MessagePack`.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(session: &SavedSession) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(session)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Deserializes a session from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not a saved session or were written by
/// an incompatible version.
pub fn from_bytes(bytes: &[u8]) -> Result<SavedSession> {
    let session: SavedSession = rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?;
    if session.version != FORMAT_VERSION {
        return Err(Error::new(ErrorKind::Serialization(format!(
            "unsupported session format version {}",
            session.version
        ))));
    }
    Ok(session)
}

/// Saves a session to a file, replacing any existing content.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_to_file<P: AsRef<Path>>(session: &SavedSession, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to create file '{}': {e}",
            path.display()
        )))
    })?;

    let mut writer = BufWriter::new(file);
    let bytes = to_bytes(session)?;
    writer
        .write_all(&bytes)
        .and_then(|()| writer.flush())
        .map_err(|e| {
            Error::new(ErrorKind::Io(format!(
                "failed to write to file '{}': {e}",
                path.display()
            )))
        })
}

/// Loads a session from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<SavedSession> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to open file '{}': {e}",
            path.display()
        )))
    })?;

    let mut bytes = Vec::new();
    BufReader::new(file).read_to_end(&mut bytes).map_err(|e| {
        Error::new(ErrorKind::Io(format!(
            "failed to read file '{}': {e}",
            path.display()
        )))
    })?;

    from_bytes(&bytes)
}
