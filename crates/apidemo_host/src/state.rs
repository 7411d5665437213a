//! The emulated state: value stack, registry, globals, and call frames.
//!
//! Indices follow the embedding API: positive indices count up from the
//! bottom of the current frame (1 is the first slot), negative indices count
//! down from the top (-1 is the top), and pseudo-indices address the
//! registry and the globals table. Index 0 and indices past the top are
//! "none": acceptable everywhere, but empty.

use std::rc::Rc;

use apidemo_foundation::number::number_to_string;
use apidemo_foundation::{Error, LuaType, Result, TableRef, ThreadRef, Value};

use crate::consts::{
    LUA_ENVIRONINDEX, LUA_GLOBALSINDEX, LUA_REGISTRYINDEX, LUAI_MAXCSTACK,
};

/// An activation record.
#[derive(Clone, Debug, Default)]
pub(crate) struct Frame {
    /// Absolute stack position of the frame's slot 1.
    pub(crate) base: usize,
    /// Name the function was called by, if known.
    pub(crate) name: Option<Rc<str>>,
    /// `chunk:line: ` prefix while a chunk is running.
    pub(crate) location: Option<String>,
}

/// Where an index points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    Stack(usize),
    Registry,
    Globals,
    None,
}

/// An emulated Lua 5.1 state.
///
/// There is one value stack (the live execution surface). Native functions
/// and chunks run in frames stacked on top of the root frame, which is where
/// embedding-API calls operate.
pub struct LuaState {
    pub(crate) stack: Vec<Value>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) registry: TableRef,
    pub(crate) globals: TableRef,
    pub(crate) type_metatables: [Option<TableRef>; 9],
    main_thread: ThreadRef,
    output: Vec<String>,
}

impl LuaState {
    /// Creates a state with the base library loaded.
    #[must_use]
    pub fn new() -> Self {
        let globals = TableRef::new();
        globals.set_str("_G", Value::Table(globals.clone()));
        globals.set_str("_VERSION", Value::from("Lua 5.1"));

        let mut state = Self {
            stack: Vec::new(),
            frames: vec![Frame::default()],
            registry: TableRef::new(),
            globals,
            type_metatables: Default::default(),
            main_thread: ThreadRef::new(),
            output: Vec::new(),
        };
        crate::baselib::open(&mut state);
        state
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the registry table.
    #[must_use]
    pub fn registry(&self) -> &TableRef {
        &self.registry
    }

    /// Returns the globals table.
    #[must_use]
    pub fn globals(&self) -> &TableRef {
        &self.globals
    }

    /// Returns the main thread.
    #[must_use]
    pub const fn main_thread(&self) -> ThreadRef {
        self.main_thread
    }

    /// Returns the values of the current frame, bottom first.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.stack[self.base()..]
    }

    /// Returns lines written by `print` since the last [`take_output`](Self::take_output).
    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Drains the captured `print` output.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub(crate) fn write_output(&mut self, line: String) {
        self.output.push(line);
    }

    // =========================================================================
    // Frames and index resolution
    // =========================================================================

    pub(crate) fn base(&self) -> usize {
        self.frames.last().map_or(0, |f| f.base)
    }

    /// Returns the `chunk:line: ` prefix of the function `level` frames
    /// below the running one, or an empty string.
    #[must_use]
    pub fn location(&self, level: usize) -> String {
        self.frames
            .len()
            .checked_sub(level + 1)
            .and_then(|i| self.frames[i].location.clone())
            .unwrap_or_default()
    }

    /// Builds a runtime error positioned at the running chunk, if any.
    #[must_use]
    pub fn runtime_error(&self, message: impl AsRef<str>) -> Error {
        Error::runtime(format!("{}{}", self.location(0), message.as_ref()))
    }

    pub(crate) fn resolve(&self, idx: i64) -> Slot {
        let top = self.stack.len();
        let base = self.base();
        if idx > 0 {
            let abs = base.saturating_add(to_usize(idx) - 1);
            if abs < top { Slot::Stack(abs) } else { Slot::None }
        } else if idx > LUA_REGISTRYINDEX {
            let back = to_usize(-idx);
            if idx != 0 && back <= top - base {
                Slot::Stack(top - back)
            } else {
                Slot::None
            }
        } else if idx == LUA_REGISTRYINDEX {
            Slot::Registry
        } else if idx == LUA_GLOBALSINDEX || idx == LUA_ENVIRONINDEX {
            Slot::Globals
        } else {
            Slot::None
        }
    }

    /// Resolves an index that must name a live stack slot.
    pub(crate) fn stack_slot(&self, idx: i64) -> Result<usize> {
        match self.resolve(idx) {
            Slot::Stack(abs) => Ok(abs),
            _ => Err(Error::runtime(format!("invalid stack index {idx}"))),
        }
    }

    /// Converts a relative index into an absolute one. Pseudo-indices and
    /// positive indices are returned unchanged.
    #[must_use]
    pub fn abs_index(&self, idx: i64) -> i64 {
        if idx < 0 && idx > LUA_REGISTRYINDEX {
            self.gettop() + idx + 1
        } else {
            idx
        }
    }

    /// Returns the value at `idx`, or `None` for an empty index.
    #[must_use]
    pub fn get(&self, idx: i64) -> Option<Value> {
        match self.resolve(idx) {
            Slot::Stack(abs) => Some(self.stack[abs].clone()),
            Slot::Registry => Some(Value::Table(self.registry.clone())),
            Slot::Globals => Some(Value::Table(self.globals.clone())),
            Slot::None => None,
        }
    }

    /// Returns the value at `idx`, nil for an empty index.
    #[must_use]
    pub fn value(&self, idx: i64) -> Value {
        self.get(idx).unwrap_or_default()
    }

    // =========================================================================
    // Stack primitives
    // =========================================================================

    /// Number of values in the current frame.
    #[must_use]
    pub fn gettop(&self) -> i64 {
        i64::try_from(self.stack.len() - self.base()).unwrap_or(i64::MAX)
    }

    /// Sets the top. Growing fills with nil; a negative index is relative
    /// to the current top (`-1` leaves it unchanged).
    ///
    /// # Errors
    ///
    /// Returns an error when shrinking below the frame or growing past the
    /// stack limit.
    pub fn settop(&mut self, idx: i64) -> Result<()> {
        let base = self.base();
        if idx >= 0 {
            let size = to_usize(idx);
            if size > LUAI_MAXCSTACK {
                return Err(Error::runtime("stack overflow"));
            }
            self.stack.resize(base + size, Value::Nil);
        } else {
            let drop = to_usize(-(idx + 1));
            let len = self.stack.len() - base;
            if drop > len {
                return Err(Error::runtime(format!("invalid new top {idx}")));
            }
            self.stack.truncate(self.stack.len() - drop);
        }
        Ok(())
    }

    /// Pops `n` values.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than `n` values are on the stack.
    pub fn pop(&mut self, n: i64) -> Result<()> {
        let idx = n
            .checked_neg()
            .and_then(|m| m.checked_sub(1))
            .ok_or_else(|| Error::runtime(format!("invalid argument count {n}")))?;
        self.settop(idx)
    }

    /// Pushes any value.
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pops the top value, nil if the frame is empty.
    pub fn pop_value(&mut self) -> Value {
        if self.stack.len() > self.base() {
            self.stack.pop().unwrap_or_default()
        } else {
            Value::Nil
        }
    }

    pub(crate) fn require_values(&self, n: usize) -> Result<()> {
        if self.stack.len() - self.base() < n {
            Err(Error::runtime("not enough elements in the stack"))
        } else {
            Ok(())
        }
    }

    /// Pushes a copy of the value at `idx`.
    pub fn pushvalue(&mut self, idx: i64) {
        let value = self.value(idx);
        self.push(value);
    }

    /// Removes the value at `idx`, shifting the values above it down.
    ///
    /// # Errors
    ///
    /// Returns an error if `idx` is not a live stack slot.
    pub fn remove(&mut self, idx: i64) -> Result<()> {
        let abs = self.stack_slot(idx)?;
        self.stack.remove(abs);
        Ok(())
    }

    /// Moves the top value into `idx`, shifting the values above it up.
    ///
    /// # Errors
    ///
    /// Returns an error if `idx` is not a live stack slot.
    pub fn insert(&mut self, idx: i64) -> Result<()> {
        let abs = self.stack_slot(idx)?;
        let value = self.pop_value();
        self.stack.insert(abs, value);
        Ok(())
    }

    /// Pops the top value into `idx`.
    ///
    /// Replacing `LUA_GLOBALSINDEX` installs a new globals table.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty, `idx` is not replaceable, or
    /// a non-table is installed as globals.
    pub fn replace(&mut self, idx: i64) -> Result<()> {
        self.require_values(1)?;
        match self.resolve(idx) {
            Slot::Stack(abs) => {
                let value = self.pop_value();
                // Replacing the top slot with itself leaves the stack one shorter.
                if abs < self.stack.len() {
                    self.stack[abs] = value;
                }
                Ok(())
            }
            Slot::Globals => match self.pop_value() {
                Value::Table(t) => {
                    self.globals = t;
                    Ok(())
                }
                other => Err(Error::runtime(format!(
                    "table expected, got {}",
                    other.type_name()
                ))),
            },
            _ => Err(Error::runtime(format!("invalid stack index {idx}"))),
        }
    }

    /// Returns true if `n` more slots can be pushed.
    #[must_use]
    pub fn checkstack(&self, n: i64) -> bool {
        let used = self.stack.len() - self.base();
        n < 0 || used.saturating_add(to_usize(n)) <= LUAI_MAXCSTACK
    }

    /// Pushes nil.
    pub fn push_nil(&mut self) {
        self.push(Value::Nil);
    }

    /// Pushes a number.
    pub fn push_number(&mut self, n: f64) {
        self.push(Value::Number(n));
    }

    /// Pushes an integer (as a number).
    pub fn push_integer(&mut self, n: i64) {
        self.push(Value::from(n));
    }

    /// Pushes a boolean.
    pub fn push_boolean(&mut self, b: bool) {
        self.push(Value::Boolean(b));
    }

    /// Pushes a copy of `s`.
    pub fn push_string(&mut self, s: &str) {
        self.push(Value::from(s));
    }

    /// Pushes the first `len` bytes of `s`.
    ///
    /// The length is clamped to the string and rounded down to a character
    /// boundary.
    pub fn push_lstring(&mut self, s: &str, len: i64) {
        let mut end = to_usize(len.max(0)).min(s.len());
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.push_string(&s[..end]);
    }

    /// Pushes the running thread. Returns true because only the main thread
    /// ever runs.
    pub fn push_thread(&mut self) -> bool {
        let thread = self.main_thread;
        self.push(Value::Thread(thread));
        true
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Type of the value at `idx`, [`LuaType::None`] when empty.
    #[must_use]
    pub fn type_of(&self, idx: i64) -> LuaType {
        self.get(idx).map_or(LuaType::None, |v| v.lua_type())
    }

    /// Name of a type code, `None` for unknown codes.
    #[must_use]
    pub fn typename(code: i64) -> Option<&'static str> {
        LuaType::from_code(code).map(LuaType::name)
    }

    /// True for numbers and numeric strings.
    #[must_use]
    pub fn is_number(&self, idx: i64) -> bool {
        self.get(idx).is_some_and(|v| v.to_number().is_some())
    }

    /// True for strings and numbers.
    #[must_use]
    pub fn is_string(&self, idx: i64) -> bool {
        matches!(self.get(idx), Some(Value::String(_) | Value::Number(_)))
    }

    /// True for booleans.
    #[must_use]
    pub fn is_boolean(&self, idx: i64) -> bool {
        self.type_of(idx) == LuaType::Boolean
    }

    /// True for functions.
    #[must_use]
    pub fn is_function(&self, idx: i64) -> bool {
        self.type_of(idx) == LuaType::Function
    }

    /// True for tables.
    #[must_use]
    pub fn is_table(&self, idx: i64) -> bool {
        self.type_of(idx) == LuaType::Table
    }

    /// True for threads.
    #[must_use]
    pub fn is_thread(&self, idx: i64) -> bool {
        self.type_of(idx) == LuaType::Thread
    }

    /// True for full or light userdata.
    #[must_use]
    pub fn is_userdata(&self, idx: i64) -> bool {
        matches!(
            self.type_of(idx),
            LuaType::Userdata | LuaType::LightUserdata
        )
    }

    /// True for nil.
    #[must_use]
    pub fn is_nil(&self, idx: i64) -> bool {
        self.type_of(idx) == LuaType::Nil
    }

    /// True for an empty index.
    #[must_use]
    pub fn is_none(&self, idx: i64) -> bool {
        self.type_of(idx) == LuaType::None
    }

    /// True for nil or an empty index.
    #[must_use]
    pub fn is_none_or_nil(&self, idx: i64) -> bool {
        matches!(self.type_of(idx), LuaType::None | LuaType::Nil)
    }

    /// Truthiness of the value at `idx`.
    #[must_use]
    pub fn to_boolean(&self, idx: i64) -> bool {
        self.get(idx).is_some_and(|v| v.is_truthy())
    }

    /// Number at `idx`, 0 if not convertible.
    #[must_use]
    pub fn to_number(&self, idx: i64) -> f64 {
        self.get(idx).and_then(|v| v.to_number()).unwrap_or(0.0)
    }

    /// Integer at `idx` (truncated), 0 if not convertible.
    #[must_use]
    pub fn to_integer(&self, idx: i64) -> i64 {
        apidemo_foundation::number::number_to_integer(self.to_number(idx))
    }

    /// String at `idx`. A number slot is converted to a string in place.
    /// Returns `None` for values with no string form.
    pub fn to_lstring(&mut self, idx: i64) -> Option<Rc<str>> {
        match self.resolve(idx) {
            Slot::Stack(abs) => {
                if let Value::Number(n) = self.stack[abs] {
                    self.stack[abs] = Value::from(number_to_string(n));
                }
                self.stack[abs].to_str()
            }
            _ => None,
        }
    }

    /// Length of the value at `idx`: bytes for strings (numbers are
    /// converted in place first), the border for tables, 0 otherwise.
    pub fn objlen(&mut self, idx: i64) -> usize {
        if self.get(idx).is_some_and(|v| matches!(v, Value::Number(_))) {
            let _ = self.to_lstring(idx);
        }
        match self.get(idx) {
            Some(Value::String(s)) => s.len(),
            Some(Value::Table(t)) => t.len(),
            _ => 0,
        }
    }
}

impl Default for LuaState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LuaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LuaState")
            .field("stack", &self.stack)
            .field("frames", &self.frames.len())
            .finish_non_exhaustive()
    }
}

pub(crate) fn to_usize(n: i64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}
