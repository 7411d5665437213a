//! Core value type for everything a simulated stack can hold.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::number::number_to_string;
use crate::table::TableRef;
use crate::types::LuaType;

/// Identity token for reference values (tables, functions, userdata, threads).
///
/// Address-like and stable for the lifetime of the value. Used for display
/// and identity comparison only, never dereferenced.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

impl ObjectId {
    /// Allocates a fresh, process-unique identity.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw token.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Core value type.
///
/// Scalars are stored inline. Tables, functions, userdata and threads are
/// reference values: cloning shares the referent and equality is identity.
#[derive(Clone, Default)]
pub enum Value {
    /// The nil value (absence).
    #[default]
    Nil,
    /// Double-precision number.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
    /// Immutable string.
    String(Rc<str>),
    /// Shared mutable table.
    Table(TableRef),
    /// Function reference.
    Function(FunctionRef),
    /// Full userdata (opaque block with an optional metatable).
    Opaque(UserdataRef),
    /// Thread reference.
    Thread(ThreadRef),
}

/// Function reference.
///
/// The body is owned by whichever runtime created the function; this layer
/// only keeps its identity and a debug name.
#[derive(Clone)]
pub struct FunctionRef {
    id: ObjectId,
    name: Option<Rc<str>>,
    body: Rc<dyn Any>,
}

impl FunctionRef {
    /// Wraps a runtime-specific function body under a fresh identity.
    #[must_use]
    pub fn new(name: Option<&str>, body: Rc<dyn Any>) -> Self {
        Self {
            id: ObjectId::fresh(),
            name: name.map(Rc::from),
            body,
        }
    }

    /// Returns the identity token.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the debug name given at creation, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the body downcast to the runtime's function type.
    #[must_use]
    pub fn body<T: 'static>(&self) -> Option<&T> {
        self.body.downcast_ref::<T>()
    }
}

/// Full userdata reference.
#[derive(Clone)]
pub struct UserdataRef {
    id: ObjectId,
    metatable: Rc<RefCell<Option<TableRef>>>,
}

impl UserdataRef {
    /// Creates a new userdata block without a metatable.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObjectId::fresh(),
            metatable: Rc::new(RefCell::new(None)),
        }
    }

    /// Returns the identity token.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the metatable, if one is set.
    #[must_use]
    pub fn metatable(&self) -> Option<TableRef> {
        self.metatable.borrow().clone()
    }

    /// Sets or clears the metatable.
    pub fn set_metatable(&self, metatable: Option<TableRef>) {
        *self.metatable.borrow_mut() = metatable;
    }
}

impl Default for UserdataRef {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread reference.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadRef {
    id: ObjectId,
}

impl ThreadRef {
    /// Creates a new thread identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObjectId::fresh(),
        }
    }

    /// Returns the identity token.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }
}

impl Default for ThreadRef {
    fn default() -> Self {
        Self::new()
    }
}

impl Value {
    /// Returns the type tag of this value.
    #[must_use]
    pub const fn lua_type(&self) -> LuaType {
        match self {
            Self::Nil => LuaType::Nil,
            Self::Number(_) => LuaType::Number,
            Self::Boolean(_) => LuaType::Boolean,
            Self::String(_) => LuaType::String,
            Self::Table(_) => LuaType::Table,
            Self::Function(_) => LuaType::Function,
            Self::Opaque(_) => LuaType::Userdata,
            Self::Thread(_) => LuaType::Thread,
        }
    }

    /// Returns the type name (`"nil"`, `"number"`, ...).
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.lua_type().name()
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true if this value is truthy.
    ///
    /// Only `nil` and `false` are falsy.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Boolean(false))
    }

    /// Attempts to extract a number, without string coercion.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference, without number coercion.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a table reference.
    #[must_use]
    pub const fn as_table(&self) -> Option<&TableRef> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Attempts to extract a function reference.
    #[must_use]
    pub const fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the identity of a reference value.
    #[must_use]
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Table(t) => Some(t.id()),
            Self::Function(f) => Some(f.id()),
            Self::Opaque(u) => Some(u.id()),
            Self::Thread(t) => Some(t.id()),
            _ => None,
        }
    }

    /// Converts to a number, coercing numeric strings.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => crate::number::str_to_number(s),
            _ => None,
        }
    }

    /// Converts to a string, coercing numbers (`%.14g`).
    #[must_use]
    pub fn to_str(&self) -> Option<Rc<str>> {
        match self {
            Self::String(s) => Some(Rc::clone(s)),
            Self::Number(n) => Some(Rc::from(number_to_string(*n))),
            _ => None,
        }
    }

    /// Primitive equality: no metamethods, reference values by identity.
    ///
    /// Numbers follow IEEE semantics, so NaN is not equal to itself.
    #[must_use]
    pub fn raw_equal(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Table(a), Self::Table(b)) => a.id() == b.id(),
            (Self::Function(a), Self::Function(b)) => a.id() == b.id(),
            (Self::Opaque(a), Self::Opaque(b)) => a.id() == b.id(),
            (Self::Thread(a), Self::Thread(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

// Structural equality for tests and snapshots: identity for reference values,
// bit equality for numbers so that Eq stays reflexive.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            _ => self.raw_equal(other),
        }
    }
}

impl Eq for Value {}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Number(n) => write!(f, "{}", number_to_string(*n)),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Table(t) => write!(f, "table:{}", t.id()),
            Self::Function(func) => match func.name() {
                Some(name) => write!(f, "function:{name}"),
                None => write!(f, "function:{}", func.id()),
            },
            Self::Opaque(u) => write!(f, "userdata:{}", u.id()),
            Self::Thread(t) => write!(f, "thread:{}", t.id()),
        }
    }
}

/// Display matches `tostring` without metamethods.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Number(n) => write!(f, "{}", number_to_string(*n)),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Table(t) => write!(f, "table: {}", t.id()),
            Self::Function(func) => write!(f, "function: {}", func.id()),
            Self::Opaque(u) => write!(f, "userdata: {}", u.id()),
            Self::Thread(t) => write!(f, "thread: {}", t.id()),
        }
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionRef({}", self.id)?;
        if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for UserdataRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserdataRef({})", self.id)
    }
}

impl fmt::Debug for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThreadRef({})", self.id)
    }
}

// Convenience From implementations

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Self::String(s)
    }
}

impl From<TableRef> for Value {
    fn from(t: TableRef) -> Self {
        Self::Table(t)
    }
}

impl From<FunctionRef> for Value {
    fn from(f: FunctionRef) -> Self {
        Self::Function(f)
    }
}
