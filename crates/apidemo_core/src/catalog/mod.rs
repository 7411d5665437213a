//! The operation catalog.
//!
//! Each entry describes one embedding-API primitive: the shapes of its
//! arguments after the leading machine handle, the shape of its result, and
//! the function that performs it against the live surface. The dispatcher
//! reads nothing but this data, so adding an operation is one line in
//! [`DESCRIPTORS`].

mod calls;
mod stack;
mod tables;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use apidemo_foundation::{Error, Result, Value};
use apidemo_host::LuaState;

// =============================================================================
// Shapes
// =============================================================================

/// Shape of a declared argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgShape {
    /// A C `int`, converted from a number by truncation.
    Int,
    /// A `lua_Number`.
    Number,
    /// A C string. Numbers are accepted and converted.
    Str,
}

impl ArgShape {
    /// Returns the type name used in argument errors.
    #[must_use]
    pub const fn expected(self) -> &'static str {
        match self {
            Self::Int | Self::Number => "number",
            Self::Str => "string",
        }
    }

    /// Returns the C type shown in signatures.
    #[must_use]
    pub const fn c_type(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Number => "l_N",
            Self::Str => "str",
        }
    }
}

/// Shape of an operation's result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutShape {
    /// Nothing is returned.
    None,
    /// An integer (booleans are 0 or 1).
    Int,
    /// A number.
    Number,
    /// A string, or the number 0 for a null pointer.
    Str,
}

/// Help section an operation is listed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Pushing new values.
    Push,
    /// Moving and counting stack slots.
    Stack,
    /// Inspecting and converting stack values.
    Read,
    /// Tables, metatables, and globals.
    Table,
    /// Comparison and concatenation.
    Operator,
    /// Calling functions.
    Call,
    /// Raising and checking.
    Error,
    /// Loading and running chunks.
    Load,
}

impl Category {
    /// Every category in help order.
    pub const ALL: [Category; 8] = [
        Self::Push,
        Self::Stack,
        Self::Read,
        Self::Table,
        Self::Operator,
        Self::Call,
        Self::Error,
        Self::Load,
    ];

    /// Returns the section heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Push => "writing values to the stack",
            Self::Stack => "stack manipulation",
            Self::Read => "reading values from the stack",
            Self::Table => "table operations",
            Self::Operator => "basic operators",
            Self::Call => "function calls",
            Self::Error => "error handling",
            Self::Load => "running Lua code",
        }
    }
}

// =============================================================================
// Arguments and Results
// =============================================================================

/// A validated argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// An `int` argument.
    Int(i64),
    /// A number argument.
    Number(f64),
    /// A string argument.
    Str(Rc<str>),
}

/// The validated arguments of one call, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args(Vec<Arg>);

impl Args {
    /// Wraps already validated arguments.
    #[must_use]
    pub fn new(args: Vec<Arg>) -> Self {
        Self(args)
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns argument `i` as an `int`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the argument is missing or not an `int`.
    pub fn int(&self, i: usize) -> Result<i64> {
        match self.0.get(i) {
            Some(Arg::Int(n)) => Ok(*n),
            other => Err(mismatch(i, "int", other)),
        }
    }

    /// Returns argument `i` as a number.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the argument is missing or not a number.
    pub fn number(&self, i: usize) -> Result<f64> {
        match self.0.get(i) {
            Some(Arg::Number(n)) => Ok(*n),
            other => Err(mismatch(i, "number", other)),
        }
    }

    /// Returns argument `i` as a string.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the argument is missing or not a string.
    pub fn str(&self, i: usize) -> Result<&str> {
        match self.0.get(i) {
            Some(Arg::Str(s)) => Ok(s),
            other => Err(mismatch(i, "string", other)),
        }
    }
}

fn mismatch(i: usize, wanted: &str, found: Option<&Arg>) -> Error {
    Error::internal(format!("argument {i} should be {wanted}, found {found:?}"))
}

/// What a primitive produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Ret {
    /// No result.
    None,
    /// An integer result.
    Int(i64),
    /// A number result.
    Number(f64),
    /// A string result; `None` stands for a null pointer.
    Str(Option<Rc<str>>),
}

impl Ret {
    /// Wraps a C truth value.
    #[must_use]
    pub fn flag(b: bool) -> Self {
        Self::Int(i64::from(b))
    }

    /// Wraps a length.
    #[must_use]
    pub fn size(n: usize) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }

    /// Converts to the value handed back to the caller.
    ///
    /// A null string becomes the number 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Int(n) => Some(Value::Number(n as f64)),
            Self::Number(n) => Some(Value::Number(n)),
            Self::Str(Some(s)) => Some(Value::String(s)),
            Self::Str(None) => Some(Value::Number(0.0)),
        }
    }
}

// =============================================================================
// Descriptors
// =============================================================================

/// Performs an operation against the live surface.
pub type Primitive = fn(&mut LuaState, &Args) -> Result<Ret>;

/// One catalog entry.
#[derive(Clone, Copy)]
pub struct Descriptor {
    /// Operation name, as in the C API.
    pub name: &'static str,
    /// Argument shapes after the handle.
    pub inputs: &'static [ArgShape],
    /// Result shape.
    pub output: OutShape,
    /// Whether a failure is rendered and saved with its payload left out.
    pub error_propagating: bool,
    /// Help section.
    pub category: Category,
    /// C prototype, for help.
    pub signature: &'static str,
    /// Stack effect annotation, `[-pop +push X]`.
    pub effect: &'static str,
    /// One-line description.
    pub summary: &'static str,
    /// The implementation.
    pub primitive: Primitive,
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .field("error_propagating", &self.error_propagating)
            .finish_non_exhaustive()
    }
}

macro_rules! shape {
    (i) => {
        ArgShape::Int
    };
    (n) => {
        ArgShape::Number
    };
    (s) => {
        ArgShape::Str
    };
}

macro_rules! out {
    (-) => {
        OutShape::None
    };
    (i) => {
        OutShape::Int
    };
    (n) => {
        OutShape::Number
    };
    (s) => {
        OutShape::Str
    };
}

/// `op!(name, (inputs) -> output, Category, signature, effect, summary, primitive)`
macro_rules! op {
    ($name:literal, ($($input:tt)*) -> $output:tt, $category:ident,
     $signature:literal, $effect:literal, $summary:literal, $primitive:path) => {
        Descriptor {
            name: $name,
            inputs: &[$(shape!($input)),*],
            output: out!($output),
            error_propagating: false,
            category: Category::$category,
            signature: $signature,
            effect: $effect,
            summary: $summary,
            primitive: $primitive,
        }
    };
}

/// Every operation, alphabetized within each section.
pub static DESCRIPTORS: &[Descriptor] = &[
    // Push
    op!("lua_pushboolean", (i) -> -, Push, "lua_pushboolean(L, int b)", "[-0 +1 -]", "push b != 0", stack::push_boolean),
    op!("lua_pushinteger", (i) -> -, Push, "lua_pushinteger(L, l_I n)", "[-0 +1 -]", "push n", stack::push_integer),
    op!("lua_pushlstring", (s i) -> -, Push, "lua_pushlstring(L, str s, szt len)", "[-0 +1 m]", "push first len bytes of s", stack::push_lstring),
    op!("lua_pushnil", () -> -, Push, "lua_pushnil(L)", "[-0 +1 -]", "push nil", stack::push_nil),
    op!("lua_pushnumber", (n) -> -, Push, "lua_pushnumber(L, l_N n)", "[-0 +1 -]", "push n", stack::push_number),
    op!("lua_pushstring", (s) -> -, Push, "lua_pushstring(L, str s)", "[-0 +1 m]", "push a copy of s", stack::push_string),
    op!("lua_pushthread", () -> i, Push, "int lua_pushthread(L)", "[-0 +1 -]", "push L; 1 if main thread", stack::push_thread),
    // Stack
    op!("lua_checkstack", (i) -> i, Stack, "int lua_checkstack(L, int n)", "[-0 +0 m]", "ensure stack capacity", stack::checkstack),
    op!("lua_gettop", () -> i, Stack, "int lua_gettop(L)", "[-0 +0 -]", "get stack size", stack::gettop),
    op!("lua_insert", (i) -> -, Stack, "lua_insert(L, int i)", "[-1 +1 -]", "mv top -> i", stack::insert),
    op!("lua_pop", (i) -> -, Stack, "lua_pop(L, int n)", "[-n +0 -]", "pop n values", stack::pop),
    op!("lua_pushvalue", (i) -> -, Stack, "lua_pushvalue(L, int i)", "[-0 +1 -]", "cp i -> top", stack::pushvalue),
    op!("lua_remove", (i) -> -, Stack, "lua_remove(L, int i)", "[-1 +0 -]", "rm i", stack::remove),
    op!("lua_replace", (i) -> -, Stack, "lua_replace(L, int i)", "[-1 +0 -]", "rm i, mv top -> i", stack::replace),
    op!("lua_settop", (i) -> -, Stack, "lua_settop(L, int i)", "[-? +? -]", "set stack size", stack::settop),
    // Read
    op!("lua_isboolean", (i) -> i, Read, "int lua_isboolean(L, int i)", "[-0 +0 -]", "is stk[i] a bool?", stack::is_boolean),
    op!("lua_isfunction", (i) -> i, Read, "int lua_isfunction(L, int i)", "[-0 +0 -]", "is stk[i] a fn?", stack::is_function),
    op!("lua_isnil", (i) -> i, Read, "int lua_isnil(L, int i)", "[-0 +0 -]", "is stk[i] nil?", stack::is_nil),
    op!("lua_isnone", (i) -> i, Read, "int lua_isnone(L, int i)", "[-0 +0 -]", "nothing at stk[i]?", stack::is_none),
    op!("lua_isnoneornil", (i) -> i, Read, "int lua_isnoneornil(L, int i)", "[-0 +0 -]", "none or nil at stk[i]?", stack::is_none_or_nil),
    op!("lua_isnumber", (i) -> i, Read, "int lua_isnumber(L, int i)", "[-0 +0 -]", "is stk[i] a number?", stack::is_number),
    op!("lua_isstring", (i) -> i, Read, "int lua_isstring(L, int i)", "[-0 +0 -]", "is stk[i] a string?", stack::is_string),
    op!("lua_istable", (i) -> i, Read, "int lua_istable(L, int i)", "[-0 +0 -]", "is stk[i] a table?", stack::is_table),
    op!("lua_isthread", (i) -> i, Read, "int lua_isthread(L, int i)", "[-0 +0 -]", "is stk[i] a thread?", stack::is_thread),
    op!("lua_isuserdata", (i) -> i, Read, "int lua_isuserdata(L, int i)", "[-0 +0 -]", "is stk[i] a udata?", stack::is_userdata),
    op!("lua_toboolean", (i) -> i, Read, "int lua_toboolean(L, int i)", "[-0 +0 -]", "bool(stk[i])", stack::to_boolean),
    op!("lua_tointeger", (i) -> i, Read, "l_I lua_tointeger(L, int i)", "[-0 +0 -]", "l_I(stk[i])", stack::to_integer),
    op!("lua_tolstring", (i) -> s, Read, "str lua_tolstring(L, int i, szt *len)", "[-0 +0 m]", "str(stk[i]); converts in place", stack::to_string),
    op!("lua_tonumber", (i) -> n, Read, "l_N lua_tonumber(L, int i)", "[-0 +0 -]", "l_N(stk[i])", stack::to_number),
    op!("lua_tostring", (i) -> s, Read, "str lua_tostring(L, int i)", "[-0 +0 m]", "str(stk[i]); converts in place", stack::to_string),
    op!("lua_type", (i) -> i, Read, "int lua_type(L, int i)", "[-0 +0 -]", "LUA_T{NIL,TABLE,etc}", stack::type_code),
    op!("lua_typename", (i) -> s, Read, "str lua_typename(L, int tp)", "[-0 +0 -]", "LUA_T{NIL,etc} -> name", stack::typename),
    op!("luaL_optint", (i i) -> i, Read, "int luaL_optint(L, int n, int d)", "[-0 +0 v]", "int(stk[n]) or d", stack::opt_integer),
    op!("luaL_optinteger", (i i) -> i, Read, "l_I luaL_optinteger(L, int n, l_I d)", "[-0 +0 v]", "l_I(stk[n]) or d", stack::opt_integer),
    op!("luaL_optnumber", (i n) -> n, Read, "l_N luaL_optnumber(L, int n, l_N d)", "[-0 +0 v]", "l_N(stk[n]) or d", stack::opt_number),
    op!("luaL_optstring", (i s) -> s, Read, "str luaL_optstring(L, int n, str d)", "[-0 +0 v]", "str(stk[n]) or d", stack::opt_string),
    op!("luaL_typename", (i) -> s, Read, "str luaL_typename(L, int i)", "[-0 +0 -]", "typename(stk[i])", stack::type_name_at),
    // Table
    op!("lua_createtable", (i i) -> -, Table, "lua_createtable(L, int m, int n)", "[-0 +1 m]", "m,n=arr,rec capacity", tables::create_table),
    op!("lua_getfield", (i s) -> -, Table, "lua_getfield(L, int i, str k)", "[-0 +1 e]", "push stk[i][k]", tables::get_field),
    op!("lua_getglobal", (s) -> -, Table, "lua_getglobal(L, str name)", "[-0 +1 e]", "push _G[name]", tables::get_global),
    op!("lua_getmetatable", (i) -> i, Table, "int lua_getmetatable(L, int i)", "[-0 +0|1 -]", "push mt(stk[i]) if any", tables::get_metatable),
    op!("lua_gettable", (i) -> -, Table, "lua_gettable(L, int i)", "[-1 +1 e]", "pop k; push stk[i][k]", tables::get_table),
    op!("lua_newtable", () -> -, Table, "lua_newtable(L)", "[-0 +1 m]", "push {}", tables::new_table),
    op!("lua_next", (i) -> i, Table, "int lua_next(L, int i)", "[-1 +0|2 e]", "pop k; push k,v if any", tables::next),
    op!("lua_objlen", (i) -> i, Table, "szt lua_objlen(L, int i)", "[-0 +0 -]", "#stk[i], assuming seq", tables::objlen),
    op!("lua_rawget", (i) -> -, Table, "lua_rawget(L, int i)", "[-1 +1 -]", "gettable, no metacalls", tables::raw_get),
    op!("lua_rawgeti", (i i) -> -, Table, "lua_rawgeti(L, int i, int n)", "[-0 +1 -]", "push stk[i][n]; no mt", tables::raw_geti),
    op!("lua_rawlen", (i) -> i, Table, "szt lua_rawlen(L, int i)", "[-0 +0 -]", "#stk[i], assuming seq", tables::objlen),
    op!("lua_rawset", (i) -> -, Table, "lua_rawset(L, int i)", "[-2 +0 m]", "settable, no metacalls", tables::raw_set),
    op!("lua_rawseti", (i i) -> -, Table, "lua_rawseti(L, int i, int n)", "[-1 +0 m]", "stk[i][n]=pop'd; no mt", tables::raw_seti),
    op!("lua_setfield", (i s) -> -, Table, "lua_setfield(L, int i, str k)", "[-1 +0 e]", "pop v; stk[i][k]=v", tables::set_field),
    op!("lua_setglobal", (s) -> -, Table, "lua_setglobal(L, str name)", "[-1 +0 e]", "pop v; _G[name]=v", tables::set_global),
    op!("lua_setmetatable", (i) -> i, Table, "int lua_setmetatable(L, int i)", "[-1 +0 -]", "pop mt; mt(stk[i])=mt", tables::set_metatable),
    op!("lua_settable", (i) -> -, Table, "lua_settable(L, int i)", "[-2 +0 e]", "pop k,v; stk[i][k]=v", tables::set_table),
    op!("luaL_getmetafield", (i s) -> i, Table, "int luaL_getmetafield(L, int i, str e)", "[-0 +0|1 m]", "push mt(stk[i])[e] if any", tables::get_metafield),
    op!("luaL_getmetatable", (s) -> -, Table, "luaL_getmetatable(L, str tname)", "[-0 +1 -]", "push registry[tname]", tables::get_named_metatable),
    op!("luaL_newmetatable", (s) -> i, Table, "int luaL_newmetatable(L, str tname)", "[-0 +1 m]", "registry[tname] = {}", tables::new_metatable),
    // Operator
    op!("lua_concat", (i) -> -, Operator, "lua_concat(L, int n)", "[-n +1 e]", "str cat top n vals", calls::concat),
    op!("lua_equal", (i i) -> i, Operator, "int lua_equal(L, int i, int j)", "[-0 +0 e]", "1 if stk[i] == stk[j]", calls::equal),
    op!("lua_lessthan", (i i) -> i, Operator, "int lua_lessthan(L, int i, int j)", "[-0 +0 e]", "1 if stk[i] < stk[j]", calls::less_than),
    op!("lua_rawequal", (i i) -> i, Operator, "int lua_rawequal(L, int i, int j)", "[-0 +0 -]", "equal? no metacalls", calls::raw_equal),
    // Call
    op!("lua_call", (i i) -> -, Call, "lua_call(L, int m, int n)", "[-(m+1) +n e]", "call f(m args); +n", calls::call),
    op!("lua_pcall", (i i i) -> i, Call, "int lua_pcall(L, int m, int n, int e)", "[-(m+1) +n|1 -]", "call w/ errfn=stk[e]", calls::pcall),
    op!("luaL_callmeta", (i s) -> i, Call, "int luaL_callmeta(L, int o, str e)", "[-0 +0|1 e]", "mt(stk[o])[e](stk[o])", calls::call_meta),
    // Error
    Descriptor {
        name: "lua_error",
        inputs: &[],
        output: OutShape::None,
        error_propagating: true,
        category: Category::Error,
        signature: "int lua_error(L)",
        effect: "[-1 +0 v]",
        summary: "pop errmsg; throw it",
        primitive: calls::error,
    },
    op!("luaL_argerror", (i s) -> i, Error, "int luaL_argerror(L, int n, str msg)", "[-0 +0 v]", "throw bad argument #n", calls::arg_error),
    op!("luaL_checkany", (i) -> -, Error, "luaL_checkany(L, int n)", "[-0 +0 v]", "err if stk[n] is none", calls::check_any),
    op!("luaL_checkint", (i) -> i, Error, "int luaL_checkint(L, int n)", "[-0 +0 v]", "int(stk[n]) or err", calls::check_integer),
    op!("luaL_checkinteger", (i) -> i, Error, "l_I luaL_checkinteger(L, int n)", "[-0 +0 v]", "l_I(stk[n]) or err", calls::check_integer),
    op!("luaL_checknumber", (i) -> n, Error, "l_N luaL_checknumber(L, int n)", "[-0 +0 v]", "l_N(stk[n]) or err", calls::check_number),
    op!("luaL_checkstring", (i) -> s, Error, "str luaL_checkstring(L, int n)", "[-0 +0 v]", "str(stk[n]) or err", calls::check_string),
    op!("luaL_checktype", (i i) -> -, Error, "luaL_checktype(L, int n, int tp)", "[-0 +0 v]", "err if tp(stk[n]) != tp", calls::check_type),
    op!("luaL_error", (s) -> -, Error, "int luaL_error(L, str msg)", "[-0 +0 v]", "throw where..msg", calls::aux_error),
    // Load
    op!("luaL_dofile", (s) -> i, Load, "int luaL_dofile(L, str filename)", "[-0 +? m]", "load and run file", calls::do_file),
    op!("luaL_dostring", (s) -> i, Load, "int luaL_dostring(L, str code)", "[-0 +? m]", "load and run code", calls::do_string),
    op!("luaL_loadfile", (s) -> i, Load, "int luaL_loadfile(L, str filename)", "[-0 +1 m]", "load file; push as fn", calls::load_file),
    op!("luaL_loadstring", (s) -> i, Load, "int luaL_loadstring(L, str code)", "[-0 +1 m]", "load code; push as fn", calls::load_string),
];

// =============================================================================
// Catalog
// =============================================================================

/// Name-indexed view of [`DESCRIPTORS`].
#[derive(Clone, Debug)]
pub struct Catalog {
    by_name: BTreeMap<&'static str, &'static Descriptor>,
}

impl Catalog {
    /// Builds the catalog of every standard operation.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            by_name: DESCRIPTORS.iter().map(|d| (d.name, d)).collect(),
        }
    }

    /// Looks up an operation.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static Descriptor> {
        self.by_name.get(name).copied()
    }

    /// Looks up an operation, failing with `UnknownOperation`.
    ///
    /// # Errors
    ///
    /// Returns an error if no operation has this name.
    pub fn lookup(&self, name: &str) -> Result<&'static Descriptor> {
        self.get(name).ok_or_else(|| Error::unknown_operation(name))
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Returns every operation name, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_name.keys().copied()
    }

    /// Returns the operations of `category` in listing order.
    #[must_use]
    pub fn in_category(&self, category: Category) -> Vec<&'static Descriptor> {
        DESCRIPTORS
            .iter()
            .filter(|d| d.category == category && self.by_name.contains_key(d.name))
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
