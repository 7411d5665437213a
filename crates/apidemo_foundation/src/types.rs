//! Type codes and names as the embedding API reports them.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type tag of a stack slot.
///
/// The discriminants match the numeric codes returned by `lua_type`
/// (`LUA_TNIL` through `LUA_TTHREAD`). An empty slot is reported as
/// [`LuaType::None`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LuaType {
    /// No value at the index (`LUA_TNONE`).
    None,
    /// The nil type.
    Nil,
    /// Booleans.
    Boolean,
    /// Light userdata. Never produced by this runtime, kept for the code table.
    LightUserdata,
    /// Double-precision numbers.
    Number,
    /// Strings.
    String,
    /// Tables.
    Table,
    /// Functions.
    Function,
    /// Full userdata.
    Userdata,
    /// Threads (coroutines).
    Thread,
}

/// `LUA_TNONE`
pub const LUA_TNONE: i64 = -1;
/// `LUA_TNIL`
pub const LUA_TNIL: i64 = 0;
/// `LUA_TBOOLEAN`
pub const LUA_TBOOLEAN: i64 = 1;
/// `LUA_TLIGHTUSERDATA`
pub const LUA_TLIGHTUSERDATA: i64 = 2;
/// `LUA_TNUMBER`
pub const LUA_TNUMBER: i64 = 3;
/// `LUA_TSTRING`
pub const LUA_TSTRING: i64 = 4;
/// `LUA_TTABLE`
pub const LUA_TTABLE: i64 = 5;
/// `LUA_TFUNCTION`
pub const LUA_TFUNCTION: i64 = 6;
/// `LUA_TUSERDATA`
pub const LUA_TUSERDATA: i64 = 7;
/// `LUA_TTHREAD`
pub const LUA_TTHREAD: i64 = 8;

impl LuaType {
    /// Every type in code order, `None` first.
    pub const ALL: [LuaType; 10] = [
        Self::None,
        Self::Nil,
        Self::Boolean,
        Self::LightUserdata,
        Self::Number,
        Self::String,
        Self::Table,
        Self::Function,
        Self::Userdata,
        Self::Thread,
    ];

    /// Returns the numeric type code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::None => LUA_TNONE,
            Self::Nil => LUA_TNIL,
            Self::Boolean => LUA_TBOOLEAN,
            Self::LightUserdata => LUA_TLIGHTUSERDATA,
            Self::Number => LUA_TNUMBER,
            Self::String => LUA_TSTRING,
            Self::Table => LUA_TTABLE,
            Self::Function => LUA_TFUNCTION,
            Self::Userdata => LUA_TUSERDATA,
            Self::Thread => LUA_TTHREAD,
        }
    }

    /// Looks up a type by its numeric code.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Returns the type name used in messages and by `lua_typename`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "no value",
            Self::Nil => "nil",
            Self::Boolean => "boolean",
            Self::LightUserdata | Self::Userdata => "userdata",
            Self::Number => "number",
            Self::String => "string",
            Self::Table => "table",
            Self::Function => "function",
            Self::Thread => "thread",
        }
    }
}

impl fmt::Display for LuaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
