//! Named constants of the embedding API.

pub use apidemo_foundation::types::{
    LUA_TBOOLEAN, LUA_TFUNCTION, LUA_TLIGHTUSERDATA, LUA_TNIL, LUA_TNONE, LUA_TNUMBER,
    LUA_TSTRING, LUA_TTABLE, LUA_TTHREAD, LUA_TUSERDATA,
};

/// The null pointer, as scripts see it.
pub const NULL: i64 = 0;

/// Pseudo-index of the registry table.
pub const LUA_REGISTRYINDEX: i64 = -10000;
/// Pseudo-index of the running function's environment (the globals here).
pub const LUA_ENVIRONINDEX: i64 = -10001;
/// Pseudo-index of the globals table.
pub const LUA_GLOBALSINDEX: i64 = -10002;

/// Result count meaning "all results".
pub const LUA_MULTRET: i64 = -1;

/// Status: success.
pub const LUA_OK: i64 = 0;
/// Status: runtime error.
pub const LUA_ERRRUN: i64 = 2;
/// Status: syntax error while loading a chunk.
pub const LUA_ERRSYNTAX: i64 = 3;
/// Status: memory allocation failure.
pub const LUA_ERRMEM: i64 = 4;
/// Status: error while running the message handler.
pub const LUA_ERRERR: i64 = 5;
/// Status: a chunk file could not be opened or read.
pub const LUA_ERRFILE: i64 = 6;

/// Reference returned by `luaL_ref` for a nil value.
pub const LUA_REFNIL: i64 = -1;
/// Reference value that is never returned by `luaL_ref`.
pub const LUA_NOREF: i64 = -2;

/// Maximum number of stack slots `lua_checkstack` will grant.
pub const LUAI_MAXCSTACK: usize = 8000;
/// Maximum nesting of calls before "C stack overflow".
pub const LUAI_MAXCCALLS: usize = 200;
/// Size of a chunk identifier used in messages.
pub const LUA_IDSIZE: usize = 60;

/// Every named constant, for command parsers and help output.
pub const NAMED_CONSTANTS: &[(&str, i64)] = &[
    ("NULL", NULL),
    ("LUA_TNONE", LUA_TNONE),
    ("LUA_TNIL", LUA_TNIL),
    ("LUA_TBOOLEAN", LUA_TBOOLEAN),
    ("LUA_TLIGHTUSERDATA", LUA_TLIGHTUSERDATA),
    ("LUA_TNUMBER", LUA_TNUMBER),
    ("LUA_TSTRING", LUA_TSTRING),
    ("LUA_TTABLE", LUA_TTABLE),
    ("LUA_TFUNCTION", LUA_TFUNCTION),
    ("LUA_TUSERDATA", LUA_TUSERDATA),
    ("LUA_TTHREAD", LUA_TTHREAD),
    ("LUA_ERRRUN", LUA_ERRRUN),
    ("LUA_ERRSYNTAX", LUA_ERRSYNTAX),
    ("LUA_ERRMEM", LUA_ERRMEM),
    ("LUA_ERRERR", LUA_ERRERR),
    ("LUA_ERRFILE", LUA_ERRFILE),
    ("LUA_REGISTRYINDEX", LUA_REGISTRYINDEX),
    ("LUA_ENVIRONINDEX", LUA_ENVIRONINDEX),
    ("LUA_GLOBALSINDEX", LUA_GLOBALSINDEX),
    ("LUA_MULTRET", LUA_MULTRET),
];

/// Looks up a named constant.
#[must_use]
pub fn named_constant(name: &str) -> Option<i64> {
    NAMED_CONSTANTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
}
