//! The small chunk language accepted by `luaL_loadstring` and friends.
//!
//! ```text
//! chunk  := { stat [';'] } [ 'return' [explist] [';'] ]
//! stat   := target '=' exp | call
//! target := Name { '.' Name | '[' exp ']' }
//! exp    := nil | true | false | Number | String | '-' Number | table | call | target
//! table  := '{' [ field { (',' | ';') field } [',' | ';'] ] '}'
//! field  := '[' exp ']' '=' exp | Name '=' exp | exp
//! call   := target '(' [explist] ')'
//! ```
//!
//! Every name is a global. There are no locals, operators, or control flow.

mod ast;
mod eval;
mod lexer;
mod parser;

pub use ast::{Call, Chunk, Expr, Field, Return, Stat, Target};
pub use lexer::{Lexer, Token, TokenKind, is_identifier, is_reserved};
pub use parser::Parser;

pub(crate) use eval::execute;

use apidemo_foundation::Result;

use crate::consts::LUA_IDSIZE;

/// Compiles `source`. `chunkname` follows the usual convention: `@file`
/// for files, `=name` for a literal name, anything else is the source text.
///
/// # Errors
///
/// Returns a syntax error.
pub fn compile(source: &str, chunkname: &str) -> Result<Chunk> {
    Parser::new(source, &chunk_id(chunkname)).parse_chunk()
}

/// Converts a chunk name into the form used in messages.
///
/// `@file` becomes `file` (keeping its tail if too long), `=name` becomes
/// `name`, and source text becomes `[string "first line..."]`.
#[must_use]
pub fn chunk_id(chunkname: &str) -> String {
    let budget = LUA_IDSIZE - 1;
    if let Some(name) = chunkname.strip_prefix('=') {
        return truncate(name, budget).to_string();
    }
    if let Some(file) = chunkname.strip_prefix('@') {
        if file.len() <= budget {
            return file.to_string();
        }
        let keep = budget - 3;
        let mut start = file.len() - keep;
        while !file.is_char_boundary(start) {
            start += 1;
        }
        return format!("...{}", &file[start..]);
    }

    let budget = LUA_IDSIZE - " [string \"...\"] ".len() - 1;
    let first_line = chunkname.split('\n').next().unwrap_or_default();
    let shown = truncate(first_line, budget);
    if shown.len() < chunkname.len() {
        format!("[string \"{shown}...\"]")
    } else {
        format!("[string \"{shown}\"]")
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
