//! The auxiliary library: argument checking, metatable registry helpers,
//! references, and chunk loading.
//!
//! Argument numbers refer to slots of the current frame. When no function
//! is running (calls made directly through the embedding API) the function
//! name in messages is `?`.

use std::rc::Rc;

use apidemo_foundation::{Error, LuaType, Result, TableRef, Value};
use tracing::debug;

use crate::chunk;
use crate::consts::{LUA_ERRFILE, LUA_ERRSYNTAX, LUA_MULTRET, LUA_OK, LUA_REFNIL};
use crate::function::chunk_function;
use crate::state::LuaState;

impl LuaState {
    // =========================================================================
    // Errors
    // =========================================================================

    /// `luaL_error`: a runtime error prefixed with the caller's position.
    #[must_use]
    pub fn aux_error(&self, message: impl AsRef<str>) -> Error {
        Error::runtime(format!("{}{}", self.location(1), message.as_ref()))
    }

    /// `luaL_argerror`: `bad argument #narg to 'fname' (extramsg)`.
    #[must_use]
    pub fn arg_error(&self, narg: i64, extramsg: &str) -> Error {
        let name = self
            .frames
            .last()
            .and_then(|f| f.name.clone())
            .unwrap_or_else(|| Rc::from("?"));
        self.aux_error(format!("bad argument #{narg} to '{name}' ({extramsg})"))
    }

    /// `luaL_typerror`: `<tname> expected, got <actual>`.
    #[must_use]
    pub fn arg_type_error(&self, narg: i64, tname: &str) -> Error {
        let message = format!("{tname} expected, got {}", self.type_name_at(narg));
        self.arg_error(narg, &message)
    }

    /// `luaL_typename`: type name of the value at `idx`.
    #[must_use]
    pub fn type_name_at(&self, idx: i64) -> &'static str {
        self.type_of(idx).name()
    }

    // =========================================================================
    // Argument checks
    // =========================================================================

    /// Fails unless there is an argument (possibly nil) at `narg`.
    ///
    /// # Errors
    ///
    /// Returns `value expected` for an empty index.
    pub fn check_any(&self, narg: i64) -> Result<()> {
        if self.type_of(narg) == LuaType::None {
            Err(self.arg_error(narg, "value expected"))
        } else {
            Ok(())
        }
    }

    /// Fails unless the argument has type `t`.
    ///
    /// # Errors
    ///
    /// Returns a type error naming the expected and actual types.
    pub fn check_type(&self, narg: i64, t: LuaType) -> Result<()> {
        if self.type_of(narg) == t {
            Ok(())
        } else {
            Err(self.arg_type_error(narg, t.name()))
        }
    }

    /// Checks that the argument is a number and returns it truncated.
    ///
    /// # Errors
    ///
    /// Returns `number expected` for non-numeric arguments.
    pub fn check_integer(&self, narg: i64) -> Result<i64> {
        let n = self.to_integer(narg);
        if n == 0 && !self.is_number(narg) {
            return Err(self.arg_type_error(narg, "number"));
        }
        Ok(n)
    }

    /// Checks that the argument is a number.
    ///
    /// # Errors
    ///
    /// Returns `number expected` for non-numeric arguments.
    pub fn check_number(&self, narg: i64) -> Result<f64> {
        let n = self.to_number(narg);
        if n == 0.0 && !self.is_number(narg) {
            return Err(self.arg_type_error(narg, "number"));
        }
        Ok(n)
    }

    /// Checks that the argument is a string (or number, converted in place).
    ///
    /// # Errors
    ///
    /// Returns `string expected` otherwise.
    pub fn check_string(&mut self, narg: i64) -> Result<Rc<str>> {
        self.to_lstring(narg)
            .ok_or_else(|| self.arg_type_error(narg, "string"))
    }

    /// Like [`check_integer`](Self::check_integer), but `default` for nil or
    /// absent arguments.
    ///
    /// # Errors
    ///
    /// Returns `number expected` for other non-numeric arguments.
    pub fn opt_integer(&self, narg: i64, default: i64) -> Result<i64> {
        if self.is_none_or_nil(narg) {
            Ok(default)
        } else {
            self.check_integer(narg)
        }
    }

    /// Like [`check_number`](Self::check_number), with a default.
    ///
    /// # Errors
    ///
    /// Returns `number expected` for other non-numeric arguments.
    pub fn opt_number(&self, narg: i64, default: f64) -> Result<f64> {
        if self.is_none_or_nil(narg) {
            Ok(default)
        } else {
            self.check_number(narg)
        }
    }

    /// Like [`check_string`](Self::check_string), with a default.
    ///
    /// # Errors
    ///
    /// Returns `string expected` for other non-string arguments.
    pub fn opt_string(&mut self, narg: i64, default: &str) -> Result<Rc<str>> {
        if self.is_none_or_nil(narg) {
            Ok(Rc::from(default))
        } else {
            self.check_string(narg)
        }
    }

    // =========================================================================
    // Metatables
    // =========================================================================

    /// Pushes field `event` of the metatable of the value at `obj` and
    /// returns true; pushes nothing and returns false if there is none.
    pub fn get_metafield(&mut self, obj: i64, event: &str) -> bool {
        let field = self
            .get(obj)
            .map(|v| self.metafield(&v, event))
            .unwrap_or_default();
        if field.is_nil() {
            false
        } else {
            self.push(field);
            true
        }
    }

    /// Calls metamethod `event` of the value at `obj` with that value as
    /// its only argument, pushing one result. Returns false, pushing
    /// nothing, when there is no such metamethod.
    ///
    /// # Errors
    ///
    /// Returns an error if the metamethod fails.
    pub fn call_meta(&mut self, obj: i64, event: &str) -> Result<bool> {
        let obj = self.abs_index(obj);
        if !self.get_metafield(obj, event) {
            return Ok(false);
        }
        self.pushvalue(obj);
        self.call(1, 1)?;
        Ok(true)
    }

    /// Creates registry entry `tname` holding a new table and pushes it,
    /// returning true. If the entry exists, pushes it and returns false.
    pub fn new_metatable(&mut self, tname: &str) -> bool {
        let existing = self.registry.get_str(tname);
        if !existing.is_nil() {
            self.push(existing);
            return false;
        }
        let mt = TableRef::new();
        self.registry.set_str(tname, Value::Table(mt.clone()));
        self.push(Value::Table(mt));
        true
    }

    /// Pushes registry entry `tname` (nil if absent).
    pub fn get_named_metatable(&mut self, tname: &str) {
        let mt = self.registry.get_str(tname);
        self.push(mt);
    }

    // =========================================================================
    // References
    // =========================================================================

    /// `luaL_ref`: pops the top value, stores it in the table at `t` under a
    /// fresh integer key, and returns the key. Nil is not stored and yields
    /// `LUA_REFNIL`.
    ///
    /// Freed keys are kept in a list headed at `t[0]` and reused first.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty or `t` is not a table.
    pub fn reference(&mut self, t: i64) -> Result<i64> {
        self.require_values(1)?;
        let table = self.table_at(t)?;
        let value = self.pop_value();
        if value.is_nil() {
            return Ok(LUA_REFNIL);
        }
        let free = table.get_int(0).as_number().map_or(0, |n| {
            apidemo_foundation::number::number_to_integer(n)
        });
        let key = if free > 0 {
            table.set_int(0, table.get_int(free));
            free
        } else {
            i64::try_from(table.len()).unwrap_or(i64::MAX) + 1
        };
        table.set_int(key, value);
        Ok(key)
    }

    /// `luaL_unref`: releases `key` in the table at `t` for reuse.
    ///
    /// # Errors
    ///
    /// Returns an error if `t` is not a table.
    pub fn unreference(&mut self, t: i64, key: i64) -> Result<()> {
        if key < 0 {
            return Ok(());
        }
        let table = self.table_at(t)?;
        table.set_int(key, table.get_int(0));
        table.set_int(0, Value::from(key));
        Ok(())
    }

    // =========================================================================
    // Chunks
    // =========================================================================

    /// Compiles `source` and pushes the resulting function, or pushes the
    /// error message. Returns 0 or `LUA_ERRSYNTAX`.
    pub fn load_buffer(&mut self, source: &str, chunkname: &str) -> i64 {
        match chunk::compile(source, chunkname) {
            Ok(compiled) => {
                self.push(chunk_function(Rc::new(compiled)));
                LUA_OK
            }
            Err(err) => {
                debug!(error = %err, "chunk failed to compile");
                self.push(err.payload());
                LUA_ERRSYNTAX
            }
        }
    }

    /// `luaL_loadstring`: the chunk name is the source itself.
    pub fn load_string(&mut self, source: &str) -> i64 {
        self.load_buffer(source, source)
    }

    /// `luaL_loadfile`: compiles a file. A file that cannot be read pushes
    /// `cannot open <path>` and returns `LUA_ERRFILE`.
    pub fn load_file(&mut self, path: &str) -> i64 {
        match std::fs::read_to_string(path) {
            Ok(source) => {
                // A leading `#` line is skipped, keeping the line count.
                let source = if source.starts_with('#') {
                    source.find('\n').map_or_else(String::new, |i| source[i..].to_string())
                } else {
                    source
                };
                self.load_buffer(&source, &format!("@{path}"))
            }
            Err(err) => {
                self.push_string(&format!("cannot open {path}: {err}"));
                LUA_ERRFILE
            }
        }
    }

    /// `luaL_dostring`: load then run in protected mode. Returns 0 on
    /// success and 1 on any failure, with the message on the stack.
    ///
    /// # Errors
    ///
    /// Returns an error only for stack misuse inside the protected call.
    pub fn do_string(&mut self, source: &str) -> Result<i64> {
        if self.load_string(source) != LUA_OK {
            return Ok(1);
        }
        Ok(i64::from(self.pcall(0, LUA_MULTRET, 0)? != LUA_OK))
    }

    /// `luaL_dofile`: like [`do_string`](Self::do_string) for a file.
    ///
    /// # Errors
    ///
    /// Returns an error only for stack misuse inside the protected call.
    pub fn do_file(&mut self, path: &str) -> Result<i64> {
        if self.load_file(path) != LUA_OK {
            return Ok(1);
        }
        Ok(i64::from(self.pcall(0, LUA_MULTRET, 0)? != LUA_OK))
    }

    /// Compiles and runs `source`, returning its results. Errors propagate.
    ///
    /// # Errors
    ///
    /// Returns syntax errors and errors raised while running.
    pub fn run_string(&mut self, source: &str) -> Result<Vec<Value>> {
        let compiled = chunk::compile(source, source)?;
        self.call_value(chunk_function(Rc::new(compiled)), Vec::new())
    }
}
