//! Table access, metatables, and globals.

use apidemo_foundation::{Error, LuaType, Result, TableRef, Value};

use crate::consts::LUA_GLOBALSINDEX;
use crate::state::LuaState;

/// Maximum length of an `__index` / `__newindex` chain.
const MAXTAGLOOP: usize = 100;

impl LuaState {
    // =========================================================================
    // Metatables
    // =========================================================================

    /// Returns the metatable governing `value`.
    ///
    /// Tables and userdata carry their own; every other type shares one
    /// metatable per type.
    #[must_use]
    pub fn metatable_of(&self, value: &Value) -> Option<TableRef> {
        match value {
            Value::Table(t) => t.metatable(),
            Value::Opaque(u) => u.metatable(),
            other => type_slot(other.lua_type())
                .and_then(|i| self.type_metatables[i].clone()),
        }
    }

    /// Raw lookup of `event` in the metatable of `value`; nil if absent.
    #[must_use]
    pub fn metafield(&self, value: &Value, event: &str) -> Value {
        self.metatable_of(value)
            .map(|mt| mt.get_str(event))
            .unwrap_or_default()
    }

    fn install_metatable(&mut self, value: &Value, mt: Option<TableRef>) {
        match value {
            Value::Table(t) => t.set_metatable(mt),
            Value::Opaque(u) => u.set_metatable(mt),
            other => {
                if let Some(i) = type_slot(other.lua_type()) {
                    self.type_metatables[i] = mt;
                }
            }
        }
    }

    /// Pushes the metatable of the value at `idx` and returns true, or
    /// pushes nothing and returns false.
    pub fn get_metatable(&mut self, idx: i64) -> bool {
        match self.get(idx).and_then(|v| self.metatable_of(&v)) {
            Some(mt) => {
                self.push(Value::Table(mt));
                true
            }
            None => false,
        }
    }

    /// Pops a table (or nil) and makes it the metatable of the value at
    /// `idx`. Always returns true.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty, `idx` is empty, or the popped
    /// value is neither a table nor nil.
    pub fn set_metatable(&mut self, idx: i64) -> Result<bool> {
        self.require_values(1)?;
        let target = self
            .get(idx)
            .ok_or_else(|| Error::runtime(format!("invalid stack index {idx}")))?;
        let mt = match self.pop_value() {
            Value::Table(t) => Some(t),
            Value::Nil => None,
            other => {
                return Err(Error::runtime(format!(
                    "table expected, got {}",
                    other.type_name()
                )));
            }
        };
        self.install_metatable(&target, mt);
        Ok(true)
    }

    // =========================================================================
    // Indexing with metamethods
    // =========================================================================

    /// Error for an operation applied to a value of the wrong type.
    #[must_use]
    pub fn type_error(&self, op: &str, value: &Value) -> Error {
        self.runtime_error(format!("attempt to {op} a {} value", value.type_name()))
    }

    /// `obj[key]`, following `__index` tables and functions.
    ///
    /// # Errors
    ///
    /// Returns an error if `obj` cannot be indexed or a handler fails.
    pub fn index_value(&mut self, obj: &Value, key: &Value) -> Result<Value> {
        let mut current = obj.clone();
        for _ in 0..MAXTAGLOOP {
            let handler = if let Value::Table(t) = &current {
                let raw = t.get(key);
                if !raw.is_nil() {
                    return Ok(raw);
                }
                let handler = self.metafield(&current, "__index");
                if handler.is_nil() {
                    return Ok(Value::Nil);
                }
                handler
            } else {
                let handler = self.metafield(&current, "__index");
                if handler.is_nil() {
                    return Err(self.type_error("index", &current));
                }
                handler
            };

            if matches!(handler, Value::Function(_)) {
                let results = self.call_value(handler, vec![current, key.clone()])?;
                return Ok(results.into_iter().next().unwrap_or_default());
            }
            current = handler;
        }
        Err(self.runtime_error("loop in gettable"))
    }

    /// `obj[key] = value`, following `__newindex` tables and functions.
    ///
    /// # Errors
    ///
    /// Returns an error if `obj` cannot be indexed, the key is nil or NaN,
    /// or a handler fails.
    pub fn set_index(&mut self, obj: &Value, key: Value, value: Value) -> Result<()> {
        let mut current = obj.clone();
        for _ in 0..MAXTAGLOOP {
            let handler = if let Value::Table(t) = &current {
                let handler = if t.get(&key).is_nil() {
                    self.metafield(&current, "__newindex")
                } else {
                    Value::Nil
                };
                if handler.is_nil() {
                    return self.raw_store(t, key, value);
                }
                handler
            } else {
                let handler = self.metafield(&current, "__newindex");
                if handler.is_nil() {
                    return Err(self.type_error("index", &current));
                }
                handler
            };

            if matches!(handler, Value::Function(_)) {
                self.call_value(handler, vec![current, key, value])?;
                return Ok(());
            }
            current = handler;
        }
        Err(self.runtime_error("loop in settable"))
    }

    fn raw_store(&self, table: &TableRef, key: Value, value: Value) -> Result<()> {
        table
            .set(key, value)
            .map_err(|e| self.runtime_error(e.to_string()))
    }

    pub(crate) fn table_at(&self, idx: i64) -> Result<TableRef> {
        match self.get(idx) {
            Some(Value::Table(t)) => Ok(t),
            other => Err(Error::runtime(format!(
                "table expected, got {}",
                other.map_or(LuaType::None, |v| v.lua_type())
            ))),
        }
    }

    // =========================================================================
    // Table primitives
    // =========================================================================

    /// Pushes a new empty table.
    pub fn new_table(&mut self) {
        self.push(Value::Table(TableRef::new()));
    }

    /// Pushes a new empty table. The size hints are accepted and ignored.
    pub fn create_table(&mut self, _narr: i64, _nrec: i64) {
        self.new_table();
    }

    /// Pops a key and pushes `t[key]` for the value `t` at `idx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty or indexing fails.
    pub fn get_table(&mut self, idx: i64) -> Result<()> {
        self.require_values(1)?;
        let target = self.value(idx);
        let key = self.pop_value();
        let value = self.index_value(&target, &key)?;
        self.push(value);
        Ok(())
    }

    /// Pushes `t[k]` for the value `t` at `idx`.
    ///
    /// # Errors
    ///
    /// Returns an error if indexing fails.
    pub fn get_field(&mut self, idx: i64, k: &str) -> Result<()> {
        let target = self.value(idx);
        let value = self.index_value(&target, &Value::from(k))?;
        self.push(value);
        Ok(())
    }

    /// Pops a value and a key and performs `t[key] = value` for the value
    /// `t` at `idx`.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two values are on the stack or the
    /// assignment fails.
    pub fn set_table(&mut self, idx: i64) -> Result<()> {
        self.require_values(2)?;
        let target = self.value(idx);
        let value = self.pop_value();
        let key = self.pop_value();
        self.set_index(&target, key, value)
    }

    /// Pops a value and performs `t[k] = value` for the value `t` at `idx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty or the assignment fails.
    pub fn set_field(&mut self, idx: i64, k: &str) -> Result<()> {
        self.require_values(1)?;
        let target = self.value(idx);
        let value = self.pop_value();
        self.set_index(&target, Value::from(k), value)
    }

    /// Like [`get_table`](Self::get_table) without metamethods.
    ///
    /// # Errors
    ///
    /// Returns an error if the value at `idx` is not a table.
    pub fn raw_get(&mut self, idx: i64) -> Result<()> {
        self.require_values(1)?;
        let table = self.table_at(idx)?;
        let key = self.pop_value();
        self.push(table.get(&key));
        Ok(())
    }

    /// Pushes `t[n]` without metamethods.
    ///
    /// # Errors
    ///
    /// Returns an error if the value at `idx` is not a table.
    pub fn raw_geti(&mut self, idx: i64, n: i64) -> Result<()> {
        let table = self.table_at(idx)?;
        self.push(table.get_int(n));
        Ok(())
    }

    /// Like [`set_table`](Self::set_table) without metamethods.
    ///
    /// # Errors
    ///
    /// Returns an error if the value at `idx` is not a table or the key is
    /// nil or NaN.
    pub fn raw_set(&mut self, idx: i64) -> Result<()> {
        self.require_values(2)?;
        let table = self.table_at(idx)?;
        let value = self.pop_value();
        let key = self.pop_value();
        self.raw_store(&table, key, value)
    }

    /// Pops a value and stores it at `t[n]` without metamethods.
    ///
    /// # Errors
    ///
    /// Returns an error if the value at `idx` is not a table.
    pub fn raw_seti(&mut self, idx: i64, n: i64) -> Result<()> {
        self.require_values(1)?;
        let table = self.table_at(idx)?;
        let value = self.pop_value();
        table.set_int(n, value);
        Ok(())
    }

    /// Pops a key and pushes the next key/value pair of the table at `idx`.
    ///
    /// Returns false, pushing nothing, when the traversal is over.
    ///
    /// # Errors
    ///
    /// Returns an error if the value at `idx` is not a table or the key is
    /// not in it.
    pub fn next(&mut self, idx: i64) -> Result<bool> {
        self.require_values(1)?;
        let table = self.table_at(idx)?;
        let key = self.pop_value();
        match table.next(&key).map_err(|e| self.runtime_error(e.to_string()))? {
            Some((k, v)) => {
                self.push(k);
                self.push(v);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // =========================================================================
    // Globals
    // =========================================================================

    /// Pushes the global `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if a `__index` handler on the globals fails.
    pub fn get_global(&mut self, name: &str) -> Result<()> {
        self.get_field(LUA_GLOBALSINDEX, name)
    }

    /// Pops a value into the global `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack is empty or a `__newindex` handler on
    /// the globals fails.
    pub fn set_global(&mut self, name: &str) -> Result<()> {
        self.set_field(LUA_GLOBALSINDEX, name)
    }
}

fn type_slot(t: LuaType) -> Option<usize> {
    usize::try_from(t.code()).ok()
}
