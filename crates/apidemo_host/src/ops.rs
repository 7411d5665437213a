//! Calls, protected calls, and the operators with metamethod fallbacks.

use std::rc::Rc;

use apidemo_foundation::{Error, Result, Value};
use tracing::{debug, trace};

use crate::consts::{LUA_ERRERR, LUA_ERRRUN, LUA_MULTRET, LUA_OK, LUAI_MAXCCALLS, LUAI_MAXCSTACK};
use crate::function::Callable;
use crate::state::{Frame, LuaState, to_usize};

impl LuaState {
    // =========================================================================
    // Calls
    // =========================================================================

    /// Calls the function below the top `nargs` values.
    ///
    /// The function and its arguments are replaced by its results, adjusted
    /// to `nresults` unless that is `LUA_MULTRET`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not callable or the call raises. The
    /// function and its arguments are removed from the stack either way.
    /// A result count that cannot fit on the stack is rejected before the
    /// call and leaves the stack unchanged.
    pub fn call(&mut self, nargs: i64, nresults: i64) -> Result<()> {
        let func_slot = self.function_slot(nargs)?;
        self.check_results(func_slot, nresults)?;
        self.call_at(func_slot, nresults)
    }

    /// Calls `f` with `args` and returns every result.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is not callable or the call raises.
    pub fn call_value(&mut self, f: Value, args: Vec<Value>) -> Result<Vec<Value>> {
        let func_slot = self.stack.len();
        self.push(f);
        self.stack.extend(args);
        self.call_at(func_slot, LUA_MULTRET)?;
        Ok(self.stack.drain(func_slot..).collect())
    }

    fn function_slot(&self, nargs: i64) -> Result<usize> {
        if nargs < 0 {
            return Err(Error::runtime(format!("invalid argument count {nargs}")));
        }
        let needed = to_usize(nargs).saturating_add(1);
        self.require_values(needed)?;
        Ok(self.stack.len() - needed)
    }

    fn check_results(&self, func_slot: usize, nresults: i64) -> Result<()> {
        if nresults < 0 {
            return Ok(());
        }
        let used = func_slot.saturating_sub(self.base()).saturating_add(to_usize(nresults));
        if used > LUAI_MAXCSTACK {
            return Err(Error::runtime("stack overflow"));
        }
        Ok(())
    }

    pub(crate) fn call_at(&mut self, func_slot: usize, nresults: i64) -> Result<()> {
        if self.frames.len() >= LUAI_MAXCCALLS {
            self.stack.truncate(func_slot);
            return Err(self.runtime_error("C stack overflow"));
        }

        let function = match &self.stack[func_slot] {
            Value::Function(f) => f.clone(),
            other => {
                let handler = self.metafield(other, "__call");
                if !matches!(handler, Value::Function(_)) {
                    let err = self.type_error("call", other);
                    self.stack.truncate(func_slot);
                    return Err(err);
                }
                self.stack.insert(func_slot, handler);
                return self.call_at(func_slot, nresults);
            }
        };

        let depth = self.frames.len();
        self.frames.push(Frame {
            base: func_slot + 1,
            name: function.name().map(Rc::from),
            location: None,
        });
        trace!(function = ?function, depth, "call");

        let outcome = match function.body::<Callable>() {
            Some(Callable::Native(f)) => {
                let f = *f;
                f(self)
            }
            Some(Callable::Chunk(chunk)) => {
                let chunk = Rc::clone(chunk);
                crate::chunk::execute(self, &chunk)
            }
            None => Err(Error::runtime("attempt to call a foreign function")),
        };
        self.frames.truncate(depth);

        match outcome {
            Ok(n) => {
                let top = self.stack.len();
                let n = n.min(top.saturating_sub(func_slot + 1));
                self.stack.drain(func_slot..top - n);
                if nresults >= 0 {
                    self.stack.resize(func_slot + to_usize(nresults), Value::Nil);
                }
                Ok(())
            }
            Err(err) => {
                self.stack.truncate(func_slot);
                Err(err)
            }
        }
    }

    /// Calls in protected mode and returns a status code.
    ///
    /// On success the results are on the stack and the status is `0`. On
    /// failure the function and arguments are replaced by the error value
    /// and the status is `LUA_ERRRUN`. With a message handler (`errfunc`
    /// other than 0) the handler's result replaces the error value; if the
    /// handler itself fails the status is `LUA_ERRERR`.
    ///
    /// # Errors
    ///
    /// Returns an error only for misuse: too few values on the stack, a
    /// result count that cannot fit on the stack, or an empty handler index.
    pub fn pcall(&mut self, nargs: i64, nresults: i64, errfunc: i64) -> Result<i64> {
        let handler = if errfunc == 0 {
            None
        } else {
            Some(
                self.get(errfunc)
                    .ok_or_else(|| Error::runtime(format!("invalid stack index {errfunc}")))?,
            )
        };
        let func_slot = self.function_slot(nargs)?;
        self.check_results(func_slot, nresults)?;
        let depth = self.frames.len();

        match self.call_at(func_slot, nresults) {
            Ok(()) => Ok(LUA_OK),
            Err(err) => {
                self.frames.truncate(depth);
                self.stack.truncate(func_slot);
                debug!(error = %err, "protected call caught error");

                let (status, payload) = match handler {
                    None => (LUA_ERRRUN, err.payload()),
                    Some(h) => match self.call_value(h, vec![err.payload()]) {
                        Ok(results) => (LUA_ERRRUN, results.into_iter().next().unwrap_or_default()),
                        Err(_) => (LUA_ERRERR, Value::from("error in error handling")),
                    },
                };
                self.push(payload);
                Ok(status)
            }
        }
    }

    /// Returns the error `lua_error` raises: the value on top of the stack.
    ///
    /// The value stays on the stack.
    #[must_use]
    pub fn error(&self) -> Error {
        Error::runtime(self.value(-1))
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// Concatenates the top `n` values, leaving the result on top.
    ///
    /// `n = 0` pushes the empty string and `n = 1` leaves the stack as is.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be concatenated and no `__concat`
    /// handler applies. The stack is unchanged on error.
    pub fn concat(&mut self, n: i64) -> Result<()> {
        if n < 0 {
            return Err(Error::runtime(format!("invalid argument count {n}")));
        }
        let n = to_usize(n);
        self.require_values(n)?;
        match n {
            0 => self.push_string(""),
            1 => {}
            _ => {
                let first = self.stack.len() - n;
                let values: Vec<Value> = self.stack[first..].to_vec();
                let mut acc = values[n - 1].clone();
                for value in values[..n - 1].iter().rev() {
                    acc = self.concat_values(value.clone(), acc)?;
                }
                self.stack.truncate(first);
                self.push(acc);
            }
        }
        Ok(())
    }

    pub(crate) fn concat_values(&mut self, a: Value, b: Value) -> Result<Value> {
        if let (Some(x), Some(y)) = (concat_text(&a), concat_text(&b)) {
            return Ok(Value::from(format!("{x}{y}")));
        }
        let mut handler = self.metafield(&a, "__concat");
        if handler.is_nil() {
            handler = self.metafield(&b, "__concat");
        }
        if handler.is_nil() {
            let culprit = if concat_text(&a).is_some() { &b } else { &a };
            return Err(self.type_error("concatenate", culprit));
        }
        let results = self.call_value(handler, vec![a, b])?;
        Ok(results.into_iter().next().unwrap_or_default())
    }

    /// Primitive equality of two indices; false if either is empty.
    #[must_use]
    pub fn raw_equal(&self, i1: i64, i2: i64) -> bool {
        match (self.get(i1), self.get(i2)) {
            (Some(a), Some(b)) => a.raw_equal(&b),
            _ => false,
        }
    }

    /// Equality with the `__eq` metamethod; false if either index is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the metamethod fails.
    pub fn equal(&mut self, i1: i64, i2: i64) -> Result<bool> {
        let (Some(a), Some(b)) = (self.get(i1), self.get(i2)) else {
            return Ok(false);
        };
        if a.raw_equal(&b) {
            return Ok(true);
        }
        let comparable = matches!(
            (&a, &b),
            (Value::Table(_), Value::Table(_)) | (Value::Opaque(_), Value::Opaque(_))
        );
        if !comparable {
            return Ok(false);
        }
        match self.shared_metamethod(&a, &b, "__eq") {
            Some(handler) => self.call_predicate(handler, a, b),
            None => Ok(false),
        }
    }

    /// `a < b` for the values at two indices; false if either is empty.
    ///
    /// Numbers compare numerically and strings bytewise; other values
    /// need a shared `__lt` metamethod.
    ///
    /// # Errors
    ///
    /// Returns an error for values that cannot be compared or a failing
    /// metamethod.
    pub fn less_than(&mut self, i1: i64, i2: i64) -> Result<bool> {
        let (Some(a), Some(b)) = (self.get(i1), self.get(i2)) else {
            return Ok(false);
        };
        match (&a, &b) {
            (Value::Number(x), Value::Number(y)) => return Ok(x < y),
            (Value::String(x), Value::String(y)) => return Ok(x.as_bytes() < y.as_bytes()),
            _ => {}
        }
        if a.lua_type() == b.lua_type() {
            if let Some(handler) = self.shared_metamethod(&a, &b, "__lt") {
                return self.call_predicate(handler, a, b);
            }
        }
        let message = if a.lua_type() == b.lua_type() {
            format!("attempt to compare two {} values", a.type_name())
        } else {
            format!("attempt to compare {} with {}", a.type_name(), b.type_name())
        };
        Err(self.runtime_error(message))
    }

    fn shared_metamethod(&self, a: &Value, b: &Value, event: &str) -> Option<Value> {
        let first = self.metafield(a, event);
        if first.is_nil() {
            return None;
        }
        let second = self.metafield(b, event);
        first.raw_equal(&second).then_some(first)
    }

    fn call_predicate(&mut self, handler: Value, a: Value, b: Value) -> Result<bool> {
        let results = self.call_value(handler, vec![a, b])?;
        Ok(results.first().is_some_and(Value::is_truthy))
    }

    /// `tostring` semantics: the `__tostring` metamethod if present,
    /// otherwise the default rendering (`%.14g` for numbers, `table: 0x...`
    /// for reference values).
    ///
    /// # Errors
    ///
    /// Returns an error if the metamethod fails.
    pub fn tostring_value(&mut self, value: &Value) -> Result<Rc<str>> {
        let handler = self.metafield(value, "__tostring");
        if handler.is_nil() {
            return Ok(value
                .to_str()
                .unwrap_or_else(|| Rc::from(value.to_string())));
        }
        let result = self
            .call_value(handler, vec![value.clone()])?
            .into_iter()
            .next()
            .unwrap_or_default();
        result
            .to_str()
            .ok_or_else(|| self.runtime_error("'__tostring' must return a string"))
    }
}

fn concat_text(value: &Value) -> Option<Rc<str>> {
    match value {
        Value::String(_) | Value::Number(_) => value.to_str(),
        _ => None,
    }
}
