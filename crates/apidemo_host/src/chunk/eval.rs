//! Tree-walking evaluation of chunks.

use std::rc::Rc;

use apidemo_foundation::{Result, TableRef, Value};

use super::ast::{Call, Chunk, Expr, Field, Stat, Target};
use crate::state::LuaState;

/// Runs `chunk` in the current frame and pushes its return values.
///
/// Returns how many values were pushed.
pub(crate) fn execute(state: &mut LuaState, chunk: &Chunk) -> Result<usize> {
    for stat in &chunk.body {
        match stat {
            Stat::Assign {
                target,
                value,
                line,
            } => {
                mark_line(state, chunk, *line);
                assign(state, target, value)?;
            }
            Stat::Call(call) => {
                mark_line(state, chunk, call.line);
                invoke(state, call)?;
            }
        }
    }

    let Some(ret) = &chunk.ret else {
        return Ok(0);
    };
    mark_line(state, chunk, ret.line);
    let values = eval_list(state, &ret.values)?;
    let count = values.len();
    for value in values {
        state.push(value);
    }
    Ok(count)
}

fn mark_line(state: &mut LuaState, chunk: &Chunk, line: usize) {
    if let Some(frame) = state.frames.last_mut() {
        frame.location = Some(format!("{}:{line}: ", chunk.name));
    }
}

fn eval_list(state: &mut LuaState, exprs: &[Expr]) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(exprs.len());
    for (i, expr) in exprs.iter().enumerate() {
        match expr {
            Expr::Call(call) if i + 1 == exprs.len() => values.extend(invoke(state, call)?),
            _ => values.push(eval(state, expr)?),
        }
    }
    Ok(values)
}

fn eval(state: &mut LuaState, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Nil => Ok(Value::Nil),
        Expr::Boolean(b) => Ok(Value::Boolean(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::String(s) => Ok(Value::String(Rc::clone(s))),
        Expr::Table(fields) => construct(state, fields),
        Expr::Call(call) => Ok(invoke(state, call)?.into_iter().next().unwrap_or_default()),
        Expr::Target(target) => read(state, target, target.path.len()),
    }
}

fn construct(state: &mut LuaState, fields: &[Field]) -> Result<Value> {
    let table = TableRef::new();
    let mut position: i64 = 1;
    for (i, field) in fields.iter().enumerate() {
        match field {
            Field::Keyed(key, value) => {
                let key = eval(state, key)?;
                let value = eval(state, value)?;
                table
                    .set(key, value)
                    .map_err(|e| state.runtime_error(e.to_string()))?;
            }
            Field::Positional(Expr::Call(call)) if i + 1 == fields.len() => {
                for value in invoke(state, call)? {
                    table.set_int(position, value);
                    position += 1;
                }
            }
            Field::Positional(expr) => {
                let value = eval(state, expr)?;
                table.set_int(position, value);
                position += 1;
            }
        }
    }
    Ok(Value::Table(table))
}

/// Describes the variable holding the value reached after `depth` steps of
/// `target`, for error messages.
fn describe(target: &Target, depth: usize) -> Option<String> {
    if depth == 0 {
        return Some(format!("global '{}'", target.name));
    }
    match &target.path[depth - 1] {
        Expr::String(field) => Some(format!("field '{field}'")),
        _ => None,
    }
}

fn variable_error(state: &LuaState, op: &str, value: &Value, what: Option<String>) -> apidemo_foundation::Error {
    match what {
        Some(what) => state.runtime_error(format!(
            "attempt to {op} {what} (a {} value)",
            value.type_name()
        )),
        None => state.type_error(op, value),
    }
}

/// Reads `target` through the first `depth` path steps.
fn read(state: &mut LuaState, target: &Target, depth: usize) -> Result<Value> {
    let globals = Value::Table(state.globals().clone());
    let mut value = state.index_value(&globals, &Value::String(Rc::clone(&target.name)))?;
    for (step, key) in target.path[..depth].iter().enumerate() {
        let key = eval(state, key)?;
        ensure_indexable(state, &value, target, step)?;
        value = state.index_value(&value, &key)?;
    }
    Ok(value)
}

fn ensure_indexable(state: &LuaState, value: &Value, target: &Target, depth: usize) -> Result<()> {
    if matches!(value, Value::Table(_)) || !state.metafield(value, "__index").is_nil() {
        Ok(())
    } else {
        Err(variable_error(state, "index", value, describe(target, depth)))
    }
}

fn assign(state: &mut LuaState, target: &Target, expr: &Expr) -> Result<()> {
    let Some((last, prefix)) = target.path.split_last() else {
        let value = eval(state, expr)?;
        let globals = Value::Table(state.globals().clone());
        return state.set_index(&globals, Value::String(Rc::clone(&target.name)), value);
    };

    let object = read(state, target, prefix.len())?;
    let key = eval(state, last)?;
    let value = eval(state, expr)?;
    if !matches!(object, Value::Table(_)) && state.metafield(&object, "__newindex").is_nil() {
        return Err(variable_error(
            state,
            "index",
            &object,
            describe(target, prefix.len()),
        ));
    }
    state.set_index(&object, key, value)
}

fn invoke(state: &mut LuaState, call: &Call) -> Result<Vec<Value>> {
    let function = read(state, &call.callee, call.callee.path.len())?;
    let args = eval_list(state, &call.args)?;
    if !matches!(function, Value::Function(_)) && state.metafield(&function, "__call").is_nil() {
        return Err(variable_error(
            state,
            "call",
            &function,
            describe(&call.callee, call.callee.path.len()),
        ));
    }
    state.call_value(function, args)
}
