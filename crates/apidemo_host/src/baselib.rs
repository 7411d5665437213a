//! The base library: the globals every state starts with.

use apidemo_foundation::{Error, LuaType, Result, TableRef, UserdataRef, Value};

use crate::consts::LUA_MULTRET;
use crate::function::{NativeFn, native};
use crate::state::LuaState;

const FUNCTIONS: &[(&str, NativeFn)] = &[
    ("assert", assert),
    ("error", error),
    ("getmetatable", getmetatable),
    ("newproxy", newproxy),
    ("next", next),
    ("pcall", pcall),
    ("print", print),
    ("rawequal", rawequal),
    ("rawget", rawget),
    ("rawset", rawset),
    ("select", select),
    ("setmetatable", setmetatable),
    ("tonumber", tonumber),
    ("tostring", tostring),
    ("type", type_),
    ("unpack", unpack),
];

/// Registers the base library in the globals.
pub(crate) fn open(state: &mut LuaState) {
    for (name, f) in FUNCTIONS {
        state.globals().set_str(name, native(name, *f));
    }
}

fn count(state: &LuaState) -> i64 {
    state.gettop()
}

fn print(state: &mut LuaState) -> Result<usize> {
    let mut parts = Vec::new();
    for i in 1..=count(state) {
        let value = state.value(i);
        parts.push(state.tostring_value(&value)?.to_string());
    }
    state.write_output(parts.join("\t"));
    Ok(0)
}

fn type_(state: &mut LuaState) -> Result<usize> {
    state.check_any(1)?;
    let name = state.type_name_at(1);
    state.push_string(name);
    Ok(1)
}

fn tostring(state: &mut LuaState) -> Result<usize> {
    state.check_any(1)?;
    let value = state.value(1);
    let text = state.tostring_value(&value)?;
    state.push(Value::String(text));
    Ok(1)
}

fn tonumber(state: &mut LuaState) -> Result<usize> {
    let base = state.opt_integer(2, 10)?;
    if base == 10 {
        state.check_any(1)?;
        let n = state.value(1).to_number();
        state.push(n.map_or(Value::Nil, Value::Number));
        return Ok(1);
    }

    let text = state.check_string(1)?;
    if !(2..=36).contains(&base) {
        return Err(state.arg_error(2, "base out of range"));
    }
    let radix = u32::try_from(base).unwrap_or(10);
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let parsed = u64::from_str_radix(digits, radix).ok();
    #[allow(clippy::cast_precision_loss)]
    let value = parsed.map_or(Value::Nil, |n| {
        let n = n as f64;
        Value::Number(if negative { -n } else { n })
    });
    state.push(value);
    Ok(1)
}

fn error(state: &mut LuaState) -> Result<usize> {
    let level = state.opt_integer(2, 1)?;
    let payload = state.value(1);
    if let (Some(message), Ok(level @ 1..)) = (payload.to_str(), usize::try_from(level)) {
        let positioned = format!("{}{message}", state.location(level));
        return Err(Error::runtime(positioned));
    }
    Err(Error::runtime(payload))
}

fn assert(state: &mut LuaState) -> Result<usize> {
    state.check_any(1)?;
    if !state.to_boolean(1) {
        let message = state.opt_string(2, "assertion failed!")?;
        return Err(state.aux_error(message));
    }
    Ok(usize::try_from(count(state)).unwrap_or(0))
}

fn pcall(state: &mut LuaState) -> Result<usize> {
    state.check_any(1)?;
    let status = state.pcall(count(state) - 1, LUA_MULTRET, 0)?;
    state.push_boolean(status == 0);
    state.insert(1)?;
    Ok(usize::try_from(count(state)).unwrap_or(0))
}

fn select(state: &mut LuaState) -> Result<usize> {
    let n = count(state);
    if state.value(1).as_str() == Some("#") {
        state.push_integer(n - 1);
        return Ok(1);
    }
    let mut i = state.check_integer(1)?;
    if i < 0 {
        i += n;
    } else if i > n {
        i = n;
    }
    if i < 1 {
        return Err(state.arg_error(1, "index out of range"));
    }
    Ok(usize::try_from(n - i).unwrap_or(0))
}

fn next(state: &mut LuaState) -> Result<usize> {
    state.check_type(1, LuaType::Table)?;
    state.settop(2)?;
    if state.next(1)? {
        Ok(2)
    } else {
        state.push_nil();
        Ok(1)
    }
}

fn rawequal(state: &mut LuaState) -> Result<usize> {
    state.check_any(1)?;
    state.check_any(2)?;
    let equal = state.raw_equal(1, 2);
    state.push_boolean(equal);
    Ok(1)
}

fn rawget(state: &mut LuaState) -> Result<usize> {
    state.check_type(1, LuaType::Table)?;
    state.check_any(2)?;
    state.settop(2)?;
    state.raw_get(1)?;
    Ok(1)
}

fn rawset(state: &mut LuaState) -> Result<usize> {
    state.check_type(1, LuaType::Table)?;
    state.check_any(2)?;
    state.check_any(3)?;
    state.settop(3)?;
    state.raw_set(1)?;
    Ok(1)
}

fn setmetatable(state: &mut LuaState) -> Result<usize> {
    state.check_type(1, LuaType::Table)?;
    if !matches!(state.type_of(2), LuaType::Nil | LuaType::Table) {
        return Err(state.arg_type_error(2, "nil or table"));
    }
    if state.get_metafield(1, "__metatable") {
        return Err(state.aux_error("cannot change a protected metatable"));
    }
    state.settop(2)?;
    state.set_metatable(1)?;
    Ok(1)
}

fn getmetatable(state: &mut LuaState) -> Result<usize> {
    state.check_any(1)?;
    if !state.get_metatable(1) {
        state.push_nil();
        return Ok(1);
    }
    // A `__metatable` field hides the real metatable.
    state.get_metafield(1, "__metatable");
    Ok(1)
}

fn unpack(state: &mut LuaState) -> Result<usize> {
    state.check_type(1, LuaType::Table)?;
    let table = state.table_at(1)?;
    let first = state.opt_integer(2, 1)?;
    let last = if state.is_none_or_nil(3) {
        i64::try_from(table.len()).unwrap_or(i64::MAX)
    } else {
        state.check_integer(3)?
    };
    if first > last {
        return Ok(0);
    }
    let n = last.checked_sub(first).and_then(|d| d.checked_add(1));
    if !n.is_some_and(|n| n > 0 && state.checkstack(n)) {
        return Err(state.aux_error("too many results to unpack"));
    }
    for i in first..=last {
        state.push(table.get_int(i));
    }
    Ok(usize::try_from(n.unwrap_or(0)).unwrap_or(0))
}

fn newproxy(state: &mut LuaState) -> Result<usize> {
    state.settop(1)?;
    let proxy = UserdataRef::new();
    match state.value(1) {
        Value::Boolean(false) | Value::Nil => {}
        Value::Boolean(true) => proxy.set_metatable(Some(TableRef::new())),
        Value::Opaque(other) if other.metatable().is_some() => {
            proxy.set_metatable(other.metatable());
        }
        _ => return Err(state.arg_error(1, "boolean or proxy expected")),
    }
    state.push(Value::Opaque(proxy));
    Ok(1)
}
