//! Integration tests for calls and operators
//!
//! Tests plain and protected calls, lua_error, concatenation, and comparison.

use apidemo_foundation::{Result, Value};
use apidemo_host::consts::{LUA_ERRERR, LUA_ERRRUN, LUA_MULTRET, LUA_OK};
use apidemo_host::{LuaState, native};

fn add_one(state: &mut LuaState) -> Result<usize> {
    let n = state.check_number(1)?;
    state.push_number(n + 1.0);
    Ok(1)
}

fn fail(state: &mut LuaState) -> Result<usize> {
    Err(state.aux_error("native failure"))
}

#[test]
fn call_replaces_function_and_arguments() {
    let mut state = LuaState::new();
    state.push_string("below");
    state.push(native("add_one", add_one));
    state.push_integer(41);
    state.call(1, 1).unwrap();
    assert_eq!(state.values(), &[Value::from("below"), Value::from(42)]);
}

#[test]
fn call_adjusts_result_count() {
    let mut state = LuaState::new();
    state.get_global("select").unwrap();
    state.push_integer(1);
    state.push_string("a");
    state.push_string("b");
    state.call(3, LUA_MULTRET).unwrap();
    assert_eq!(state.gettop(), 2);

    state.settop(0).unwrap();
    state.push(native("add_one", add_one));
    state.push_integer(1);
    state.call(1, 3).unwrap();
    assert_eq!(state.values(), &[Value::from(2), Value::Nil, Value::Nil]);
}

#[test]
fn failed_call_removes_function_and_arguments() {
    let mut state = LuaState::new();
    state.push_string("kept");
    state.push_integer(5);
    state.push_integer(6);
    let err = state.call(1, 0).unwrap_err();
    assert_eq!(err.to_string(), "attempt to call a number value");
    assert_eq!(state.values(), &[Value::from("kept")]);
}

#[test]
fn argument_errors_name_the_native_function() {
    let mut state = LuaState::new();
    state.push(native("add_one", add_one));
    state.push_string("x");
    let err = state.call(1, 1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad argument #1 to 'add_one' (number expected, got string)"
    );
}

#[test]
fn pcall_catches_and_reports_status() {
    let mut state = LuaState::new();
    state.push(native("fail", fail));
    let status = state.pcall(0, 0, 0).unwrap();
    assert_eq!(status, LUA_ERRRUN);
    assert_eq!(state.values(), &[Value::from("native failure")]);

    state.settop(0).unwrap();
    state.push(native("add_one", add_one));
    state.push_integer(1);
    assert_eq!(state.pcall(1, 1, 0).unwrap(), LUA_OK);
    assert_eq!(state.values(), &[Value::from(2)]);
}

#[test]
fn pcall_runs_the_message_handler() {
    let mut state = LuaState::new();
    state.get_global("tostring").unwrap();
    state.push(native("fail", fail));
    assert_eq!(state.pcall(0, 0, 1).unwrap(), LUA_ERRRUN);
    assert_eq!(state.value(-1), Value::from("native failure"));

    state.settop(0).unwrap();
    state.push(native("fail", fail));
    state.push(native("fail", fail));
    assert_eq!(state.pcall(0, 0, 1).unwrap(), LUA_ERRERR);
    assert_eq!(state.value(-1), Value::from("error in error handling"));
}

#[test]
fn error_raises_the_top_value() {
    let mut state = LuaState::new();
    state.push_string("payload");
    let err = state.error();
    assert_eq!(err.payload(), Value::from("payload"));
    assert_eq!(state.gettop(), 1);
}

#[test]
fn concat_joins_strings_and_numbers() {
    let mut state = LuaState::new();
    state.push_string("n = ");
    state.push_integer(3);
    state.push_string("!");
    state.concat(3).unwrap();
    assert_eq!(state.values(), &[Value::from("n = 3!")]);

    state.concat(0).unwrap();
    assert_eq!(state.value(-1), Value::from(""));

    state.push_boolean(true);
    let err = state.concat(2).unwrap_err();
    assert_eq!(err.to_string(), "attempt to concatenate a boolean value");
}

#[test]
fn comparisons() {
    let mut state = LuaState::new();
    state.push_integer(1);
    state.push_integer(2);
    state.push_string("a");
    state.push_string("b");
    assert!(state.less_than(1, 2).unwrap());
    assert!(!state.less_than(2, 1).unwrap());
    assert!(state.less_than(3, 4).unwrap());
    assert!(!state.raw_equal(1, 2));
    assert!(state.equal(3, 3).unwrap());
    assert!(!state.equal(1, 99).unwrap());

    let err = state.less_than(1, 3).unwrap_err();
    assert_eq!(err.to_string(), "attempt to compare number with string");
}

#[test]
fn eq_metamethod_applies_to_tables() {
    let mut state = LuaState::new();
    state
        .run_string("mt = {__eq = rawequal} a = setmetatable({}, mt) b = setmetatable({}, mt)")
        .unwrap();
    state.get_global("a").unwrap();
    state.get_global("b").unwrap();
    // rawequal says the two tables differ, so __eq reports false.
    assert!(!state.equal(1, 2).unwrap());
    state.pushvalue(1);
    assert!(state.equal(1, 3).unwrap());
}
