//! Integration tests for stack manipulation
//!
//! Tests index resolution, top adjustment, and in-place conversions.

use apidemo_foundation::{LuaType, Value};
use apidemo_host::LuaState;
use apidemo_host::consts::{LUA_GLOBALSINDEX, LUA_REGISTRYINDEX};

fn state_with(values: &[Value]) -> LuaState {
    let mut state = LuaState::new();
    for v in values {
        state.push(v.clone());
    }
    state
}

#[test]
fn positive_and_negative_indices_meet() {
    let state = state_with(&[Value::from(1), Value::from(2), Value::from(3)]);
    assert_eq!(state.value(1), state.value(-3));
    assert_eq!(state.value(3), state.value(-1));
    assert!(state.is_none(4));
    assert!(state.is_none(-4));
    assert_eq!(state.abs_index(-1), 3);
    assert_eq!(state.abs_index(LUA_REGISTRYINDEX), LUA_REGISTRYINDEX);
}

#[test]
fn pseudo_indices_reach_registry_and_globals() {
    let state = LuaState::new();
    assert_eq!(state.type_of(LUA_REGISTRYINDEX), LuaType::Table);
    let Some(Value::Table(globals)) = state.get(LUA_GLOBALSINDEX) else {
        panic!("globals missing");
    };
    assert!(globals.ptr_eq(state.globals()));
    assert!(globals.get_str("print").as_function().is_some());
}

#[test]
fn settop_grows_with_nil_and_shrinks() {
    let mut state = state_with(&[Value::from("a")]);
    state.settop(3).unwrap();
    assert_eq!(state.values(), &[Value::from("a"), Value::Nil, Value::Nil]);
    state.settop(-2).unwrap();
    assert_eq!(state.gettop(), 2);
    state.pop(2).unwrap();
    assert_eq!(state.gettop(), 0);

    let err = state.pop(1).unwrap_err();
    assert_eq!(err.to_string(), "invalid new top -2");
}

#[test]
fn insert_remove_replace_shuffle() {
    let mut state = state_with(&[Value::from(1), Value::from(2), Value::from(3)]);
    state.insert(1).unwrap();
    assert_eq!(state.values(), &[Value::from(3), Value::from(1), Value::from(2)]);
    state.remove(2).unwrap();
    assert_eq!(state.values(), &[Value::from(3), Value::from(2)]);
    state.push_string("x");
    state.replace(1).unwrap();
    assert_eq!(state.values(), &[Value::from("x"), Value::from(2)]);

    let err = state.remove(5).unwrap_err();
    assert_eq!(err.to_string(), "invalid stack index 5");
}

#[test]
fn pushvalue_of_empty_index_pushes_nil() {
    let mut state = LuaState::new();
    state.pushvalue(7);
    assert_eq!(state.values(), &[Value::Nil]);
}

#[test]
fn tolstring_converts_numbers_in_place() {
    let mut state = state_with(&[Value::from(1.5)]);
    assert_eq!(state.to_lstring(1).as_deref(), Some("1.5"));
    assert_eq!(state.value(1), Value::from("1.5"));
    assert!(state.is_number(1));
    assert_eq!(state.objlen(1), 3);
}

#[test]
fn readers_apply_coercions() {
    let mut state = state_with(&[Value::from("42"), Value::Boolean(false), Value::from(-2.7)]);
    assert_eq!(state.to_number(1), 42.0);
    assert_eq!(state.to_integer(3), -2);
    assert!(!state.to_boolean(2));
    assert!(!state.to_boolean(9));
    assert!(state.is_string(3));
    assert!(!state.is_string(2));
    assert_eq!(state.to_lstring(2), None);
}

#[test]
fn lstring_respects_length_and_boundaries() {
    let mut state = LuaState::new();
    state.push_lstring("hello", 3);
    state.push_lstring("hi", 99);
    state.push_lstring("é", 1);
    assert_eq!(
        state.values(),
        &[Value::from("hel"), Value::from("hi"), Value::from("")]
    );
}

#[test]
fn checkstack_limits_growth() {
    let state = LuaState::new();
    assert!(state.checkstack(100));
    assert!(!state.checkstack(1_000_000));
}

#[test]
fn typename_of_codes() {
    assert_eq!(LuaState::typename(-1), Some("no value"));
    assert_eq!(LuaState::typename(5), Some("table"));
    assert_eq!(LuaState::typename(42), None);
}
