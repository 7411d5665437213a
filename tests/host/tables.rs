//! Integration tests for table access
//!
//! Tests fields, raw access, traversal, metatables, and globals.

use apidemo_foundation::{LuaType, Value};
use apidemo_host::LuaState;

#[test]
fn fields_round_trip_through_the_stack() {
    let mut state = LuaState::new();
    state.new_table();
    state.push_integer(7);
    state.set_field(1, "x").unwrap();
    state.get_field(1, "x").unwrap();
    assert_eq!(state.value(-1), Value::from(7));
    state.get_field(1, "missing").unwrap();
    assert!(state.is_nil(-1));
}

#[test]
fn gettable_and_settable_use_stack_keys() {
    let mut state = LuaState::new();
    state.new_table();
    state.push_string("k");
    state.push_boolean(true);
    state.set_table(1).unwrap();
    assert_eq!(state.gettop(), 1);

    state.push_string("k");
    state.get_table(1).unwrap();
    assert_eq!(state.value(-1), Value::Boolean(true));
}

#[test]
fn indexing_a_non_table_fails() {
    let mut state = LuaState::new();
    state.push_integer(1);
    let err = state.get_field(1, "x").unwrap_err();
    assert_eq!(err.to_string(), "attempt to index a number value");
}

#[test]
fn index_metamethod_falls_back() {
    let mut state = LuaState::new();
    state
        .run_string("proto = {greeting = 'hello'} obj = setmetatable({}, {__index = proto})")
        .unwrap();
    state.get_global("obj").unwrap();
    state.get_field(-1, "greeting").unwrap();
    assert_eq!(state.value(-1), Value::from("hello"));

    // Raw access ignores the metatable.
    state.push_string("greeting");
    state.raw_get(1).unwrap();
    assert!(state.is_nil(-1));
}

#[test]
fn raw_integer_access() {
    let mut state = LuaState::new();
    state.create_table(2, 0);
    state.push_string("first");
    state.raw_seti(1, 1).unwrap();
    state.raw_geti(1, 1).unwrap();
    assert_eq!(state.value(-1), Value::from("first"));
    assert_eq!(state.objlen(1), 1);
}

#[test]
fn raw_access_requires_a_table() {
    let mut state = LuaState::new();
    state.push_string("s");
    let err = state.raw_geti(1, 1).unwrap_err();
    assert_eq!(err.to_string(), "table expected, got string");
}

#[test]
fn next_walks_a_table() {
    let mut state = LuaState::new();
    state.run_string("t = {10, 20, k = 'v'}").unwrap();
    state.get_global("t").unwrap();
    state.push_nil();

    let mut count = 0;
    while state.next(1).unwrap() {
        count += 1;
        state.pop(1).unwrap();
    }
    assert_eq!(count, 3);
    assert_eq!(state.gettop(), 1);
}

#[test]
fn metatables_set_and_get() {
    let mut state = LuaState::new();
    state.new_table();
    assert!(!state.get_metatable(1));

    state.new_table();
    assert!(state.set_metatable(1).unwrap());
    assert!(state.get_metatable(1));
    assert_eq!(state.type_of(-1), LuaType::Table);
}

#[test]
fn globals_are_shared_with_chunks() {
    let mut state = LuaState::new();
    state.push_string("from the api");
    state.set_global("message").unwrap();
    let values = state.run_string("return message").unwrap();
    assert_eq!(values, vec![Value::from("from the api")]);
}
