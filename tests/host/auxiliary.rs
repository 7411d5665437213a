//! Integration tests for the auxiliary library
//!
//! Tests argument checks, references, metatable registry, and chunk loading.

use std::fs;

use apidemo_foundation::{LuaType, Value};
use apidemo_host::LuaState;
use apidemo_host::consts::{LUA_ERRFILE, LUA_ERRSYNTAX, LUA_OK, LUA_REFNIL, LUA_REGISTRYINDEX};

#[test]
fn checks_at_top_level_name_the_function_question_mark() {
    let mut state = LuaState::new();
    state.push_boolean(true);
    let err = state.check_string(1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad argument #1 to '?' (string expected, got boolean)"
    );
    assert!(state.check_type(1, LuaType::Boolean).is_ok());
}

#[test]
fn optional_arguments_default_on_none_or_nil() {
    let mut state = LuaState::new();
    state.push_nil();
    state.push_string("7");
    assert_eq!(state.opt_integer(1, 5).unwrap(), 5);
    assert_eq!(state.opt_integer(2, 5).unwrap(), 7);
    assert_eq!(state.opt_number(3, 1.5).unwrap(), 1.5);
    assert_eq!(&*state.opt_string(9, "dflt").unwrap(), "dflt");
}

#[test]
fn references_reuse_freed_slots() {
    let mut state = LuaState::new();
    state.new_table();

    state.push_string("a");
    let a = state.reference(1).unwrap();
    state.push_string("b");
    let b = state.reference(1).unwrap();
    assert_eq!((a, b), (1, 2));

    state.unreference(1, a).unwrap();
    state.push_string("c");
    assert_eq!(state.reference(1).unwrap(), a);

    state.push_nil();
    assert_eq!(state.reference(1).unwrap(), LUA_REFNIL);
    assert_eq!(state.gettop(), 1);
}

#[test]
fn named_metatables_live_in_the_registry() {
    let mut state = LuaState::new();
    assert!(state.new_metatable("Point"));
    assert!(!state.new_metatable("Point"));
    assert!(state.raw_equal(1, 2));

    state.get_named_metatable("Point");
    assert!(state.raw_equal(1, 3));
    state.get_field(LUA_REGISTRYINDEX, "Point").unwrap();
    assert!(state.raw_equal(1, 4));
}

#[test]
fn load_string_pushes_function_or_message() {
    let mut state = LuaState::new();
    assert_eq!(state.load_string("x = 1"), LUA_OK);
    assert!(state.is_function(-1));

    assert_eq!(state.load_string("x = = 1"), LUA_ERRSYNTAX);
    assert!(state.is_string(-1));
}

#[test]
fn do_string_runs_and_reports() {
    let mut state = LuaState::new();
    assert_eq!(state.do_string("answer = 42 return answer").unwrap(), 0);
    assert_eq!(state.values(), &[Value::from(42)]);

    state.settop(0).unwrap();
    assert_eq!(state.do_string("error('nope', 0)").unwrap(), 1);
    assert_eq!(state.values(), &[Value::from("nope")]);
}

#[test]
fn do_file_reads_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chunk.lua");
    fs::write(&path, "#!/usr/bin/env lua\nloaded = true\nreturn 'ok'\n").unwrap();
    let path = path.to_string_lossy().into_owned();

    let mut state = LuaState::new();
    assert_eq!(state.do_file(&path).unwrap(), 0);
    assert_eq!(state.values(), &[Value::from("ok")]);
    assert_eq!(state.globals().get_str("loaded"), Value::Boolean(true));

    state.settop(0).unwrap();
    assert_eq!(state.load_file("/nonexistent/chunk.lua"), LUA_ERRFILE);
    assert!(state.value(-1).as_str().unwrap().starts_with("cannot open"));
}

#[test]
fn print_output_is_captured() {
    let mut state = LuaState::new();
    state.run_string("print('one', 2) print()").unwrap();
    assert_eq!(state.take_output(), vec!["one\t2".to_string(), String::new()]);
}
