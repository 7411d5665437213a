//! Integration tests for the dispatcher
//!
//! Runs realistic operation sequences against simulated machines and checks
//! both the returned values and the echoed stack lines.

use apidemo_core::{Category, Dispatcher, DispatcherConfig, Handle};
use apidemo_foundation::{ErrorKind, Value};
use apidemo_host::consts::{LUA_GLOBALSINDEX, LUA_MULTRET, LUA_TNUMBER};

fn quiet() -> Dispatcher {
    Dispatcher::new(DispatcherConfig::new().quiet())
}

/// Runs `name` on `l`, returning the result.
fn run(d: &mut Dispatcher, l: Handle, name: &str, args: &[Value]) -> Option<Value> {
    d.invoke(name, l, args)
        .unwrap_or_else(|e| panic!("{name} failed: {e}"))
}

fn last(d: &Dispatcher) -> &str {
    d.echo().last().unwrap_or("<none>")
}

// =============================================================================
// Stack Sessions
// =============================================================================

#[test]
fn stack_manipulation_session() {
    let mut d = quiet();
    let l = d.create().unwrap();

    run(&mut d, l, "lua_pushinteger", &[Value::from(1)]);
    run(&mut d, l, "lua_pushinteger", &[Value::from(2)]);
    run(&mut d, l, "lua_pushinteger", &[Value::from(3)]);
    assert_eq!(last(&d), "stack: 1 2 3");

    run(&mut d, l, "lua_insert", &[Value::from(1)]);
    assert_eq!(last(&d), "stack: 3 1 2");
    run(&mut d, l, "lua_pushvalue", &[Value::from(-2)]);
    assert_eq!(last(&d), "stack: 3 1 2 1");
    run(&mut d, l, "lua_replace", &[Value::from(1)]);
    assert_eq!(last(&d), "stack: 1 1 2");
    run(&mut d, l, "lua_remove", &[Value::from(-1)]);
    assert_eq!(last(&d), "stack: 1 1");
    run(&mut d, l, "lua_settop", &[Value::from(4)]);
    assert_eq!(last(&d), "stack: 1 1 nil nil");
    run(&mut d, l, "lua_pop", &[Value::from(4)]);
    assert_eq!(last(&d), "stack: <empty>");
}

#[test]
fn readers_return_c_values() {
    let mut d = quiet();
    let l = d.create().unwrap();
    run(&mut d, l, "lua_pushstring", &[Value::from("12.5")]);
    run(&mut d, l, "lua_newtable", &[]);

    assert_eq!(run(&mut d, l, "lua_isnumber", &[Value::from(1)]), Some(Value::from(1)));
    assert_eq!(run(&mut d, l, "lua_tonumber", &[Value::from(1)]), Some(Value::from(12.5)));
    assert_eq!(run(&mut d, l, "lua_tointeger", &[Value::from(1)]), Some(Value::from(12)));
    assert_eq!(
        run(&mut d, l, "lua_type", &[Value::from(-1)]),
        Some(Value::from(5))
    );
    assert_eq!(
        run(&mut d, l, "lua_typename", &[Value::from(LUA_TNUMBER)]),
        Some(Value::from("number"))
    );
    assert_eq!(
        run(&mut d, l, "luaL_typename", &[Value::from(3)]),
        Some(Value::from("no value"))
    );
    // A table has no string form: the null pointer comes back as 0.
    assert_eq!(run(&mut d, l, "lua_tolstring", &[Value::from(2)]), Some(Value::from(0)));
    assert_eq!(run(&mut d, l, "lua_toboolean", &[Value::from(9)]), Some(Value::from(0)));
}

#[test]
fn tostring_converts_numbers_in_the_saved_stack() {
    let mut d = quiet();
    let l = d.create().unwrap();
    run(&mut d, l, "lua_pushnumber", &[Value::from(7)]);
    assert_eq!(run(&mut d, l, "lua_tostring", &[Value::from(-1)]), Some(Value::from("7")));
    assert_eq!(last(&d), "stack: '7'");
    assert_eq!(d.snapshot(l), vec![Value::from("7")]);
}

// =============================================================================
// Tables and Globals
// =============================================================================

#[test]
fn building_a_table() {
    let mut d = quiet();
    let l = d.create().unwrap();
    run(&mut d, l, "lua_newtable", &[]);
    run(&mut d, l, "lua_pushstring", &[Value::from("v")]);
    run(&mut d, l, "lua_setfield", &[Value::from(-2), Value::from("k")]);
    run(&mut d, l, "lua_pushinteger", &[Value::from(10)]);
    run(&mut d, l, "lua_rawseti", &[Value::from(-2), Value::from(1)]);
    assert_eq!(last(&d), "stack: {[1] = 10, k = 'v'}");

    run(&mut d, l, "lua_getfield", &[Value::from(1), Value::from("k")]);
    assert_eq!(last(&d), "stack: {[1] = 10, k = 'v'} 'v'");
    assert_eq!(run(&mut d, l, "lua_objlen", &[Value::from(1)]), Some(Value::from(1)));
}

#[test]
fn iterating_with_next() {
    let mut d = quiet();
    let l = d.create().unwrap();
    run(&mut d, l, "luaL_dostring", &[Value::from("t = {'a', 'b'} return t")]);
    run(&mut d, l, "lua_pushnil", &[]);

    assert_eq!(run(&mut d, l, "lua_next", &[Value::from(1)]), Some(Value::from(1)));
    assert_eq!(last(&d), "stack: {'a', 'b'} 1 'a'");
    run(&mut d, l, "lua_pop", &[Value::from(1)]);
    assert_eq!(run(&mut d, l, "lua_next", &[Value::from(1)]), Some(Value::from(1)));
    run(&mut d, l, "lua_pop", &[Value::from(1)]);
    assert_eq!(run(&mut d, l, "lua_next", &[Value::from(1)]), Some(Value::from(0)));
    assert_eq!(last(&d), "stack: {'a', 'b'}");
}

#[test]
fn machines_share_globals() {
    let mut d = quiet();
    let a = d.create().unwrap();
    let b = d.create().unwrap();

    run(&mut d, a, "lua_pushstring", &[Value::from("shared")]);
    run(&mut d, a, "lua_setglobal", &[Value::from("greeting")]);
    assert_eq!(last(&d), "stack: <empty>");

    run(&mut d, b, "lua_getglobal", &[Value::from("greeting")]);
    assert_eq!(last(&d), "stack: 'shared'");
    run(&mut d, b, "lua_getfield", &[Value::from(LUA_GLOBALSINDEX), Value::from("greeting")]);
    assert_eq!(last(&d), "stack: 'shared' 'shared'");
    assert!(d.snapshot(a).is_empty());
}

#[test]
fn machines_keep_separate_stacks() {
    let mut d = quiet();
    let a = d.create().unwrap();
    let b = d.create().unwrap();
    run(&mut d, a, "lua_pushinteger", &[Value::from(1)]);
    run(&mut d, b, "lua_pushstring", &[Value::from("b")]);
    run(&mut d, a, "lua_pushinteger", &[Value::from(2)]);
    assert_eq!(last(&d), "stack: 1 2");
    assert_eq!(d.render(b), "stack: 'b'");
    assert_eq!(d.handles(), vec![a, b]);
}

// =============================================================================
// Calls and Errors
// =============================================================================

#[test]
fn calling_a_global_function() {
    let mut d = quiet();
    let l = d.create().unwrap();
    run(&mut d, l, "lua_getglobal", &[Value::from("tostring")]);
    assert_eq!(last(&d), "stack: function:tostring");
    run(&mut d, l, "lua_pushnumber", &[Value::from(0.25)]);
    run(&mut d, l, "lua_call", &[Value::from(1), Value::from(1)]);
    assert_eq!(last(&d), "stack: '0.25'");
}

#[test]
fn protected_call_catches_errors() {
    let mut d = quiet();
    let l = d.create().unwrap();
    run(&mut d, l, "lua_getglobal", &[Value::from("error")]);
    run(&mut d, l, "lua_pushstring", &[Value::from("bad thing")]);
    run(&mut d, l, "lua_pushinteger", &[Value::from(0)]);
    let status = run(&mut d, l, "lua_pcall", &[Value::from(2), Value::from(0), Value::from(0)]);
    assert_eq!(status, Some(Value::from(2)));
    assert_eq!(last(&d), "stack: 'bad thing'");
}

#[test]
fn print_output_is_collected() {
    let mut d = quiet();
    let l = d.create().unwrap();
    run(&mut d, l, "lua_getglobal", &[Value::from("print")]);
    run(&mut d, l, "lua_pushstring", &[Value::from("hello")]);
    run(&mut d, l, "lua_pushinteger", &[Value::from(3)]);
    run(&mut d, l, "lua_call", &[Value::from(2), Value::from(LUA_MULTRET)]);
    assert_eq!(d.take_output(), vec!["hello\t3".to_string()]);
}

#[test]
fn lua_error_raises_and_drops_the_payload() {
    let mut d = quiet();
    let l = d.create().unwrap();
    run(&mut d, l, "lua_pushinteger", &[Value::from(1)]);
    run(&mut d, l, "lua_pushstring", &[Value::from("oops")]);

    let err = d.invoke("lua_error", l, &[]).unwrap_err();
    assert!(err.is_runtime());
    assert_eq!(err.to_string(), "oops");
    assert_eq!(last(&d), "stack: 1");
    assert_eq!(d.snapshot(l), vec![Value::from(1)]);
}

#[test]
fn failed_operations_keep_their_partial_effects_silently() {
    let mut d = quiet();
    let l = d.create().unwrap();
    run(&mut d, l, "lua_pushstring", &[Value::from("keep")]);
    let emitted = d.echo().emitted();

    let err = d.invoke("luaL_error", l, &[Value::from("custom")]).unwrap_err();
    assert_eq!(err.to_string(), "custom");
    let err = d.invoke("luaL_checktype", l, &[Value::from(1), Value::from(42)]).unwrap_err();
    assert_eq!(err.to_string(), "invalid type code 42");
    let err = d.invoke("lua_remove", l, &[Value::from(7)]).unwrap_err();
    assert_eq!(err.to_string(), "invalid stack index 7");

    assert_eq!(d.echo().emitted(), emitted);
    assert_eq!(d.snapshot(l), vec![Value::from("keep")]);
}

#[test]
fn argument_validation_happens_before_the_machine_is_touched() {
    let mut d = quiet();
    let l = d.create().unwrap();
    let err = d.invoke("lua_setfield", l, &[Value::from(1)]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ArgumentType { position: 3, .. }));
    assert_eq!(
        err.to_string(),
        "bad argument #3 to 'lua_setfield' (string expected, got no value)"
    );
    assert_eq!(d.echo().emitted(), 0);

    // Numeric strings convert and extra arguments are ignored.
    run(&mut d, l, "lua_pushinteger", &[Value::from("5"), Value::from("extra")]);
    assert_eq!(last(&d), "stack: 5");
}

#[test]
fn unknown_operations_are_reported() {
    let mut d = quiet();
    let l = d.create().unwrap();
    let err = d.invoke("lua_frobnicate", l, &[]).unwrap_err();
    assert_eq!(err.to_string(), "unknown operation: lua_frobnicate");
}

// =============================================================================
// Catalog and Help
// =============================================================================

#[test]
fn every_category_has_operations() {
    let d = quiet();
    for category in Category::ALL {
        assert!(
            !d.catalog().in_category(category).is_empty(),
            "{category:?} is empty"
        );
    }
    assert!(d.catalog().get("lua_pushnil").is_some());
}

#[test]
fn help_lists_operations_by_section() {
    let d = quiet();
    let help = d.help();
    assert!(help.contains("-- writing values to the stack "));
    assert!(help.contains("lua_pushnumber(L, l_N n)"));
    assert!(help.contains("[-0 +1 -]"));

    let one = d.help_for("lua_settop").unwrap();
    assert!(one.contains("set stack size"));
    assert!(d.help_for("nope").is_err());
}
