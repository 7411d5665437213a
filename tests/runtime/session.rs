//! Integration tests for sessions driven one command at a time

use apidemo_core::DispatcherConfig;
use apidemo_foundation::{ErrorKind, Value};
use apidemo_runtime::{Binding, Outcome, Session};

fn session() -> Session {
    Session::with_config(DispatcherConfig::new().quiet())
}

fn run(session: &mut Session, lines: &[&str]) {
    for line in lines {
        if let Err(e) = session.eval_line(line) {
            panic!("{line}: {e}");
        }
    }
}

fn last(session: &Session) -> &str {
    session.dispatcher().echo().last().unwrap_or("<none>")
}

// =============================================================================
// Operations
// =============================================================================

#[test]
fn table_building_session() {
    let mut s = session();
    run(
        &mut s,
        &[
            "L = luaL_newstate()",
            "lua_newtable(L)",
            "lua_pushstring(L, 'x')",
            "lua_setfield(L, -2, 'name')",
            "lua_pushinteger(L, 5)",
            "lua_rawseti(L, -2, 5)",
        ],
    );
    assert_eq!(last(&s), "stack: {[5] = 5, name = 'x'}");

    let outcome = s.eval_line("n = lua_objlen(L, -1)").unwrap();
    assert_eq!(outcome, Outcome::Value(Value::from(0)));
    run(&mut s, &["lua_getfield(L, -1, 'name')"]);
    assert_eq!(last(&s), "stack: {[5] = 5, name = 'x'} 'x'");
}

#[test]
fn chunks_share_globals_between_machines() {
    let mut s = session();
    run(&mut s, &["L = luaL_newstate()", "M = luaL_newstate()"]);

    let outcome = s.eval_line("ok = luaL_dostring(L, 'answer = 42')").unwrap();
    assert_eq!(outcome, Outcome::Value(Value::from(0)));
    assert_eq!(last(&s), "stack: <empty>");

    run(&mut s, &["lua_getglobal(M, 'answer')"]);
    assert_eq!(last(&s), "stack: 42");
    assert_eq!(
        s.eval_line("L").unwrap(),
        Outcome::Text("stack: <empty>".to_string())
    );
}

#[test]
fn print_output_is_collected() {
    let mut s = session();
    run(&mut s, &["L = luaL_newstate()", "luaL_dostring(L, \"print('hi', 1)\")"]);
    assert_eq!(s.take_output(), vec!["hi\t1".to_string()]);
    assert!(s.take_output().is_empty());
}

#[test]
fn protected_call_leaves_message() {
    let mut s = session();
    run(
        &mut s,
        &[
            "L = luaL_newstate()",
            "lua_getglobal(L, 'error')",
            "lua_pushstring(L, 'bad')",
            "lua_pushinteger(L, 0)",
        ],
    );
    let outcome = s.eval_line("status = lua_pcall(L, 2, 0, 0)").unwrap();
    assert_eq!(outcome, Outcome::Value(Value::from(2)));
    assert_eq!(last(&s), "stack: 'bad'");
}

#[test]
fn raised_error_drops_payload_from_stack() {
    let mut s = session();
    run(&mut s, &["L = luaL_newstate()", "lua_pushinteger(L, 1)", "lua_pushstring(L, 'boom')"]);

    let err = s.eval_line("lua_error(L)").unwrap_err();
    assert_eq!(err.payload(), Value::from("boom"));
    assert_eq!(last(&s), "stack: 1");
    assert_eq!(s.eval_line("L").unwrap(), Outcome::Text("stack: 1".to_string()));
}

#[test]
fn failed_operation_keeps_stack_and_echoes_nothing() {
    let mut s = session();
    run(&mut s, &["L = luaL_newstate()", "lua_pushinteger(L, 1)"]);
    let before = s.dispatcher().echo().len();

    let err = s.eval_line("lua_rawget(L, -1)").unwrap_err();
    assert_eq!(err.to_string(), "table expected, got number");
    assert_eq!(s.dispatcher().echo().len(), before);
    assert_eq!(s.eval_line("L").unwrap(), Outcome::Text("stack: 1".to_string()));
}

// =============================================================================
// Names and Variables
// =============================================================================

#[test]
fn constants_resolve_after_variables() {
    let mut s = session();
    run(&mut s, &["L = luaL_newstate()", "lua_pushinteger(L, LUA_TSTRING)"]);
    assert_eq!(last(&s), "stack: 4");

    // A variable shadows the constant of the same name.
    run(&mut s, &["LUA_TSTRING = lua_gettop(L)", "lua_pushinteger(L, LUA_TSTRING)"]);
    assert_eq!(last(&s), "stack: 4 1");
}

#[test]
fn unknown_names_are_reported() {
    let mut s = session();
    run(&mut s, &["L = luaL_newstate()"]);

    let err = s.eval_line("lua_pushinteger(L, nowhere)").unwrap_err();
    assert!(matches!(&err.kind, ErrorKind::UnknownVariable(name) if name == "nowhere"));

    let err = s.eval_line("lua_frobnicate(L)").unwrap_err();
    assert!(matches!(&err.kind, ErrorKind::UnknownOperation(_)));
    assert_eq!(err.to_string(), "unknown operation: lua_frobnicate");
}

#[test]
fn operand_positions_are_checked() {
    let mut s = session();
    run(&mut s, &["L = luaL_newstate()", "n = luaL_newstate()"]);

    let err = s.eval_line("lua_pushstring('L', 'x')").unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad argument #1 to 'lua_pushstring' (machine expected, got string)"
    );
    let err = s.eval_line("lua_settop(L, n)").unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad argument #2 to 'lua_settop' (value expected, got machine)"
    );
}

#[test]
fn rebinding_a_name_replaces_it() {
    let mut s = session();
    run(&mut s, &["L = luaL_newstate()", "lua_pushnil(L)", "L = luaL_newstate()"]);
    assert_eq!(s.dispatcher().handles().len(), 2);
    assert_eq!(
        s.eval_line("L").unwrap(),
        Outcome::Text("stack: <empty>".to_string())
    );
    let listing = s.machines();
    assert_eq!(listing.lines().count(), 2);
    assert!(listing.lines().next().is_some_and(|l| l.ends_with(": stack: nil")));
}

#[test]
fn machines_without_any() {
    let mut s = session();
    assert_eq!(
        s.eval_line("machines").unwrap(),
        Outcome::Text("no machines\n".to_string())
    );
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn help_lists_and_describes() {
    let mut s = session();
    let Outcome::Text(all) = s.eval_line("help").unwrap() else {
        panic!("help returned no text");
    };
    assert!(all.contains("lua_pushnumber"));
    assert!(all.contains("luaL_dostring"));

    let Outcome::Text(one) = s.eval_line("help lua_settop").unwrap() else {
        panic!("help lua_settop returned no text");
    };
    assert!(one.starts_with("lua_settop(L, int i)  [-? +? -]\n"));

    let Outcome::Text(newstate) = s.eval_line("help luaL_newstate").unwrap() else {
        panic!("help luaL_newstate returned no text");
    };
    assert!(newstate.starts_with("lua_State *luaL_newstate(void)"));

    assert!(s.eval_line("help lua_nothing").is_err());
}

#[test]
fn history_counts_back() {
    let mut s = session();
    run(
        &mut s,
        &[
            "L = luaL_newstate()",
            "lua_pushinteger(L, 1)",
            "lua_pushinteger(L, 2)",
            "lua_pushinteger(L, 3)",
        ],
    );
    assert_eq!(
        s.eval_line("history 2").unwrap(),
        Outcome::Text("stack: 1 2\nstack: 1 2 3\n".to_string())
    );
    assert_eq!(
        s.eval_line("history").unwrap(),
        Outcome::Text("stack: 1\nstack: 1 2\nstack: 1 2 3\n".to_string())
    );
}

#[test]
fn show_returns_captured_values() {
    let mut s = session();
    run(&mut s, &["L = luaL_newstate()", "lua_pushstring(L, 'abc')", "t = lua_tostring(L, -1)"]);
    assert_eq!(s.eval_line("t").unwrap(), Outcome::Value(Value::from("abc")));
    assert_eq!(s.variable("t"), Some(&Binding::Value(Value::from("abc"))));
}
