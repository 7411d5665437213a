//! Integration tests for saving and loading sessions

use apidemo_core::{DispatcherConfig, Handle};
use apidemo_foundation::{ErrorKind, LuaType, Value};
use apidemo_runtime::serialize::{self, SavedBinding, SavedMachine, SavedSession, SavedValue};
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

fn machine(session: &Session, name: &str) -> Handle {
    match session.variable(name) {
        Some(Binding::Machine(handle)) => *handle,
        other => panic!("{name} is not a machine: {other:?}"),
    }
}

fn show(session: &mut Session, name: &str) -> String {
    match session.eval_line(name) {
        Ok(Outcome::Text(text)) => text,
        other => panic!("{name}: {other:?}"),
    }
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn save_and_load_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.msgpack");
    let path = path.display();

    let mut first = session();
    run(
        &mut first,
        &[
            "L = luaL_newstate()",
            "lua_pushstring(L, 'kept')",
            "lua_newtable(L)",
            "lua_pushboolean(L, true)",
            "lua_setfield(L, -2, 'ready')",
            "M = luaL_newstate()",
            "lua_pushnumber(M, 2.5)",
            "depth = lua_gettop(L)",
        ],
    );
    assert_eq!(
        first.eval_line(&format!("save '{path}'")).unwrap(),
        Outcome::Text(format!("saved to {path}"))
    );

    let mut second = session();
    assert_eq!(
        second.eval_line(&format!("load '{path}'")).unwrap(),
        Outcome::Text("loaded 2 machine(s), 3 variable(s)".to_string())
    );
    assert_eq!(show(&mut second, "L"), "stack: 'kept' {ready = true}");
    assert_eq!(show(&mut second, "M"), "stack: 2.5");
    assert_eq!(second.variable("depth"), Some(&Binding::Value(Value::from(2))));

    // The loaded machines keep working.
    run(&mut second, &["lua_settop(L, 1)", "lua_pushvalue(M, 1)"]);
    assert_eq!(show(&mut second, "L"), "stack: 'kept'");
    assert_eq!(show(&mut second, "M"), "stack: 2.5 2.5");
}

#[test]
fn loading_adds_to_existing_machines() {
    let mut source = session();
    run(&mut source, &["L = luaL_newstate()", "lua_pushinteger(L, 7)"]);
    let saved = source.snapshot();

    let mut target = session();
    run(&mut target, &["L = luaL_newstate()", "K = luaL_newstate()", "lua_pushnil(K)"]);
    let before = machine(&target, "L");

    let report = target.restore(saved).unwrap();
    assert_eq!(report.machines, 1);
    assert_eq!(target.dispatcher().handles().len(), 3);

    // L is rebound to the loaded machine; K is untouched.
    let after = machine(&target, "L");
    assert_ne!(before, after);
    assert_eq!(show(&mut target, "L"), "stack: 7");
    assert_eq!(show(&mut target, "K"), "stack: nil");
    assert_eq!(target.dispatcher_mut().render(before), "stack: <empty>");
}

#[test]
fn functions_come_back_by_global_name() {
    let mut first = session();
    run(
        &mut first,
        &[
            "L = luaL_newstate()",
            "lua_getglobal(L, 'tostring')",
            "lua_pushinteger(L, 12)",
        ],
    );
    let saved = first.snapshot();
    assert_eq!(
        saved.machines[0].stack[0],
        SavedValue::Function("tostring".to_string())
    );

    let mut second = session();
    second.restore(saved).unwrap();
    let status = second.eval_line("status = lua_pcall(L, 1, 1, 0)").unwrap();
    assert_eq!(status, Outcome::Value(Value::from(0)));
    assert_eq!(show(&mut second, "L"), "stack: '12'");
}

// =============================================================================
// Lossy Values
// =============================================================================

#[test]
fn self_referencing_table_is_cut() {
    let mut first = session();
    run(
        &mut first,
        &[
            "L = luaL_newstate()",
            "lua_newtable(L)",
            "lua_pushvalue(L, -1)",
            "lua_setfield(L, -2, 'self')",
            "lua_pushinteger(L, 1)",
            "lua_setfield(L, -2, 'n')",
        ],
    );

    let mut second = session();
    let report = second.restore(first.snapshot()).unwrap();
    assert_eq!(report.lost, vec![LuaType::Table]);
    assert_eq!(show(&mut second, "L"), "stack: {n = 1}");
}

#[test]
fn unnamed_functions_and_threads_become_nil() {
    let mut first = session();
    run(
        &mut first,
        &[
            "L = luaL_newstate()",
            "luaL_loadstring(L, 'return 1')",
            "lua_pushthread(L)",
        ],
    );
    let mut second = session();
    let report = second.restore(first.snapshot()).unwrap();
    assert_eq!(report.lost, vec![LuaType::Function, LuaType::Thread]);
    assert_eq!(show(&mut second, "L"), "stack: nil nil");
    assert_eq!(
        report.to_string(),
        "loaded 1 machine(s), 1 variable(s); restored as nil: function, thread"
    );
}

#[test]
fn variable_for_missing_machine_is_skipped() {
    let saved = SavedSession {
        machines: vec![SavedMachine {
            handle: 4,
            stack: vec![SavedValue::Boolean(false)],
        }],
        variables: vec![
            ("A".to_string(), SavedBinding::Machine(4)),
            ("B".to_string(), SavedBinding::Machine(9)),
            ("c".to_string(), SavedBinding::Value(SavedValue::String("s".to_string()))),
        ],
        ..SavedSession::default()
    };

    let mut s = session();
    let report = s.restore(saved).unwrap();
    assert_eq!(report.machines, 1);
    assert_eq!(report.variables, 2);
    assert!(s.variable("B").is_none());
    assert_eq!(show(&mut s, "A"), "stack: false");
    assert_eq!(s.variable("c"), Some(&Binding::Value(Value::from("s"))));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session();
    let err = s.load(dir.path().join("absent.msgpack")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Io(_)));
}

#[test]
fn garbage_and_future_versions_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.msgpack");
    std::fs::write(&path, b"not a session").unwrap();
    let mut s = session();
    let err = s.load(&path).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization(_)));

    let future = SavedSession {
        version: serialize::FORMAT_VERSION + 1,
        ..SavedSession::default()
    };
    let bytes = serialize::to_bytes(&future).unwrap();
    let err = serialize::from_bytes(&bytes).unwrap_err();
    assert!(err.to_string().contains("unsupported session format version"));
    assert!(s.dispatcher().handles().is_empty());
}
