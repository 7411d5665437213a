//! Integration tests for the REPL loop and script runner

use std::collections::VecDeque;

use apidemo_core::DispatcherConfig;
use apidemo_foundation::Result;
use apidemo_runtime::{Binding, LineEditor, ReadResult, Repl, Session};

/// Feeds scripted input.
struct ScriptedEditor {
    input: VecDeque<ReadResult>,
}

impl ScriptedEditor {
    fn new(input: Vec<ReadResult>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

impl LineEditor for ScriptedEditor {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        Ok(self.input.pop_front().unwrap_or(ReadResult::Eof))
    }

    fn add_history(&mut self, _line: &str) {}

    fn set_keywords(&mut self, _keywords: Vec<String>) {}
}

fn line(text: &str) -> ReadResult {
    ReadResult::Line(text.to_string())
}

fn quiet() -> Session {
    Session::with_config(DispatcherConfig::new().quiet())
}

fn repl(input: Vec<ReadResult>) -> Repl<ScriptedEditor> {
    Repl::with_editor(ScriptedEditor::new(input))
        .with_session(quiet())
        .without_banner()
        .with_prompt("> ")
}

fn last(session: &Session) -> &str {
    session.dispatcher().echo().last().unwrap_or("<none>")
}

// =============================================================================
// Interactive Loop
// =============================================================================

#[test]
fn interrupt_discards_unfinished_command() {
    let mut r = repl(vec![
        line("L = luaL_newstate()"),
        line("lua_pushinteger(L,"),
        ReadResult::Interrupted,
        line("lua_pushinteger(L, 3)"),
    ]);
    r.run().unwrap();
    assert_eq!(last(r.session()), "stack: 3");
}

#[test]
fn calls_can_span_lines() {
    let mut r = repl(vec![line("L = luaL_newstate()"), line("lua_pushnil("), line("L)")]);
    r.run().unwrap();
    let session = r.into_session();
    assert_eq!(last(&session), "stack: nil");
}

#[test]
fn failing_commands_do_not_stop_the_loop() {
    let mut r = repl(vec![
        line("L = luaL_newstate()"),
        line("lua_settop(L, -5)"),
        line("lua_bogus(L)"),
        line("lua_pushboolean(L, false)"),
    ]);
    r.run().unwrap();
    assert_eq!(last(r.session()), "stack: false");
}

#[test]
fn eof_in_unfinished_command_is_an_error() {
    let mut r = repl(vec![line("L = luaL_newstate()"), line("lua_pushnil(L,")]);
    let err = r.run().unwrap_err();
    assert!(err.to_string().contains("unfinished command"));
}

#[test]
fn variables_bound_in_the_loop_stay_in_the_session() {
    let mut r = repl(vec![line("machine_one = luaL_newstate()")]);
    r.run().unwrap();
    let session = r.into_session();
    assert!(matches!(session.variable("machine_one"), Some(Binding::Machine(_))));
    assert!(session.completions().iter().any(|w| w == "machine_one"));
}

// =============================================================================
// Scripts
// =============================================================================

#[test]
fn source_counts_failures_and_continues() {
    let source = "\
-- set up
L = luaL_newstate()

lua_pushstring(L,
               'multi')
lua_remove(L, 9)
lua_nothing(L)
lua_pushinteger(L, 2)
";
    let mut r = repl(Vec::new());
    let failures = r.eval_source(source, "demo.api").unwrap();
    assert_eq!(failures, 2);
    assert_eq!(last(r.session()), "stack: 'multi' 2");
}

#[test]
fn source_ending_mid_command_is_an_error() {
    let mut r = repl(Vec::new());
    let err = r
        .eval_source("L = luaL_newstate()\nlua_pushinteger(L,\n", "cut.api")
        .unwrap_err();
    let context = err.context.as_ref().unwrap();
    assert_eq!(context.to_string(), "at cut.api:2:1");
    // Commands before the cut still ran.
    assert_eq!(r.session().dispatcher().handles().len(), 1);
}

#[test]
fn files_run_like_sources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("setup.api");
    std::fs::write(&path, "L = luaL_newstate()\nlua_pushnumber(L, 0.5)\n").unwrap();

    let mut r = repl(Vec::new());
    assert_eq!(r.eval_file(&path).unwrap(), 0);
    assert_eq!(last(r.session()), "stack: 0.5");

    assert!(r.eval_file(&dir.path().join("missing.api")).is_err());
}
