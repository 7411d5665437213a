//! Integration tests for the command grammar

use apidemo_runtime::{Command, Operand, parse_command};

fn call(target: Option<&str>, operation: &str, operands: Vec<Operand>) -> Command {
    Command::Call {
        target: target.map(String::from),
        operation: operation.to_string(),
        operands,
    }
}

#[test]
fn calls_with_every_operand_kind() {
    let parsed = parse_command("r = lua_pcall(L, -1, 'two', true, false, nil, LUA_MULTRET);").unwrap();
    assert_eq!(
        parsed,
        call(
            Some("r"),
            "lua_pcall",
            vec![
                Operand::Name("L".to_string()),
                Operand::Number(-1.0),
                Operand::String("two".to_string()),
                Operand::Boolean(true),
                Operand::Boolean(false),
                Operand::Nil,
                Operand::Name("LUA_MULTRET".to_string()),
            ],
        )
    );
}

#[test]
fn string_escapes_follow_chunk_lexer() {
    let parsed = parse_command(r#"lua_pushstring(L, "a\tb\"c")"#).unwrap();
    assert_eq!(
        parsed,
        call(
            None,
            "lua_pushstring",
            vec![
                Operand::Name("L".to_string()),
                Operand::String("a\tb\"c".to_string()),
            ],
        )
    );
}

#[test]
fn malformed_lines_are_syntax_errors() {
    for line in ["lua_settop(L, 1", "lua_settop(L,, 1)", "= lua_gettop(L)", "lua_gettop(L) extra"] {
        assert!(parse_command(line).is_err(), "{line} parsed");
    }
}
