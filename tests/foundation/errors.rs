//! Integration tests for Error types
//!
//! Tests message formats, payloads, and context display.

use apidemo_foundation::{Error, ErrorContext, ErrorKind, TableRef, Value};

#[test]
fn argument_errors_name_position_and_types() {
    let err = Error::argument_type(2, "lua_settop", "number", "string");
    assert_eq!(
        err.to_string(),
        "bad argument #2 to 'lua_settop' (number expected, got string)"
    );
    assert!(!err.is_runtime());
}

#[test]
fn runtime_errors_carry_their_payload() {
    let err = Error::runtime("boom");
    assert!(err.is_runtime());
    assert_eq!(err.payload(), Value::from("boom"));
    assert_eq!(err.to_string(), "boom");

    let err = Error::runtime(Value::from(42));
    assert_eq!(err.to_string(), "42");
}

#[test]
fn non_string_payloads_describe_their_type() {
    let err = Error::runtime(Value::Table(TableRef::new()));
    assert_eq!(err.to_string(), "(error object is a table value)");
    let err = Error::runtime(Value::Nil);
    assert_eq!(err.to_string(), "(error object is a nil value)");
}

#[test]
fn other_kinds_have_no_payload() {
    assert_eq!(Error::unknown_operation("lua_nope").payload(), Value::Nil);
    assert_eq!(
        Error::unknown_operation("lua_nope").to_string(),
        "unknown operation: lua_nope"
    );
    assert_eq!(Error::unknown_variable("L").to_string(), "unknown variable: L");
    assert_eq!(
        Error::new(ErrorKind::Io("disk".into())).to_string(),
        "I/O error: disk"
    );
}

#[test]
fn context_is_kept_alongside_the_kind() {
    let err = Error::syntax("unexpected symbol").with_context(
        ErrorContext::new()
            .with_source("demo.api")
            .with_position(3, 1),
    );
    assert_eq!(err.to_string(), "unexpected symbol");
    let context = err.context.unwrap();
    assert_eq!(context.line, Some(3));
    assert_eq!(context.to_string(), "at demo.api:3:1");
}
