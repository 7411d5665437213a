//! Integration tests for Value types
//!
//! Tests type codes, truthiness, coercion, equality, and display.

use std::rc::Rc;

use apidemo_foundation::number::{format_g, number_to_integer, number_to_string, str_to_number};
use apidemo_foundation::{FunctionRef, LuaType, TableRef, ThreadRef, UserdataRef, Value};

// =============================================================================
// Type Codes
// =============================================================================

#[test]
fn type_codes_match_the_embedding_api() {
    assert_eq!(LuaType::None.code(), -1);
    assert_eq!(LuaType::Nil.code(), 0);
    assert_eq!(LuaType::Boolean.code(), 1);
    assert_eq!(LuaType::Number.code(), 3);
    assert_eq!(LuaType::String.code(), 4);
    assert_eq!(LuaType::Table.code(), 5);
    assert_eq!(LuaType::Function.code(), 6);
    assert_eq!(LuaType::Userdata.code(), 7);
    assert_eq!(LuaType::Thread.code(), 8);
}

#[test]
fn type_codes_round_trip() {
    for code in -1..=8 {
        let ty = LuaType::from_code(code).unwrap();
        assert_eq!(ty.code(), code);
    }
    assert_eq!(LuaType::from_code(9), None);
    assert_eq!(LuaType::from_code(-2), None);
}

#[test]
fn type_names() {
    assert_eq!(LuaType::None.name(), "no value");
    assert_eq!(Value::Nil.type_name(), "nil");
    assert_eq!(Value::from(1).type_name(), "number");
    assert_eq!(Value::from("s").type_name(), "string");
    assert_eq!(Value::Table(TableRef::new()).type_name(), "table");
    assert_eq!(Value::Opaque(UserdataRef::new()).type_name(), "userdata");
    assert_eq!(Value::Thread(ThreadRef::new()).type_name(), "thread");
}

// =============================================================================
// Truthiness and Coercion
// =============================================================================

#[test]
fn only_nil_and_false_are_falsy() {
    assert!(!Value::Nil.is_truthy());
    assert!(!Value::Boolean(false).is_truthy());
    assert!(Value::from(0).is_truthy());
    assert!(Value::from("").is_truthy());
    assert!(Value::Table(TableRef::new()).is_truthy());
}

#[test]
fn strings_coerce_to_numbers() {
    assert_eq!(Value::from("10").to_number(), Some(10.0));
    assert_eq!(Value::from("  0x1F ").to_number(), Some(31.0));
    assert_eq!(Value::from("1e2").to_number(), Some(100.0));
    assert_eq!(Value::from("ten").to_number(), None);
    assert_eq!(Value::Boolean(true).to_number(), None);
}

#[test]
fn numbers_coerce_to_strings() {
    assert_eq!(Value::from(10).to_str().as_deref(), Some("10"));
    assert_eq!(Value::from(1.5).to_str().as_deref(), Some("1.5"));
    assert_eq!(Value::Nil.to_str(), None);
}

#[test]
fn number_formats() {
    assert_eq!(number_to_string(0.1), "0.1");
    assert_eq!(number_to_string(1e15), "1e+15");
    assert_eq!(number_to_string(123_456_789_012.0), "123456789012");
    assert_eq!(format_g(2.5, 6), "2.5");
    assert_eq!(format_g(f64::INFINITY, 6), "inf");
}

#[test]
fn integer_conversion_truncates() {
    assert_eq!(number_to_integer(3.9), 3);
    assert_eq!(number_to_integer(-3.9), -3);
    assert_eq!(number_to_integer(f64::NAN), 0);
    assert_eq!(str_to_number("-"), None);
    assert_eq!(str_to_number("--1"), None);
}

// =============================================================================
// Equality and Display
// =============================================================================

#[test]
fn reference_values_compare_by_identity() {
    let a = TableRef::new();
    let b = TableRef::new();
    assert!(Value::Table(a.clone()).raw_equal(&Value::Table(a)));
    assert!(!Value::Table(b).raw_equal(&Value::Table(TableRef::new())));

    let f = FunctionRef::new(Some("f"), Rc::new(()));
    assert!(Value::Function(f.clone()).raw_equal(&Value::Function(f)));
}

#[test]
fn nan_is_not_raw_equal_to_itself() {
    let nan = Value::from(f64::NAN);
    assert!(!nan.raw_equal(&nan));
    // Structural equality stays reflexive.
    assert_eq!(nan, nan.clone());
}

#[test]
fn display_matches_tostring() {
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::Boolean(true).to_string(), "true");
    assert_eq!(Value::from(42).to_string(), "42");
    assert_eq!(Value::from("hi").to_string(), "hi");
    assert!(Value::Table(TableRef::new()).to_string().starts_with("table: "));
}
