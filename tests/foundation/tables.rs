//! Integration tests for TableRef
//!
//! Tests raw access, key normalization, traversal, borders, and sharing.

use apidemo_foundation::{TableRef, Value};

#[test]
fn nil_assignment_removes_keys() {
    let t = TableRef::new();
    t.set_str("a", Value::from(1));
    assert_eq!(t.pair_count(), 1);
    t.set_str("a", Value::Nil);
    assert!(t.is_empty());
}

#[test]
fn nil_and_nan_keys_are_rejected() {
    let t = TableRef::new();
    let err = t.set(Value::Nil, Value::from(1)).unwrap_err();
    assert_eq!(err.to_string(), "table index is nil");
    let err = t.set(Value::from(f64::NAN), Value::from(1)).unwrap_err();
    assert_eq!(err.to_string(), "table index is NaN");
}

#[test]
fn integral_float_keys_share_slots() {
    let t = TableRef::new();
    t.set(Value::from(1.0), Value::from("one")).unwrap();
    assert_eq!(t.get_int(1), Value::from("one"));
    t.set(Value::from(-0.0), Value::from("zero")).unwrap();
    assert_eq!(t.get_int(0), Value::from("zero"));
}

#[test]
fn border_of_a_sequence() {
    let t = TableRef::from_sequence(vec![Value::from("a"), Value::from("b"), Value::from("c")]);
    assert_eq!(t.len(), 3);
    t.set_int(5, Value::from("e"));
    assert_eq!(t.len(), 3);
    t.set_str("x", Value::from(1));
    assert_eq!(t.len(), 3);
    assert_eq!(TableRef::new().len(), 0);
}

#[test]
fn next_visits_every_pair_once() {
    let t = TableRef::new();
    t.set_int(1, Value::from("a"));
    t.set_int(2, Value::from("b"));
    t.set_str("k", Value::Boolean(true));

    let mut key = Value::Nil;
    let mut seen = Vec::new();
    while let Some((k, v)) = t.next(&key).unwrap() {
        seen.push((k.clone(), v));
        key = k;
    }
    assert_eq!(seen.len(), 3);
    assert_eq!(seen, t.pairs());
}

#[test]
fn next_with_missing_key_fails() {
    let t = TableRef::new();
    t.set_int(1, Value::from(1));
    let err = t.next(&Value::from("absent")).unwrap_err();
    assert_eq!(err.to_string(), "invalid key to 'next'");
}

#[test]
fn clones_share_contents() {
    let t = TableRef::new();
    let alias = t.clone();
    alias.set_str("x", Value::from(1));
    assert_eq!(t.get_str("x"), Value::from(1));
    assert!(t.ptr_eq(&alias));
    assert_eq!(t.id(), alias.id());
}

#[test]
fn metatables_attach_and_detach() {
    let t = TableRef::new();
    let meta = TableRef::new();
    assert!(t.metatable().is_none());
    t.set_metatable(Some(meta.clone()));
    assert!(t.metatable().unwrap().ptr_eq(&meta));
    t.set_metatable(None);
    assert!(t.metatable().is_none());
}
