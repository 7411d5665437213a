//! Integration tests for the state store
//!
//! Tests machine records in the host registry and the checkout protocol.

use apidemo_core::store::{NUM_ITEMS_KEY, SAVED_STATES_KEY};
use apidemo_core::{Handle, StateStore};
use apidemo_foundation::{TableRef, Value};
use apidemo_host::LuaState;
use proptest::prelude::*;

fn record(host: &LuaState, handle: Handle) -> TableRef {
    let Value::Table(saved) = host.registry().get_str(SAVED_STATES_KEY) else {
        panic!("saved states missing");
    };
    let Value::Table(record) = saved.get_int(handle.raw()) else {
        panic!("record missing");
    };
    record
}

#[test]
fn records_live_in_the_registry() {
    let mut host = LuaState::new();
    let mut store = StateStore::new();
    let handle = store
        .create_with(&mut host, vec![Value::from("a"), Value::from(2)])
        .unwrap();

    let record = record(&host, handle);
    assert_eq!(record.get_str(NUM_ITEMS_KEY), Value::from(2));
    assert_eq!(record.get_int(1), Value::from("a"));
    assert_eq!(record.get_int(2), Value::from(2));
}

#[test]
fn handles_are_distinct_and_listed_oldest_first() {
    let mut host = LuaState::new();
    let mut store = StateStore::new();
    let a = store.create(&mut host).unwrap();
    let b = store.create(&mut host).unwrap();
    let c = store.create(&mut host).unwrap();
    assert_ne!(a, b);
    assert_eq!(store.handles(&host), vec![a, b, c]);
    assert_eq!(a.to_string(), format!("machine#{}", a.raw()));
}

#[test]
fn checkout_swaps_surfaces() {
    let mut host = LuaState::new();
    let mut store = StateStore::new();
    let a = store.create_with(&mut host, vec![Value::from(1)]).unwrap();
    let b = store.create_with(&mut host, vec![Value::from(2), Value::from(3)]).unwrap();

    store.checkout(&mut host, b);
    assert_eq!(store.active(), Some(b));
    assert_eq!(host.values(), &[Value::from(2), Value::from(3)]);
    host.push_nil();
    store.checkin(&mut host, 0);
    assert_eq!(host.gettop(), 0);

    store.checkout(&mut host, a);
    assert_eq!(host.values(), &[Value::from(1)]);
    store.checkin(&mut host, 0);

    assert_eq!(
        store.snapshot(&mut host, b),
        vec![Value::from(2), Value::from(3), Value::Nil]
    );
}

#[test]
fn guard_checks_in_on_drop() {
    let mut host = LuaState::new();
    let mut store = StateStore::new();
    let handle = store.create(&mut host).unwrap();
    {
        let mut guard = store.acquire(&mut host, handle);
        guard.host().push_string("kept");
        assert_eq!(guard.values(), &[Value::from("kept")]);
    }
    assert_eq!(store.active(), None);
    assert_eq!(store.snapshot(&mut host, handle), vec![Value::from("kept")]);
}

#[test]
#[should_panic(expected = "is still checked out")]
fn double_checkout_panics() {
    let mut host = LuaState::new();
    let mut store = StateStore::new();
    let a = store.create(&mut host).unwrap();
    let b = store.create(&mut host).unwrap();
    store.checkout(&mut host, a);
    store.checkout(&mut host, b);
}

proptest! {
    #[test]
    fn snapshots_survive_checkout_and_checkin(values in prop::collection::vec(any::<i32>(), 0..40)) {
        let mut host = LuaState::new();
        let mut store = StateStore::new();
        let values: Vec<Value> = values.into_iter().map(Value::from).collect();
        let handle = store.create_with(&mut host, values.clone()).unwrap();

        store.checkout(&mut host, handle);
        prop_assert_eq!(host.values(), values.as_slice());
        store.checkin(&mut host, 0);
        prop_assert_eq!(store.snapshot(&mut host, handle), values);
    }

    #[test]
    fn omitted_values_are_not_saved(count in 0usize..20, omit in 0usize..25) {
        let mut host = LuaState::new();
        let mut store = StateStore::new();
        let values: Vec<Value> = (0..count).map(|i| Value::from(i64::try_from(i).unwrap())).collect();
        let handle = store.create_with(&mut host, values.clone()).unwrap();

        store.checkout(&mut host, handle);
        store.checkin(&mut host, omit);
        let kept = count.saturating_sub(omit);
        prop_assert_eq!(store.snapshot(&mut host, handle), values[..kept].to_vec());
    }
}
