//! Durable snapshots of simulated machines.
//!
//! Every machine is a [`Handle`] naming a record in the host registry:
//!
//! ```text
//! registry["ApiDemo.SavedStates"][handle] = { num_items = n, [1] = v1, ..., [n] = vn }
//! ```
//!
//! An operation checks its machine out (the record is copied onto the live
//! surface), works on the surface, then checks it back in (the surface is
//! copied into the record). At most one machine is checked out at a time.
//! Misuse of that protocol is a bug in the caller and panics.

use std::fmt;

use apidemo_foundation::{Result, TableRef, Value};
use apidemo_host::LuaState;
use tracing::debug;

/// Registry key of the table holding every machine's record.
pub const SAVED_STATES_KEY: &str = "ApiDemo.SavedStates";

/// Record field holding the number of saved values.
pub const NUM_ITEMS_KEY: &str = "num_items";

// =============================================================================
// Handle
// =============================================================================

/// Opaque identity of a simulated machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(i64);

impl Handle {
    /// Returns the registry reference behind this handle.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "machine#{}", self.0)
    }
}

// =============================================================================
// State Store
// =============================================================================

/// Creates machines and moves their snapshots on and off the live surface.
#[derive(Debug, Default)]
pub struct StateStore {
    active: Option<Handle>,
}

impl StateStore {
    /// Creates a store with nothing checked out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the checked-out machine, if any.
    #[must_use]
    pub fn active(&self) -> Option<Handle> {
        self.active
    }

    /// Allocates a machine with an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot allocate the reference.
    pub fn create(&mut self, host: &mut LuaState) -> Result<Handle> {
        self.create_with(host, Vec::new())
    }

    /// Allocates a machine whose snapshot is `values`, bottom first.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot allocate the reference.
    pub fn create_with(&mut self, host: &mut LuaState, values: Vec<Value>) -> Result<Handle> {
        let saved = saved_states(host);
        let record = TableRef::new();
        write_record(&record, values);

        host.push(Value::Table(saved));
        host.push(Value::Table(record));
        let reference = host.reference(-2);
        host.pop_value();
        let handle = Handle(reference?);
        debug!(%handle, "created machine");
        Ok(handle)
    }

    /// Returns every machine, oldest first.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn handles(&self, host: &LuaState) -> Vec<Handle> {
        saved_states(host)
            .pairs()
            .into_iter()
            .filter_map(|(key, record)| match (key, record) {
                (Value::Number(n), Value::Table(_)) if n >= 1.0 && n.fract() == 0.0 => {
                    Some(Handle(n as i64))
                }
                _ => None,
            })
            .collect()
    }

    /// Returns true if `handle` names a machine.
    #[must_use]
    pub fn contains(&self, host: &LuaState, handle: Handle) -> bool {
        matches!(saved_states(host).get_int(handle.0), Value::Table(_))
    }

    /// Clears the live surface and loads the snapshot of `handle` onto it.
    ///
    /// # Panics
    ///
    /// Panics if a machine is already checked out, if `handle` names no
    /// machine, or if its record has no numeric `num_items`.
    pub fn checkout(&mut self, host: &mut LuaState, handle: Handle) {
        if let Some(active) = self.active {
            panic!("cannot check out {handle}: {active} is still checked out");
        }
        let record = record(host, handle);
        let items = record_len(&record, handle);

        clear(host);
        for k in 1..=items {
            host.push(record.get_int(k));
        }
        self.active = Some(handle);
        debug!(%handle, items, "checked out");
    }

    /// Saves the live surface, minus its top `omit` values, as the snapshot
    /// of the checked-out machine, then clears the surface.
    ///
    /// # Panics
    ///
    /// Panics if no machine is checked out or its record is missing.
    pub fn checkin(&mut self, host: &mut LuaState, omit: usize) {
        let Some(handle) = self.active.take() else {
            panic!("checkin without a checked-out machine");
        };
        let record = record(host, handle);
        let values = host.values();
        let keep = values.len().saturating_sub(omit);
        let items = values[..keep].to_vec();
        let count = items.len();

        write_record(&record, items);
        clear(host);
        debug!(%handle, items = count, omitted = omit, "checked in");
    }

    /// Checks `handle` out for the lifetime of the returned guard.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`checkout`](Self::checkout).
    pub fn acquire<'a>(&'a mut self, host: &'a mut LuaState, handle: Handle) -> Checkout<'a> {
        self.checkout(host, handle);
        Checkout {
            store: self,
            host,
            handle,
            released: false,
        }
    }

    /// Returns a copy of the snapshot of `handle`.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`checkout`](Self::checkout).
    #[must_use]
    pub fn snapshot(&mut self, host: &mut LuaState, handle: Handle) -> Vec<Value> {
        let guard = self.acquire(host, handle);
        let values = guard.values().to_vec();
        guard.checkin(0);
        values
    }
}

// =============================================================================
// Checkout Guard
// =============================================================================

/// A checked-out machine.
///
/// Dropping the guard checks the whole surface back in, so an early return
/// through `?` still saves the machine. [`Checkout::checkin`] saves with an
/// explicit omit count instead.
pub struct Checkout<'a> {
    store: &'a mut StateStore,
    host: &'a mut LuaState,
    handle: Handle,
    released: bool,
}

impl Checkout<'_> {
    /// Returns the checked-out machine.
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Returns the host, with the machine on its live surface.
    pub fn host(&mut self) -> &mut LuaState {
        self.host
    }

    /// Returns the live surface, bottom first.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        self.host.values()
    }

    /// Returns the host for reading.
    #[must_use]
    pub fn host_ref(&self) -> &LuaState {
        self.host
    }

    /// Checks the machine in, leaving out the top `omit` values.
    pub fn checkin(mut self, omit: usize) {
        self.released = true;
        self.store.checkin(self.host, omit);
    }
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        if !self.released && !std::thread::panicking() {
            self.store.checkin(self.host, 0);
        }
    }
}

// =============================================================================
// Record Layout
// =============================================================================

/// Returns the saved-states table, creating it on first use.
fn saved_states(host: &LuaState) -> TableRef {
    let registry = host.registry();
    if let Value::Table(saved) = registry.get_str(SAVED_STATES_KEY) {
        return saved;
    }
    let saved = TableRef::new();
    registry.set_str(SAVED_STATES_KEY, Value::Table(saved.clone()));
    saved
}

fn record(host: &LuaState, handle: Handle) -> TableRef {
    match saved_states(host).get_int(handle.0) {
        Value::Table(record) => record,
        other => panic!("{handle} has no saved record (found {})", other.type_name()),
    }
}

fn record_len(record: &TableRef, handle: Handle) -> i64 {
    match record.get_str(NUM_ITEMS_KEY) {
        #[allow(clippy::cast_possible_truncation)]
        Value::Number(n) if n >= 0.0 => n as i64,
        other => panic!("record of {handle} has a bad {NUM_ITEMS_KEY}: {other:?}"),
    }
}

fn write_record(record: &TableRef, values: Vec<Value>) {
    let old = record_len_lenient(record);
    #[allow(clippy::cast_precision_loss)]
    let count = values.len() as f64;
    record.set_str(NUM_ITEMS_KEY, Value::Number(count));
    let mut k = 0;
    for value in values {
        k += 1;
        record.set_int(k, value);
    }
    // Clear slots the previous snapshot used beyond the new length.
    for stale in (k + 1)..=old {
        record.set_int(stale, Value::Nil);
    }
}

#[allow(clippy::cast_possible_truncation)]
fn record_len_lenient(record: &TableRef) -> i64 {
    record.get_str(NUM_ITEMS_KEY).as_number().map_or(0, |n| n as i64)
}

fn clear(host: &mut LuaState) {
    while host.gettop() > 0 {
        host.pop_value();
    }
}
