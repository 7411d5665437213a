//! Shared mutable tables.
//!
//! A table is a reference value: every copy of a [`TableRef`] observes the
//! same contents, and two tables are equal only when they are the same
//! table. Entries live in a persistent ordered map from the `im` crate, so
//! iteration order is deterministic: booleans, then numbers ascending, then
//! strings, then reference keys by identity.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;
use std::rc::Rc;

use crate::value::{ObjectId, Value};
use crate::{Error, Result};

/// A validated table key.
///
/// Nil and NaN can never be keys. Negative zero is stored as zero so that
/// `t[-0]` and `t[0]` address the same slot.
#[derive(Clone)]
pub struct TableKey(Value);

impl TableKey {
    /// Validates a value for use as a key.
    ///
    /// # Errors
    ///
    /// Returns a runtime error for nil or NaN keys.
    pub fn new(value: Value) -> Result<Self> {
        match value {
            Value::Nil => Err(Error::runtime("table index is nil")),
            Value::Number(n) if n.is_nan() => Err(Error::runtime("table index is NaN")),
            Value::Number(n) if n == 0.0 => Ok(Self(Value::Number(0.0))),
            other => Ok(Self(other)),
        }
    }

    /// Returns the key as a value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.0
    }

    /// Unwraps the key into its value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    const fn rank(&self) -> u8 {
        match &self.0 {
            Value::Nil => 0,
            Value::Boolean(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Table(_) => 4,
            Value::Function(_) => 5,
            Value::Opaque(_) => 6,
            Value::Thread(_) => 7,
        }
    }
}

impl PartialEq for TableKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TableKey {}

impl PartialOrd for TableKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TableKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (a, b) => match (a.object_id(), b.object_id()) {
                (Some(x), Some(y)) if self.rank() == other.rank() => x.cmp(&y),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl fmt::Debug for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Default)]
struct Table {
    entries: im::OrdMap<TableKey, Value>,
    metatable: Option<TableRef>,
}

/// Reference to a shared mutable table.
#[derive(Clone)]
pub struct TableRef {
    id: ObjectId,
    inner: Rc<RefCell<Table>>,
}

impl TableRef {
    /// Creates a new empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObjectId::fresh(),
            inner: Rc::new(RefCell::new(Table::default())),
        }
    }

    /// Creates a sequence table holding `values` at keys `1..=n`.
    #[must_use]
    pub fn from_sequence(values: impl IntoIterator<Item = Value>) -> Self {
        let table = Self::new();
        for (i, value) in (1_i64..).zip(values) {
            table.set_int(i, value);
        }
        table
    }

    /// Returns the identity token.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns true if both references point at the same table.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Raw read. Nil and NaN keys read as nil.
    #[must_use]
    pub fn get(&self, key: &Value) -> Value {
        match TableKey::new(key.clone()) {
            Ok(key) => self.inner.borrow().entries.get(&key).cloned().unwrap_or_default(),
            Err(_) => Value::Nil,
        }
    }

    /// Raw read of an integer key.
    #[must_use]
    pub fn get_int(&self, n: i64) -> Value {
        self.get(&Value::from(n))
    }

    /// Raw read of a string key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Value {
        self.get(&Value::from(key))
    }

    /// Raw write. Assigning nil removes the key.
    ///
    /// # Errors
    ///
    /// Returns a runtime error for nil or NaN keys.
    pub fn set(&self, key: Value, value: Value) -> Result<()> {
        let key = TableKey::new(key)?;
        let mut table = self.inner.borrow_mut();
        if value.is_nil() {
            table.entries.remove(&key);
        } else {
            table.entries.insert(key, value);
        }
        Ok(())
    }

    /// Raw write of an integer key.
    pub fn set_int(&self, n: i64, value: Value) {
        // Integer keys are never nil or NaN.
        let _ = self.set(Value::from(n), value);
    }

    /// Raw write of a string key.
    pub fn set_str(&self, key: &str, value: Value) {
        let _ = self.set(Value::from(key), value);
    }

    /// Returns the number of key/value pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Returns a border of the table: `n` such that `t[n]` is non-nil and
    /// `t[n + 1]` is nil, or 0 when `t[1]` is nil.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut n: i64 = 0;
        while !self.get_int(n + 1).is_nil() {
            n += 1;
        }
        usize::try_from(n).unwrap_or(0)
    }

    /// Returns true if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Returns the entry following `key` in iteration order.
    ///
    /// A nil key starts the traversal. `Ok(None)` marks the end.
    ///
    /// # Errors
    ///
    /// Returns a runtime error if `key` is not present in the table.
    pub fn next(&self, key: &Value) -> Result<Option<(Value, Value)>> {
        let table = self.inner.borrow();
        if key.is_nil() {
            return Ok(table
                .entries
                .iter()
                .next()
                .map(|(k, v)| (k.value().clone(), v.clone())));
        }

        let key = TableKey::new(key.clone())?;
        if !table.entries.contains_key(&key) {
            return Err(Error::runtime("invalid key to 'next'"));
        }
        Ok(table
            .entries
            .range((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.value().clone(), v.clone())))
    }

    /// Returns a snapshot of every pair in iteration order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(Value, Value)> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|(k, v)| (k.value().clone(), v.clone()))
            .collect()
    }

    /// Returns the metatable, if one is set.
    #[must_use]
    pub fn metatable(&self) -> Option<TableRef> {
        self.inner.borrow().metatable.clone()
    }

    /// Sets or clears the metatable.
    pub fn set_metatable(&self, metatable: Option<TableRef>) {
        self.inner.borrow_mut().metatable = metatable;
    }
}

impl Default for TableRef {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableRef({})", self.id)
    }
}
