//! Renders the live execution surface as one line of text.
//!
//! ```text
//! stack: 10 'hi' {1, 2} {x = true, [3] = 'c'} function:print
//! stack: <empty>
//! ```
//!
//! Numbers use `%g`. Strings are quoted, except table keys that are plain
//! identifiers. Tables whose pairs fill positions `1..N` print as sequences,
//! other tables print as `key = value` lists. Functions are named after the
//! first global bound to them; every other reference value prints its id.

use apidemo_foundation::number::{PRINT_PRECISION, format_g};
use apidemo_foundation::{ObjectId, TableRef, Value};
use apidemo_host::LuaState;

/// Shown in place of a table that is already being rendered.
pub const CYCLE_MARKER: &str = "{...}";

/// Renders stacks and single values.
#[derive(Clone, Copy, Debug, Default)]
pub struct StackPrinter {
    detect_cycles: bool,
}

impl StackPrinter {
    /// Creates a printer without cycle detection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable cycle detection.
    #[must_use]
    pub fn with_cycle_detection(mut self) -> Self {
        self.detect_cycles = true;
        self
    }

    /// Returns whether cycle detection is on.
    #[must_use]
    pub fn detects_cycles(&self) -> bool {
        self.detect_cycles
    }

    /// Renders the live surface of `state`, leaving out its top `omit` values.
    #[must_use]
    pub fn render(&self, state: &LuaState, omit: usize) -> String {
        let values = state.values();
        let shown = values.len().saturating_sub(omit);
        self.render_values(&values[..shown], state.globals())
    }

    /// Renders `values` bottom first. `globals` is searched for function names.
    #[must_use]
    pub fn render_values(&self, values: &[Value], globals: &TableRef) -> String {
        let mut renderer = Renderer::new(globals, self.detect_cycles);
        renderer.out.push_str("stack:");
        if values.is_empty() {
            renderer.out.push_str(" <empty>");
        }
        for value in values {
            renderer.out.push(' ');
            renderer.item(value, false);
        }
        renderer.out
    }

    /// Renders one value the way it appears on a stack line.
    #[must_use]
    pub fn render_value(&self, value: &Value, globals: &TableRef) -> String {
        let mut renderer = Renderer::new(globals, self.detect_cycles);
        renderer.item(value, false);
        renderer.out
    }
}

/// Returns true if `key` prints bare when used as a table key.
#[must_use]
pub fn is_bare_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Returns true if the positions `1..=N` of `table` all hold values, where
/// `N` is its pair count. Empty tables qualify.
#[must_use]
pub fn is_sequence(table: &TableRef) -> bool {
    (1..=table.pair_count()).all(|k| {
        i64::try_from(k).is_ok_and(|k| !table.get_int(k).is_nil())
    })
}

struct Renderer<'a> {
    globals: &'a TableRef,
    detect_cycles: bool,
    open: Vec<ObjectId>,
    out: String,
}

impl<'a> Renderer<'a> {
    fn new(globals: &'a TableRef, detect_cycles: bool) -> Self {
        Self {
            globals,
            detect_cycles,
            open: Vec::new(),
            out: String::new(),
        }
    }

    fn item(&mut self, value: &Value, as_key: bool) {
        let (first, last) = if as_key { ("[", "]") } else { ("", "") };
        match value {
            Value::Nil => self.out.push_str("nil"),
            Value::Number(n) => {
                let text = format_g(*n, PRINT_PRECISION);
                self.push_wrapped(first, &text, last);
            }
            Value::Boolean(b) => {
                let text = if *b { "true" } else { "false" };
                self.push_wrapped(first, text, last);
            }
            Value::String(s) => {
                if as_key && is_bare_key(s) {
                    self.out.push_str(s);
                } else {
                    self.push_wrapped(first, &format!("'{s}'"), last);
                }
            }
            Value::Table(table) => {
                self.out.push_str(first);
                self.table(table);
                self.out.push_str(last);
            }
            Value::Function(_) => {
                let text = self.function_name(value);
                self.push_wrapped(first, &text, last);
            }
            Value::Opaque(u) => self.push_wrapped(first, &format!("userdata:{}", u.id()), last),
            Value::Thread(t) => self.push_wrapped(first, &format!("thread:{}", t.id()), last),
        }
    }

    fn push_wrapped(&mut self, first: &str, text: &str, last: &str) {
        self.out.push_str(first);
        self.out.push_str(text);
        self.out.push_str(last);
    }

    fn table(&mut self, table: &TableRef) {
        if self.detect_cycles {
            if self.open.contains(&table.id()) {
                self.out.push_str(CYCLE_MARKER);
                return;
            }
            self.open.push(table.id());
        }

        self.out.push('{');
        if is_sequence(table) {
            let mut k = 1;
            loop {
                let value = table.get_int(k);
                if value.is_nil() {
                    break;
                }
                if k > 1 {
                    self.out.push_str(", ");
                }
                self.item(&value, false);
                k += 1;
            }
        } else {
            for (i, (key, value)) in table.pairs().iter().enumerate() {
                if i > 0 {
                    self.out.push_str(", ");
                }
                self.item(key, true);
                self.out.push_str(" = ");
                self.item(value, false);
            }
        }
        self.out.push('}');

        if self.detect_cycles {
            self.open.pop();
        }
    }

    fn function_name(&self, function: &Value) -> String {
        self.globals
            .pairs()
            .into_iter()
            .find_map(|(key, bound)| {
                if bound.raw_equal(function) {
                    key.to_str()
                } else {
                    None
                }
            })
            .map_or_else(
                || {
                    let id = function.object_id().map(|id| id.to_string()).unwrap_or_default();
                    format!("function:{id}")
                },
                |name| format!("function:{name}"),
            )
    }
}
