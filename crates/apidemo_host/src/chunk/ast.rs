//! Syntax tree of a chunk.

use std::rc::Rc;

/// A compiled chunk: statements, then an optional `return`.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    /// Display name used in messages (`[string "..."]` or a file name).
    pub name: Rc<str>,
    /// Statements in order.
    pub body: Vec<Stat>,
    /// The final `return`, if any.
    pub ret: Option<Return>,
}

/// `return explist`
#[derive(Clone, Debug, PartialEq)]
pub struct Return {
    /// Returned expressions.
    pub values: Vec<Expr>,
    /// Line of the `return` keyword.
    pub line: usize,
}

/// A statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Stat {
    /// `target = value`
    Assign {
        /// Assigned variable or field.
        target: Target,
        /// Assigned expression.
        value: Expr,
        /// Line of the statement.
        line: usize,
    },
    /// A function call whose results are discarded.
    Call(Call),
}

/// A variable reference: a global name followed by field accesses.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    /// The global name.
    pub name: Rc<str>,
    /// Keys indexed in order (`.name` becomes a string key).
    pub path: Vec<Expr>,
}

/// `callee(args)`
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    /// The called variable.
    pub callee: Target,
    /// Argument expressions.
    pub args: Vec<Expr>,
    /// Line of the call.
    pub line: usize,
}

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `nil`
    Nil,
    /// `true` / `false`
    Boolean(bool),
    /// Numeric literal, possibly negated.
    Number(f64),
    /// String literal.
    String(Rc<str>),
    /// Table constructor.
    Table(Vec<Field>),
    /// Call; yields its first result, or all results at the end of a list.
    Call(Box<Call>),
    /// Variable read.
    Target(Target),
}

/// A table constructor field.
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    /// `[k] = v` or `name = v`
    Keyed(Expr, Expr),
    /// `v`, stored at the next array position.
    Positional(Expr),
}
