//! The one-line command language.
//!
//! ```text
//! line    := [ Name '=' ] Name '(' [ operand { ',' operand } ] ')' [ ';' ]
//!          | 'help' [ Name ] | 'history' [ Number ] | 'machines'
//!          | 'save' String | 'load' String
//!          | Name
//! operand := Number | '-' Number | String | 'true' | 'false' | 'nil' | Name
//! ```
//!
//! `--` starts a comment. Tokens come from the chunk lexer, so string
//! escapes and number formats match what `luaL_dostring` accepts.

use std::fmt;

use apidemo_foundation::{Error, Result};
use apidemo_host::chunk::{Lexer, Token, TokenKind};

/// A literal or name passed to an operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A numeric literal.
    Number(f64),
    /// A string literal.
    String(String),
    /// `true` or `false`.
    Boolean(bool),
    /// `nil`
    Nil,
    /// A session variable or named constant.
    Name(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Nil => write!(f, "nil"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// One parsed line.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Blank line or comment.
    Empty,
    /// `[target =] operation(operands)`
    Call {
        /// Variable that receives the result.
        target: Option<String>,
        /// Operation name.
        operation: String,
        /// Operands, the machine handle first.
        operands: Vec<Operand>,
    },
    /// `help` or `help operation`
    Help(Option<String>),
    /// `history` or `history n`
    History(Option<usize>),
    /// `machines`
    Machines,
    /// `save 'path'`
    Save(String),
    /// `load 'path'`
    Load(String),
    /// A bare variable name: show its value.
    Show(String),
}

/// Parses one command line.
///
/// # Errors
///
/// Returns a syntax error naming the offending token.
pub fn parse_command(line: &str) -> Result<Command> {
    CommandParser::new(line).parse()
}

struct CommandParser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> CommandParser<'a> {
    fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            source,
            lexer,
            current,
        }
    }

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(&format!("'{what}' expected")))
        }
    }

    fn error(&self, message: &str) -> Error {
        let message = match &self.current.kind {
            TokenKind::Error(text) => text.as_str(),
            _ => message,
        };
        Error::syntax(format!("{message} near '{}'", self.current.near(self.source)))
    }

    fn parse(mut self) -> Result<Command> {
        let command = match self.current.kind.clone() {
            TokenKind::Eof => return Ok(Command::Empty),
            TokenKind::Name(name) => {
                self.advance();
                self.statement(name)?
            }
            _ => return Err(self.error("command expected")),
        };
        self.eat(&TokenKind::Semicolon);
        if self.check(&TokenKind::Eof) {
            Ok(command)
        } else {
            Err(self.error("end of line expected"))
        }
    }

    fn statement(&mut self, name: String) -> Result<Command> {
        match (name.as_str(), &self.current.kind) {
            (_, TokenKind::Assign) => {
                self.advance();
                let TokenKind::Name(operation) = self.current.kind.clone() else {
                    return Err(self.error("operation expected"));
                };
                self.advance();
                self.call(Some(name), operation)
            }
            (_, TokenKind::LParen) => self.call(None, name),
            ("help", TokenKind::Name(operation)) => {
                let operation = operation.clone();
                self.advance();
                Ok(Command::Help(Some(operation)))
            }
            ("help", _) => Ok(Command::Help(None)),
            ("history", TokenKind::Number(n)) => {
                let count = history_count(*n).ok_or_else(|| self.error("count expected"))?;
                self.advance();
                Ok(Command::History(Some(count)))
            }
            ("history", _) => Ok(Command::History(None)),
            ("machines", _) => Ok(Command::Machines),
            ("save", _) => Ok(Command::Save(self.path()?)),
            ("load", _) => Ok(Command::Load(self.path()?)),
            _ => Ok(Command::Show(name)),
        }
    }

    fn path(&mut self) -> Result<String> {
        let TokenKind::String(path) = self.current.kind.clone() else {
            return Err(self.error("file name expected"));
        };
        self.advance();
        Ok(path)
    }

    fn call(&mut self, target: Option<String>, operation: String) -> Result<Command> {
        self.expect(&TokenKind::LParen, "(")?;
        let mut operands = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                operands.push(self.operand()?);
                if self.eat(&TokenKind::RParen) {
                    break;
                }
                self.expect(&TokenKind::Comma, ")")?;
            }
        }
        Ok(Command::Call {
            target,
            operation,
            operands,
        })
    }

    fn operand(&mut self) -> Result<Operand> {
        let operand = match self.current.kind.clone() {
            TokenKind::Number(n) => Operand::Number(n),
            TokenKind::String(s) => Operand::String(s),
            TokenKind::True => Operand::Boolean(true),
            TokenKind::False => Operand::Boolean(false),
            TokenKind::Nil => Operand::Nil,
            TokenKind::Name(name) => Operand::Name(name),
            TokenKind::Minus => {
                self.advance();
                let TokenKind::Number(n) = self.current.kind else {
                    return Err(self.error("number expected"));
                };
                Operand::Number(-n)
            }
            _ => return Err(self.error("unexpected symbol")),
        };
        self.advance();
        Ok(operand)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn history_count(n: f64) -> Option<usize> {
    (n >= 0.0 && n.fract() == 0.0 && n <= 1e9).then_some(n as usize)
}
