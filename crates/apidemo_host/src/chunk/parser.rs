//! Recursive-descent parser for chunks.

use std::rc::Rc;

use apidemo_foundation::{Error, Result};

use super::ast::{Call, Chunk, Expr, Field, Return, Stat, Target};
use super::lexer::{Lexer, Token, TokenKind};
use crate::consts::LUAI_MAXCCALLS;

/// Parser for chunk source.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    source: &'src str,
    chunk_name: Rc<str>,
    /// Expressions currently being parsed, counting the enclosing ones.
    depth: usize,
}

impl<'src> Parser<'src> {
    /// Creates a parser. `chunk_name` is the display name used in errors.
    #[must_use]
    pub fn new(source: &'src str, chunk_name: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            source,
            chunk_name: Rc::from(chunk_name),
            depth: 0,
        }
    }

    /// Parses the whole source as a chunk.
    ///
    /// # Errors
    ///
    /// Returns a syntax error positioned as `name:line: message near 'token'`.
    pub fn parse_chunk(mut self) -> Result<Chunk> {
        let mut body = Vec::new();
        let mut ret = None;
        loop {
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon => self.advance(),
                TokenKind::Return => {
                    ret = Some(self.parse_return()?);
                    if self.current.kind != TokenKind::Eof {
                        return Err(self.error("'<eof>' expected"));
                    }
                    break;
                }
                _ => body.push(self.parse_stat()?),
            }
        }
        Ok(Chunk {
            name: self.chunk_name,
            body,
            ret,
        })
    }

    fn parse_return(&mut self) -> Result<Return> {
        let line = self.current.line;
        self.advance();
        let values = if matches!(self.current.kind, TokenKind::Eof | TokenKind::Semicolon) {
            Vec::new()
        } else {
            self.parse_exprlist()?
        };
        if self.current.kind == TokenKind::Semicolon {
            self.advance();
        }
        Ok(Return { values, line })
    }

    fn parse_stat(&mut self) -> Result<Stat> {
        let line = self.current.line;
        if !matches!(self.current.kind, TokenKind::Name(_)) {
            return Err(self.error("unexpected symbol"));
        }
        let target = self.parse_target()?;
        match self.current.kind {
            TokenKind::LParen => Ok(Stat::Call(self.parse_call(target, line)?)),
            TokenKind::Assign => {
                self.advance();
                let value = self.parse_expr()?;
                Ok(Stat::Assign {
                    target,
                    value,
                    line,
                })
            }
            _ => Err(self.error("'=' expected")),
        }
    }

    fn parse_target(&mut self) -> Result<Target> {
        let TokenKind::Name(name) = &self.current.kind else {
            return Err(self.error("<name> expected"));
        };
        let name = Rc::from(name.as_str());
        self.advance();

        let mut path = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let TokenKind::Name(field) = &self.current.kind else {
                        return Err(self.error("<name> expected"));
                    };
                    path.push(Expr::String(Rc::from(field.as_str())));
                    self.advance();
                }
                TokenKind::LBracket => {
                    self.advance();
                    path.push(self.parse_expr()?);
                    self.expect(&TokenKind::RBracket, "']' expected")?;
                }
                _ => return Ok(Target { name, path }),
            }
        }
    }

    fn parse_call(&mut self, callee: Target, line: usize) -> Result<Call> {
        let open_line = self.current.line;
        self.advance();
        let args = if self.current.kind == TokenKind::RParen {
            Vec::new()
        } else {
            self.parse_exprlist()?
        };
        self.expect_match(&TokenKind::RParen, "')'", "'('", open_line)?;
        Ok(Call { callee, args, line })
    }

    fn parse_exprlist(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.current.kind == TokenKind::Comma {
            self.advance();
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        if self.depth >= LUAI_MAXCCALLS {
            return Err(Error::syntax(format!(
                "{}:{}: chunk has too many syntax levels",
                self.chunk_name, self.current.line
            )));
        }
        self.depth += 1;
        let expr = self.parse_simple_expr();
        self.depth -= 1;
        expr
    }

    fn parse_simple_expr(&mut self) -> Result<Expr> {
        let expr = match &self.current.kind {
            TokenKind::Nil => Expr::Nil,
            TokenKind::True => Expr::Boolean(true),
            TokenKind::False => Expr::Boolean(false),
            TokenKind::Number(n) => Expr::Number(*n),
            TokenKind::String(s) => Expr::String(Rc::from(s.as_str())),
            TokenKind::Minus => {
                self.advance();
                let TokenKind::Number(n) = self.current.kind else {
                    return Err(self.error("unexpected symbol"));
                };
                Expr::Number(-n)
            }
            TokenKind::LBrace => return self.parse_table(),
            TokenKind::Name(_) => {
                let line = self.current.line;
                let target = self.parse_target()?;
                if self.current.kind == TokenKind::LParen {
                    return Ok(Expr::Call(Box::new(self.parse_call(target, line)?)));
                }
                return Ok(Expr::Target(target));
            }
            _ => return Err(self.error("unexpected symbol")),
        };
        self.advance();
        Ok(expr)
    }

    fn parse_table(&mut self) -> Result<Expr> {
        let open_line = self.current.line;
        self.advance();
        let mut fields = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            fields.push(self.parse_field()?);
            match self.current.kind {
                TokenKind::Comma | TokenKind::Semicolon => self.advance(),
                _ => break,
            }
        }
        self.expect_match(&TokenKind::RBrace, "'}'", "'{'", open_line)?;
        Ok(Expr::Table(fields))
    }

    fn parse_field(&mut self) -> Result<Field> {
        if self.current.kind == TokenKind::LBracket {
            self.advance();
            let key = self.parse_expr()?;
            self.expect(&TokenKind::RBracket, "']' expected")?;
            self.expect(&TokenKind::Assign, "'=' expected")?;
            let value = self.parse_expr()?;
            return Ok(Field::Keyed(key, value));
        }

        let expr = self.parse_expr()?;
        if self.current.kind == TokenKind::Assign {
            if let Expr::Target(Target { name, path }) = &expr {
                if path.is_empty() {
                    let key = Expr::String(Rc::clone(name));
                    self.advance();
                    let value = self.parse_expr()?;
                    return Ok(Field::Keyed(key, value));
                }
            }
        }
        Ok(Field::Positional(expr))
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<()> {
        if &self.current.kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    /// Expects a closing delimiter, naming the opener when it is on an
    /// earlier line.
    fn expect_match(
        &mut self,
        kind: &TokenKind,
        what: &str,
        opener: &str,
        open_line: usize,
    ) -> Result<()> {
        if &self.current.kind == kind {
            self.advance();
            return Ok(());
        }
        if open_line == self.current.line {
            Err(self.error(&format!("{what} expected")))
        } else {
            Err(self.error(&format!(
                "{what} expected (to close {opener} at line {open_line})"
            )))
        }
    }

    fn error(&self, message: &str) -> Error {
        let (message, near) = match &self.current.kind {
            TokenKind::Error(lex_message) => (lex_message.as_str(), self.current.near(self.source)),
            _ => (message, self.current.near(self.source)),
        };
        Error::syntax(format!(
            "{}:{}: {message} near '{near}'",
            self.chunk_name, self.current.line
        ))
    }
}
