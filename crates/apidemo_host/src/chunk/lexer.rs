//! Lexer for chunks and command lines.
//!
//! Produces Lua-style tokens: names, numbers, quoted and long strings, and
//! punctuation. Anything the chunk grammar does not use is still tokenized
//! (as [`TokenKind::Other`] or [`TokenKind::Reserved`]) so the parser can
//! report it by its source text.

use apidemo_foundation::number::str_to_number;

/// A token with its source location.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Byte offset where the token starts.
    pub start: usize,
    /// Byte offset where the token ends (exclusive).
    pub end: usize,
    /// 1-based line of the token start.
    pub line: usize,
}

impl Token {
    /// Returns the text this token covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Text used after `near` in syntax errors.
    #[must_use]
    pub fn near(&self, source: &str) -> String {
        match &self.kind {
            TokenKind::Eof => "<eof>".to_string(),
            _ => self.text(source).to_string(),
        }
    }
}

/// Token types.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// An identifier.
    Name(String),
    /// A numeric literal.
    Number(f64),
    /// A string literal, escapes resolved.
    String(String),
    /// `nil`
    Nil,
    /// `true`
    True,
    /// `false`
    False,
    /// `return`
    Return,
    /// Any other reserved word.
    Reserved(&'static str),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `=`
    Assign,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `-`
    Minus,
    /// Operators the grammar does not use (`+`, `==`, `..`, ...).
    Other(String),
    /// End of input.
    Eof,
    /// Lexer error; the token text is what the error is "near".
    Error(String),
}

const RESERVED: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "for", "function", "if", "in", "local", "not",
    "or", "repeat", "then", "until", "while",
];

/// Returns true if `s` is a reserved word.
#[must_use]
pub fn is_reserved(s: &str) -> bool {
    matches!(s, "nil" | "true" | "false" | "return") || RESERVED.contains(&s)
}

/// Returns true if `s` is a valid identifier: non-empty ASCII letters,
/// digits, and underscores, not starting with a digit, not reserved.
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_reserved(s)
}

/// Lexer over a source string.
pub struct Lexer<'src> {
    source: &'src str,
    position: usize,
    line: usize,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
        }
    }

    /// Returns the next token. After the end of input every call returns
    /// [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Token {
        if let Some(error) = self.skip_trivia() {
            return error;
        }

        let start = self.position;
        let line = self.line;
        let Some(c) = self.peek() else {
            return Token {
                kind: TokenKind::Eof,
                start,
                end: start,
                line,
            };
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ']' => self.single(TokenKind::RBracket),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            '-' => self.single(TokenKind::Minus),
            '[' => match self.long_bracket_level() {
                Some(level) => self.scan_long_string(level),
                None => self.single(TokenKind::LBracket),
            },
            '=' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Other("==".to_string())
                } else {
                    TokenKind::Assign
                }
            }
            '.' => {
                if self.peek_n(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number()
                } else {
                    self.advance();
                    let mut text = ".".to_string();
                    while self.peek() == Some('.') && text.len() < 3 {
                        self.advance();
                        text.push('.');
                    }
                    if text == "." {
                        TokenKind::Dot
                    } else {
                        TokenKind::Other(text)
                    }
                }
            }
            '"' | '\'' => self.scan_string(c),
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_name(),
            '<' | '>' | '~' => {
                self.advance();
                let mut text = c.to_string();
                if self.peek() == Some('=') {
                    self.advance();
                    text.push('=');
                }
                TokenKind::Other(text)
            }
            c => {
                self.advance();
                TokenKind::Other(c.to_string())
            }
        };

        Token {
            kind,
            start,
            end: self.position,
            line,
        }
    }

    /// Tokenizes all source, including the final `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = matches!(token.kind, TokenKind::Eof | TokenKind::Error(_));
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn peek_n(&self, n: usize) -> Option<char> {
        self.source[self.position..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn error_token(&self, start: usize, line: usize, message: &str) -> Token {
        Token {
            kind: TokenKind::Error(message.to_string()),
            start,
            end: self.position,
            line,
        }
    }

    /// Skips whitespace and comments. Returns an error token for an
    /// unfinished long comment.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('-') if self.peek_n(1) == Some('-') => {
                    let start = self.position;
                    let line = self.line;
                    self.advance();
                    self.advance();
                    if let Some(level) = self.long_bracket_level() {
                        if self.read_long_bracket(level).is_none() {
                            return Some(self.error_token(start, line, "unfinished long comment"));
                        }
                    } else {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                }
                _ => return None,
            }
        }
    }

    /// If the input starts with `[[` or `[=...=[`, returns the level.
    fn long_bracket_level(&self) -> Option<usize> {
        let rest = &self.source[self.position..];
        let after = rest.strip_prefix('[')?;
        let level = after.chars().take_while(|&c| c == '=').count();
        after[level..].starts_with('[').then_some(level)
    }

    /// Reads a long bracket body; `None` if it is never closed.
    fn read_long_bracket(&mut self, level: usize) -> Option<String> {
        for _ in 0..level + 2 {
            self.advance();
        }
        // A newline right after the opening bracket is skipped.
        if self.peek() == Some('\r') {
            self.advance();
        }
        if self.peek() == Some('\n') {
            self.advance();
        }
        let close = format!("]{}]", "=".repeat(level));
        let body_start = self.position;
        let offset = self.source[body_start..].find(&close)?;
        while self.position < body_start + offset {
            self.advance();
        }
        let body = self.source[body_start..self.position].to_string();
        for _ in 0..close.len() {
            self.advance();
        }
        Some(body)
    }

    fn scan_long_string(&mut self, level: usize) -> TokenKind {
        match self.read_long_bracket(level) {
            Some(body) => TokenKind::String(body),
            None => {
                self.position = self.source.len();
                TokenKind::Error("unfinished long string".to_string())
            }
        }
    }

    fn scan_name(&mut self) -> TokenKind {
        let start = self.position;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let text = &self.source[start..self.position];
        match text {
            "nil" => TokenKind::Nil,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "return" => TokenKind::Return,
            _ => match RESERVED.iter().find(|r| **r == text) {
                Some(word) => TokenKind::Reserved(word),
                None => TokenKind::Name(text.to_string()),
            },
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.advance();
        }
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        match str_to_number(&self.source[start..self.position]) {
            Some(n) => TokenKind::Number(n),
            None => TokenKind::Error("malformed number".to_string()),
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        self.advance();
        let mut text = String::new();
        loop {
            match self.peek() {
                None | Some('\n' | '\r') => {
                    return TokenKind::Error("unfinished string".to_string());
                }
                Some(c) if c == quote => {
                    self.advance();
                    return TokenKind::String(text);
                }
                Some('\\') => {
                    self.advance();
                    match self.scan_escape() {
                        Ok(c) => text.push(c),
                        Err(message) => return TokenKind::Error(message),
                    }
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }
    }

    fn scan_escape(&mut self) -> Result<char, String> {
        let Some(c) = self.advance() else {
            return Err("unfinished string".to_string());
        };
        let escaped = match c {
            'n' | '\n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            d if d.is_ascii_digit() => {
                let mut code = d.to_digit(10).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(10)) {
                        Some(digit) => {
                            code = code * 10 + digit;
                            self.advance();
                        }
                        None => break,
                    }
                }
                if code > 255 {
                    return Err("escape sequence too large".to_string());
                }
                char::from_u32(code).unwrap_or('\u{fffd}')
            }
            other => other,
        };
        Ok(escaped)
    }
}
