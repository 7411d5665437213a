//! Syntax highlighting for command lines.

use std::borrow::Cow;

use apidemo_host::consts::named_constant;

use crate::session::COMMANDS;

const RESET: &str = "\x1b[0m";
const COMMENT: &str = "\x1b[2;3m";
const STRING: &str = "\x1b[33m";
const NUMBER: &str = "\x1b[35m";
const OPERATION: &str = "\x1b[32m";
const CONSTANT: &str = "\x1b[36m";
const LITERAL: &str = "\x1b[34m";
const COMMAND: &str = "\x1b[1;32m";
const DELIMITER: &str = "\x1b[1m";

/// Highlighter for the command language.
#[derive(Debug, Default)]
pub struct CommandHighlighter;

impl CommandHighlighter {
    /// Creates a new highlighter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Highlights a line of input.
    #[allow(clippy::unused_self)]
    pub fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let mut result = String::with_capacity(line.len() * 2);
        let mut chars = line.char_indices().peekable();
        let mut first_word = true;

        while let Some((at, c)) = chars.next() {
            match c {
                '-' if line[at..].starts_with("--") => {
                    result.push_str(COMMENT);
                    result.push_str(&line[at..]);
                    result.push_str(RESET);
                    return Cow::Owned(result);
                }

                '\'' | '"' => {
                    result.push_str(STRING);
                    result.push(c);
                    while let Some((_, next)) = chars.next() {
                        result.push(next);
                        if next == '\\' {
                            if let Some((_, escaped)) = chars.next() {
                                result.push(escaped);
                            }
                        } else if next == c {
                            break;
                        }
                    }
                    result.push_str(RESET);
                }

                c if c.is_ascii_digit()
                    || (c == '-' && line[at + 1..].starts_with(|d: char| d.is_ascii_digit())) =>
                {
                    result.push_str(NUMBER);
                    result.push(c);
                    while let Some(&(_, next)) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '.' {
                            result.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    result.push_str(RESET);
                }

                '(' | ')' => {
                    result.push_str(DELIMITER);
                    result.push(c);
                    result.push_str(RESET);
                }

                c if c.is_ascii_alphabetic() || c == '_' => {
                    let mut end = at + c.len_utf8();
                    while let Some(&(i, next)) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            end = i + next.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let word = &line[at..end];
                    let color = word_color(word, first_word);
                    first_word = false;
                    if color.is_empty() {
                        result.push_str(word);
                    } else {
                        result.push_str(color);
                        result.push_str(word);
                        result.push_str(RESET);
                    }
                }

                _ => result.push(c),
            }
        }

        Cow::Owned(result)
    }
}

fn word_color(word: &str, first_word: bool) -> &'static str {
    match word {
        "true" | "false" | "nil" => LITERAL,
        _ if word.starts_with("lua_") || word.starts_with("luaL_") => OPERATION,
        _ if first_word && COMMANDS.contains(&word) => COMMAND,
        _ if named_constant(word).is_some() => CONSTANT,
        _ => "",
    }
}
