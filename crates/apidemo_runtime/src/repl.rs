//! The main REPL implementation.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use apidemo_foundation::{Error, ErrorContext, ErrorKind, Result};
use tracing::debug;

use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::session::{Outcome, Session};

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// Session state (dispatcher, variables).
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Primary prompt.
    prompt: String,

    /// Continuation prompt (for calls spanning lines).
    continuation_prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a REPL with the given editor.
    pub fn with_editor(editor: E) -> Self {
        Self {
            editor,
            session: Session::new(),
            show_banner: true,
            prompt: "api> ".to_string(),
            continuation_prompt: ".... ".to_string(),
        }
    }

    /// Sets the session for this REPL.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the primary prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the session mutably.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Consumes the REPL, returning its session.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Runs the REPL loop until end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            Self::print_banner();
        }
        self.editor.set_keywords(self.session.completions());

        while self.read_eval_print()? {}

        println!();
        Ok(())
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` to exit.
    fn read_eval_print(&mut self) -> Result<bool> {
        let Some(input) = self.read_input()? else {
            return Ok(false);
        };
        if input.trim().is_empty() {
            return Ok(true);
        }

        self.editor.add_history(&input);
        if let Err(e) = self.eval_and_print(&input) {
            print_error(&e);
        }
        self.editor.set_keywords(self.session.completions());
        Ok(true)
    }

    /// Reads one command, which may span lines while parentheses are open.
    fn read_input(&mut self) -> Result<Option<String>> {
        let mut input = String::new();
        let mut first_line = true;

        loop {
            let prompt = if first_line {
                &self.prompt
            } else {
                &self.continuation_prompt
            };

            match self.editor.read_line(prompt)? {
                ReadResult::Line(line) => {
                    if !first_line {
                        input.push('\n');
                    }
                    input.push_str(&line);
                    if is_complete(&input) {
                        return Ok(Some(input));
                    }
                    first_line = false;
                }
                ReadResult::Interrupted => {
                    if !first_line {
                        println!("\nInput cancelled.");
                    }
                    return Ok(Some(String::new()));
                }
                ReadResult::Eof => {
                    if first_line {
                        return Ok(None);
                    }
                    return Err(Error::new(ErrorKind::Syntax(
                        "unexpected end of input in unfinished command".to_string(),
                    )));
                }
            }
        }
    }

    /// Evaluates one command.
    ///
    /// # Errors
    ///
    /// Returns parse errors and anything the command raises.
    pub fn eval(&mut self, input: &str) -> Result<Outcome> {
        self.session.eval_line(input)
    }

    /// Evaluates one command and prints its outcome and any `print` output.
    ///
    /// # Errors
    ///
    /// Returns parse errors and anything the command raises. Output captured
    /// before the failure is still printed.
    pub fn eval_and_print(&mut self, input: &str) -> Result<()> {
        let result = self.eval(input);
        for line in self.session.take_output() {
            println!("{line}");
        }
        match result? {
            Outcome::Nothing => {}
            Outcome::Machine(handle) => println!("\x1b[1m{handle}\x1b[0m"),
            Outcome::Value(value) => {
                let text = self.session.dispatcher().render_value(&value);
                println!("\x1b[1m{text}\x1b[0m");
            }
            Outcome::Text(text) => print!("{}", with_newline(&text)),
        }
        Ok(())
    }

    /// Runs every command in a script.
    ///
    /// A failing command is reported with its file and line, and the script
    /// continues. Returns the number of commands that failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or ends inside an
    /// unfinished command.
    pub fn eval_file(&mut self, path: &Path) -> Result<usize> {
        let source = fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorKind::Io(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        })?;
        let name = path.display().to_string();
        self.eval_source(&source, &name)
    }

    /// Runs every command in `source`; `name` labels errors.
    ///
    /// # Errors
    ///
    /// Returns an error if `source` ends inside an unfinished command.
    pub fn eval_source(&mut self, source: &str, name: &str) -> Result<usize> {
        let mut failures = 0;
        let mut pending = String::new();
        let mut start_line = 1;

        for (i, line) in source.lines().enumerate() {
            if pending.is_empty() {
                start_line = i + 1;
            } else {
                pending.push('\n');
            }
            pending.push_str(line);
            if !is_complete(&pending) {
                continue;
            }

            let command = std::mem::take(&mut pending);
            if let Err(e) = self.eval_and_print(&command) {
                let e = e.with_context(
                    ErrorContext::new()
                        .with_source(name)
                        .with_position(start_line, 1),
                );
                print_error(&e);
                failures += 1;
            }
        }

        if !pending.trim().is_empty() {
            return Err(Error::syntax("unfinished command at end of file")
                .with_context(ErrorContext::new().with_source(name).with_position(start_line, 1)));
        }
        debug!(source = name, failures, "script finished");
        Ok(failures)
    }

    /// Prints the welcome banner.
    fn print_banner() {
        println!("\x1b[1;36mapidemo\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
        println!("Drive simulated Lua states one C API call at a time.");
        println!("Start with `L = luaL_newstate()`; type `help` for the operation list.");
        println!("Use Ctrl+D to exit.\n");
        let _ = io::stdout().flush();
    }
}

/// Returns true if every parenthesis outside string literals and comments
/// is closed. A string literal ends at the end of its line.
#[must_use]
pub fn is_complete(input: &str) -> bool {
    let mut depth = 0i32;
    let mut quote = None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' {
                    chars.next();
                } else if c == q || c == '\n' {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '-' if chars.peek() == Some(&'-') => {
                    while chars.next_if(|&n| n != '\n').is_some() {}
                }
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            },
        }
    }

    depth <= 0
}

fn with_newline(text: &str) -> Cow<'_, str> {
    if text.ends_with('\n') {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{text}\n"))
    }
}

fn print_error(error: &Error) {
    match &error.context {
        Some(context) if context.source.is_some() => {
            eprintln!("\x1b[31mError: {error}\x1b[0m ({context})");
        }
        _ => eprintln!("\x1b[31mError: {error}\x1b[0m"),
    }
}
