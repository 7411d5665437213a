//! The echo sink for rendered stack lines.
//!
//! Every successful operation produces exactly one line. The sink writes it
//! to its target and keeps the most recent lines in a ring buffer, so the
//! REPL and tests can look back without capturing process output.

use std::collections::VecDeque;
use std::io::{self, Write};

// =============================================================================
// Echo Target
// =============================================================================

/// Where echoed lines are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EchoTarget {
    /// History only.
    None,
    /// Write to stdout.
    #[default]
    Stdout,
    /// Write to stderr.
    Stderr,
}

// =============================================================================
// Stack Echo
// =============================================================================

/// Receives rendered stack lines.
#[derive(Clone, Debug)]
pub struct StackEcho {
    target: EchoTarget,
    /// Lines, oldest first.
    lines: VecDeque<String>,
    max_size: usize,
    /// Lines emitted over the sink's lifetime, evicted ones included.
    emitted: u64,
}

impl StackEcho {
    /// Creates a sink keeping at most `max_size` lines.
    #[must_use]
    pub fn new(target: EchoTarget, max_size: usize) -> Self {
        Self {
            target,
            lines: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
            emitted: 0,
        }
    }

    /// Returns the current target.
    #[must_use]
    pub fn target(&self) -> EchoTarget {
        self.target
    }

    /// Changes the target.
    pub fn set_target(&mut self, target: EchoTarget) {
        self.target = target;
    }

    /// Writes `line` to the target and records it.
    pub fn emit(&mut self, line: String) {
        match self.target {
            EchoTarget::None => {}
            EchoTarget::Stdout => {
                let _ = writeln!(io::stdout(), "{line}");
            }
            EchoTarget::Stderr => {
                let _ = writeln!(io::stderr(), "{line}");
            }
        }
        self.emitted += 1;
        self.lines.push_back(line);
        while self.lines.len() > self.max_size {
            self.lines.pop_front();
        }
    }

    /// Returns the most recent line.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Returns the most recent `count` lines, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<&str> {
        let skip = self.lines.len().saturating_sub(count);
        self.lines.iter().skip(skip).map(String::as_str).collect()
    }

    /// Returns the number of lines held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if no lines are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns how many lines were ever emitted.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Drops the history. The emitted count keeps increasing.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Returns an iterator over the held lines, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

impl Default for StackEcho {
    fn default() -> Self {
        Self::new(EchoTarget::default(), crate::config::DEFAULT_HISTORY_SIZE)
    }
}
