//! Dispatcher configuration.

use crate::echo::EchoTarget;

/// Default number of echoed stack lines kept in history.
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Where echoed stack lines are written.
    pub echo: EchoTarget,
    /// Maximum stack lines kept in the echo history.
    pub history_size: usize,
    /// Whether the printer marks tables it is already rendering.
    pub detect_cycles: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            echo: EchoTarget::Stdout,
            history_size: DEFAULT_HISTORY_SIZE,
            detect_cycles: false,
        }
    }
}

impl DispatcherConfig {
    /// Creates the default configuration: echo to stdout, no cycle detection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to keep stack lines in history only.
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.echo = EchoTarget::None;
        self
    }

    /// Builder method to echo to stderr.
    #[must_use]
    pub fn to_stderr(mut self) -> Self {
        self.echo = EchoTarget::Stderr;
        self
    }

    /// Builder method to set the echo target.
    #[must_use]
    pub fn with_echo(mut self, target: EchoTarget) -> Self {
        self.echo = target;
        self
    }

    /// Builder method to set the history size.
    #[must_use]
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    /// Builder method to enable cycle detection in the printer.
    #[must_use]
    pub fn detect_cycles(mut self) -> Self {
        self.detect_cycles = true;
        self
    }
}
