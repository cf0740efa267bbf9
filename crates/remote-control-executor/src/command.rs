//! Command payload building.

use std::time::Duration;

use thiserror::Error;

/// Remote timeout used when the caller does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Longest timeout the remote side is asked to honour.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Command build error.
#[derive(Debug, Error)]
pub enum CommandBuildError {
    #[error("Command is empty")]
    EmptyCommand,
    #[error("Timeout must be at least one millisecond")]
    ZeroTimeout,
    #[error("Timeout {0:?} exceeds the maximum of {max:?}", max = MAX_TIMEOUT)]
    TimeoutTooLarge(Duration),
}

/// Interpreter the guest runs the command with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShellMode {
    /// Default command interpreter; no marker line.
    #[default]
    Cmd,
    /// PowerShell (`#!ps`).
    PowerShell,
}

impl ShellMode {
    #[must_use]
    pub const fn marker(self) -> Option<&'static str> {
        match self {
            Self::Cmd => None,
            Self::PowerShell => Some("#!ps"),
        }
    }
}

/// Builder for the text of a command-submitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    /// Raw command text.
    pub command: String,
    /// Interpreter selection.
    pub shell: ShellMode,
    /// Remote execution timeout, also the local polling budget.
    pub timeout: Duration,
    /// Cap on captured output characters.
    pub max_length: Option<usize>,
}

impl CommandBuilder {
    /// Create a new command builder.
    #[must_use]
    pub fn new<S: Into<String>>(command: S) -> Self {
        Self {
            command: command.into(),
            shell: ShellMode::default(),
            timeout: DEFAULT_TIMEOUT,
            max_length: None,
        }
    }

    #[must_use]
    pub const fn shell(mut self, shell: ShellMode) -> Self {
        self.shell = shell;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Build the newline-joined payload.
    ///
    /// # Errors
    /// Returns error if the command is blank or the timeout is zero or
    /// above [`MAX_TIMEOUT`].
    pub fn build(&self) -> Result<String, CommandBuildError> {
        if self.command.trim().is_empty() {
            return Err(CommandBuildError::EmptyCommand);
        }
        let timeout_ms = self.timeout.as_millis();
        if timeout_ms == 0 {
            return Err(CommandBuildError::ZeroTimeout);
        }
        if self.timeout > MAX_TIMEOUT {
            return Err(CommandBuildError::TimeoutTooLarge(self.timeout));
        }

        let mut lines: Vec<String> = Vec::with_capacity(4);
        if let Some(marker) = self.shell.marker() {
            lines.push(marker.to_string());
        }
        lines.push(format!("#timeout={timeout_ms}"));
        if let Some(max) = self.max_length {
            lines.push(format!("#maxlength={max}"));
        }
        lines.push(self.command.clone());
        Ok(lines.join("\n"))
    }
}

/// Split captured console output into lines.
///
/// Blank lines are dropped, then the first remaining line (the echoed
/// prompt and command) is dropped.
#[must_use]
pub fn parse_output(data: &str) -> Vec<String> {
    data.lines()
        .filter(|line| !line.trim().is_empty())
        .skip(1)
        .map(str::to_string)
        .collect()
}
