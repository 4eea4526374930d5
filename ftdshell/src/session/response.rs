//! Response type for command execution results.

use std::fmt;
use std::time::Duration;

/// Which wait ran into its idle-poll ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the initial prompt after the shell opened.
    Connect,
    /// Waiting for the channel to accept a write.
    SendReady,
    /// Waiting for output that matches the expect pattern.
    ReceiveReady,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Connect => "connect",
            Phase::SendReady => "send-ready",
            Phase::ReceiveReady => "receive-ready",
        };
        f.write_str(name)
    }
}

/// How a wait ended.
///
/// A timeout is a soft failure: the session is still attached and usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The expect pattern matched.
    Matched,
    /// The idle-poll ceiling was reached.
    TimedOut(Phase),
}

impl Outcome {
    /// Whether the expect pattern matched.
    pub fn is_matched(&self) -> bool {
        matches!(self, Outcome::Matched)
    }
}

/// Response from a command execution.
#[derive(Debug, Clone)]
#[must_use]
pub struct Response {
    /// The command that was sent (masked if it was the secret).
    pub command: String,

    /// Text received during this call, with the secret redacted.
    ///
    /// On a timeout this holds whatever arrived before giving up.
    pub result: String,

    /// Final line of `result` when the pattern matched.
    pub prompt: Option<String>,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Whether the expect pattern matched or a wait timed out.
    pub outcome: Outcome,
}

impl Response {
    /// Create a response for a matched expect pattern.
    pub fn matched(
        command: impl Into<String>,
        result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            prompt: Some(prompt.into()),
            elapsed,
            outcome: Outcome::Matched,
        }
    }

    /// Create a response for a wait that hit its idle-poll ceiling.
    pub fn timed_out(
        command: impl Into<String>,
        partial: impl Into<String>,
        phase: Phase,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: partial.into(),
            prompt: None,
            elapsed,
            outcome: Outcome::TimedOut(phase),
        }
    }

    /// Check if the expect pattern matched.
    pub fn is_success(&self) -> bool {
        self.outcome.is_matched()
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.result)
    }
}
