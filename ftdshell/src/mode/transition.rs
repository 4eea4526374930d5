//! Declarative transition procedures between modes.
//!
//! Every ordered pair of distinct modes maps to a [`Procedure`]: a list of
//! [`Step`]s, each a line to send and the pattern that ends its wait.
//! Conditional sub-dialogs (answering `enable` or `sudo su` with a password)
//! are expressed as guards on the step rather than as code.

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;

use super::Mode;
use crate::channel::MASK;
use crate::channel::patterns::{
    DEFAULT_PROMPT_RE, EXPERT_SHELL_RE, PASSWORD_OR_PRIVILEGED_RE, PASSWORD_PROMPT_RE,
    UNPRIVILEGED_PROMPT_RE,
};

/// What a step writes to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    /// A literal command line.
    Command(String),
    /// An empty line.
    Blank,
    /// The session secret, answering a password prompt.
    Secret,
}

impl fmt::Display for StepInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepInput::Command(command) => f.write_str(command),
            StepInput::Blank => Ok(()),
            StepInput::Secret => f.write_str(MASK),
        }
    }
}

/// One line of a transition procedure.
#[derive(Debug, Clone)]
pub struct Step {
    pub input: StepInput,

    /// Pattern that ends the wait for this step's output.
    pub expect: Regex,

    /// When set, the step only runs if the previous step ran and its output
    /// matches.
    pub guard: Option<Regex>,
}

impl Step {
    /// A command expecting the default prompt.
    pub fn command(command: impl Into<String>) -> Self {
        Self::new(StepInput::Command(command.into()))
    }

    /// An empty line expecting the default prompt.
    ///
    /// Sent as an empty command, so the device receives a single `\n`.
    /// Sending `"\n"` as a command instead would write two newlines and
    /// bring back two prompts.
    pub fn blank() -> Self {
        Self::new(StepInput::Blank)
    }

    /// The session secret expecting the default prompt.
    pub fn secret() -> Self {
        Self::new(StepInput::Secret)
    }

    fn new(input: StepInput) -> Self {
        Self {
            input,
            expect: DEFAULT_PROMPT_RE.clone(),
            guard: None,
        }
    }

    /// Wait for `pattern` instead of the default prompt.
    pub fn expecting(mut self, pattern: &Regex) -> Self {
        self.expect = pattern.clone();
        self
    }

    /// Only run when the previous step's output matches `guard`.
    pub fn when(mut self, guard: &Regex) -> Self {
        self.guard = Some(guard.clone());
        self
    }
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default)]
pub struct Procedure {
    steps: Vec<Step>,
}

impl Procedure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn then(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append every step of `other`.
    pub fn chain(mut self, other: Procedure) -> Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every line the procedure may send, ignoring guards.
    pub fn lines(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.input.to_string()).collect()
    }
}

/// `exit` repeated `count` times.
fn exits(count: usize) -> Procedure {
    (0..count).fold(Procedure::new(), |p, _| p.then(Step::command("exit")))
}

/// Leave `mode` for the regular shell.
fn exit_to_regular(mode: Mode) -> Procedure {
    exits(mode.exit_depth())
}

/// `enable` when the prompt is unprivileged, a blank line if it asks for a
/// password, then disable paging.
fn privileged_console(launch: &str) -> Procedure {
    Procedure::new()
        .then(Step::command(launch))
        .then(
            Step::command("enable")
                .expecting(&PASSWORD_OR_PRIVILEGED_RE)
                .when(&UNPRIVILEGED_PROMPT_RE),
        )
        .then(Step::blank().when(&PASSWORD_PROMPT_RE))
        .then(Step::command("terminal pager 0"))
}

fn enter_diagnostic_cli() -> Procedure {
    privileged_console("system support diagnostic-cli")
}

fn sfconsole() -> Procedure {
    privileged_console("sfconsole")
}

fn enter_expert() -> Procedure {
    Procedure::new()
        .then(Step::command("expert"))
        .then(
            Step::command("sudo su")
                .expecting(&PASSWORD_OR_PRIVILEGED_RE)
                .when(&EXPERT_SHELL_RE),
        )
        .then(Step::secret().when(&PASSWORD_PROMPT_RE))
}

fn enter_clish() -> Procedure {
    enter_expert().then(Step::command("clish"))
}

fn enter_lina() -> Procedure {
    enter_expert().chain(sfconsole())
}

/// Reach `mode` from the regular shell.
fn enter_from_regular(mode: Mode) -> Procedure {
    match mode {
        Mode::Regular => Procedure::new(),
        Mode::DiagnosticCli => enter_diagnostic_cli(),
        Mode::Lina => enter_lina(),
        Mode::Expert => enter_expert(),
        Mode::Clish => enter_clish(),
    }
}

fn procedure_for(from: Mode, to: Mode) -> Procedure {
    match (from, to) {
        (Mode::Regular, to) => enter_from_regular(to),
        (from, Mode::Regular) => exit_to_regular(from),

        // Shortcuts between the expert shell and the shells launched from it
        (Mode::Lina, Mode::Expert) => exits(2),
        (Mode::Lina, Mode::Clish) => exits(2).then(Step::command("clish")),
        (Mode::Expert, Mode::Lina) => sfconsole(),
        (Mode::Expert, Mode::Clish) => Procedure::new().then(Step::command("clish")),
        (Mode::Clish, Mode::Lina) => exits(1).chain(sfconsole()),
        (Mode::Clish, Mode::Expert) => exits(1),

        (from, to) => exit_to_regular(from).chain(enter_from_regular(to)),
    }
}

/// Procedures for every ordered pair of distinct modes.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    procedures: IndexMap<(Mode, Mode), Procedure>,
}

impl TransitionTable {
    /// The appliance's transition table.
    pub fn new() -> Self {
        let mut procedures = IndexMap::new();
        for from in Mode::ALL {
            for to in Mode::ALL {
                if from != to {
                    procedures.insert((from, to), procedure_for(from, to));
                }
            }
        }
        Self { procedures }
    }

    /// A table with no procedures, to be filled with
    /// [`with_procedure`](Self::with_procedure).
    pub fn empty() -> Self {
        Self {
            procedures: IndexMap::new(),
        }
    }

    /// Replace the procedure for one pair.
    pub fn with_procedure(mut self, from: Mode, to: Mode, procedure: Procedure) -> Self {
        self.procedures.insert((from, to), procedure);
        self
    }

    /// The procedure leading from `from` to `to`.
    pub fn get(&self, from: Mode, to: Mode) -> Option<&Procedure> {
        self.procedures.get(&(from, to))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(Mode, Mode), &Procedure)> {
        self.procedures.iter()
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new()
    }
}
