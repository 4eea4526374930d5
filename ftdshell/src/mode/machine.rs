//! Tracks the current mode and runs transition procedures.

use log::{debug, trace};

use super::{Mode, Procedure, StepInput, TransitionTable};
use crate::error::{Result, SessionError};
use crate::session::{Response, Session};
use crate::transport::ShellChannel;

/// The appliance's mode state machine.
///
/// Starts in [`Mode::Regular`]. Only [`ModeMachine::enter`] changes the
/// current mode, and only after the whole procedure has been sent.
#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    current: Mode,
    table: TransitionTable,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom transition table.
    pub fn with_table(table: TransitionTable) -> Self {
        Self {
            current: Mode::Regular,
            table,
        }
    }

    /// The mode the device is believed to be in.
    pub fn current(&self) -> Mode {
        self.current
    }

    /// Forget the current mode, as after a fresh login.
    pub fn reset(&mut self) {
        self.current = Mode::Regular;
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Move the device to `target`.
    ///
    /// Sends nothing when already there. Steps that time out do not stop the
    /// procedure; a transport error does, and leaves the current mode as it
    /// was.
    pub async fn enter<C: ShellChannel>(
        &mut self,
        session: &mut Session<C>,
        target: Mode,
    ) -> Result<Vec<Response>> {
        if self.current == target {
            debug!("already in {} mode", target);
            return Ok(Vec::new());
        }

        let procedure = self
            .table
            .get(self.current, target)
            .ok_or_else(|| SessionError::NoTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            })?;

        debug!(
            "mode {} -> {} ({} steps)",
            self.current,
            target,
            procedure.len()
        );
        let responses = run(procedure, session).await?;

        self.current = target;
        Ok(responses)
    }
}

async fn run<C: ShellChannel>(
    procedure: &Procedure,
    session: &mut Session<C>,
) -> Result<Vec<Response>> {
    let mut responses: Vec<Response> = Vec::with_capacity(procedure.len());
    // Output of the step just before, None if it was skipped
    let mut previous: Option<usize> = None;

    for step in procedure.steps() {
        if let Some(guard) = &step.guard {
            let proceed = previous.is_some_and(|i| guard.is_match(&responses[i].result));
            if !proceed {
                trace!("skipping {:?}", step.input.to_string());
                previous = None;
                continue;
            }
        }

        debug!("step {:?}", step.input.to_string());
        let response = match &step.input {
            StepInput::Command(command) => session.send_command_with(command, &step.expect).await?,
            StepInput::Blank => session.send_command_with("", &step.expect).await?,
            StepInput::Secret => session.send_secret(&step.expect).await?,
        };
        if !response.is_success() {
            debug!("step {:?} ended with {:?}", response.command, response.outcome);
        }

        responses.push(response);
        previous = Some(responses.len() - 1);
    }

    Ok(responses)
}
