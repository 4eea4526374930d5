//! High-level client for firewall appliances.
//!
//! [`FtdClient`] ties the session engine to the mode state machine: commands
//! go straight to the session, and the `enter_*_mode` operations walk the
//! device between its CLI contexts.

mod builder;

pub use builder::FtdClientBuilder;

use std::fmt;

use log::debug;

use crate::error::{Result, SessionError};
use crate::mode::{Mode, ModeMachine};
use crate::session::{Outcome, Response, Session};
use crate::transport::{ShellChannel, SftpClient, SshConfig, SshShell};

/// A client for one appliance.
pub struct FtdClient<C: ShellChannel = SshShell> {
    ssh_config: Option<SshConfig>,
    session: Session<C>,
    modes: ModeMachine,
}

impl FtdClient<SshShell> {
    /// Start building an SSH client for `host`.
    pub fn builder(host: impl Into<String>) -> FtdClientBuilder {
        FtdClientBuilder::new(host)
    }

    /// Open the SSH shell and wait for the first prompt.
    ///
    /// A silent device is not an error: the returned outcome is
    /// [`Outcome::TimedOut`] and the client stays connected.
    pub async fn connect(&mut self) -> Result<Outcome> {
        if self.session.is_open() {
            return Err(SessionError::AlreadyConnected.into());
        }
        let config = self
            .ssh_config
            .clone()
            .ok_or_else(|| SessionError::InvalidConfig {
                message: "No SSH configuration".to_string(),
            })?;

        debug!("connecting to {}", config.socket_addr());
        let shell = SshShell::open(config).await?;
        self.attach(shell).await
    }

    /// Open an SFTP connection to the same device with the same credentials.
    pub async fn sftp(&self) -> Result<SftpClient> {
        let config = self
            .ssh_config
            .clone()
            .ok_or_else(|| SessionError::InvalidConfig {
                message: "No SSH configuration".to_string(),
            })?;
        SftpClient::connect(config).await
    }
}

impl<C: ShellChannel> FtdClient<C> {
    /// Wrap an existing session. The client starts in [`Mode::Regular`].
    pub fn new(session: Session<C>) -> Self {
        Self {
            ssh_config: None,
            session,
            modes: ModeMachine::new(),
        }
    }

    pub(crate) fn with_ssh_config(session: Session<C>, ssh_config: SshConfig) -> Self {
        Self {
            ssh_config: Some(ssh_config),
            ..Self::new(session)
        }
    }

    /// Attach an already open channel and wait for the first prompt.
    pub async fn attach(&mut self, channel: C) -> Result<Outcome> {
        if self.session.is_open() {
            return Err(SessionError::AlreadyConnected.into());
        }
        self.modes.reset();
        self.session.attach(channel).await
    }

    /// Close the channel. Idempotent.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.modes.reset();
        self.session.close().await
    }

    /// Send a command and wait for the default prompt.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        self.session.send_command(command).await
    }

    /// Send a command and wait for `pattern`.
    pub async fn send_command_expect(&mut self, command: &str, pattern: &str) -> Result<Response> {
        self.session.send_command_expect(command, pattern).await
    }

    /// Move the device to `mode`, returning the response of every step sent.
    pub async fn enter_mode(&mut self, mode: Mode) -> Result<Vec<Response>> {
        self.modes.enter(&mut self.session, mode).await
    }

    pub async fn enter_regular_mode(&mut self) -> Result<Vec<Response>> {
        self.enter_mode(Mode::Regular).await
    }

    pub async fn enter_diagnostic_cli_mode(&mut self) -> Result<Vec<Response>> {
        self.enter_mode(Mode::DiagnosticCli).await
    }

    pub async fn enter_lina_mode(&mut self) -> Result<Vec<Response>> {
        self.enter_mode(Mode::Lina).await
    }

    pub async fn enter_expert_mode(&mut self) -> Result<Vec<Response>> {
        self.enter_mode(Mode::Expert).await
    }

    pub async fn enter_clish_mode(&mut self) -> Result<Vec<Response>> {
        self.enter_mode(Mode::Clish).await
    }

    /// The mode the device is believed to be in.
    pub fn mode(&self) -> Mode {
        self.modes.current()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_open()
    }

    /// The final line of the last matched response.
    pub fn last_prompt(&self) -> Option<&str> {
        self.session.last_prompt()
    }

    /// Everything received since connecting, with the password redacted.
    pub fn history(&self) -> &str {
        self.session.history()
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn ssh_config(&self) -> Option<&SshConfig> {
        self.ssh_config.as_ref()
    }
}

impl<C: ShellChannel> fmt::Debug for FtdClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtdClient")
            .field("host", &self.ssh_config.as_ref().map(|c| c.socket_addr()))
            .field("mode", &self.modes.current())
            .field("session", &self.session)
            .finish()
    }
}
