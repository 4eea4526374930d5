//! Builder for creating appliance clients.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::FtdClient;
use crate::error::{Result, SessionError};
use crate::session::{MatchScope, Session, SessionConfig};
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::transport::{ShellChannel, SshShell};

/// Builder for constructing an [`FtdClient`].
///
/// # Example
///
/// ```rust,no_run
/// use ftdshell::FtdClientBuilder;
///
/// # async fn example() -> Result<(), ftdshell::Error> {
/// let mut client = FtdClientBuilder::new("192.168.1.10")
///     .username("admin")
///     .password("secret")
///     .build()?;
///
/// client.connect().await?;
/// client.enter_expert_mode().await?;
/// # Ok(())
/// # }
/// ```
pub struct FtdClientBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    expect_pattern: Option<String>,
    timeout: Duration,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    session: SessionConfig,
}

impl FtdClientBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            expect_pattern: None,
            timeout: SshConfig::DEFAULT_TIMEOUT,
            terminal_width: SshConfig::DEFAULT_WIDTH,
            terminal_height: SshConfig::DEFAULT_HEIGHT,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            session: SessionConfig::default(),
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    ///
    /// The password is also scrubbed from captured output and used to
    /// answer the `sudo su` prompt when entering the expert shell.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// Pattern to wait for after connecting, instead of the default prompt.
    pub fn expect_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.expect_pattern = Some(pattern.into());
        self
    }

    /// Set the network timeout for connect and each channel read or write.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the host key verification mode (default: accept new).
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a known_hosts file other than `~/.ssh/known_hosts`.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Replace the whole session engine configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.session.poll_interval = interval;
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.session.chunk_size = size;
        self
    }

    pub fn max_idle_polls(mut self, polls: u32) -> Self {
        self.session.max_idle_polls = polls;
        self
    }

    pub fn match_scope(mut self, scope: MatchScope) -> Self {
        self.session.match_scope = scope;
        self
    }

    /// Mirror received output to the `ftdshell::capture` log target.
    pub fn debug_capture(mut self, enabled: bool) -> Self {
        self.session.debug_capture = enabled;
        self
    }

    /// Build an SSH client.
    ///
    /// This creates the client but does not connect. Call
    /// [`connect`](FtdClient::connect) on the returned client.
    pub fn build(self) -> Result<FtdClient<SshShell>> {
        self.build_with()
    }

    /// Build a client for another channel type, to be
    /// [`attach`](FtdClient::attach)ed.
    pub fn build_with<C: ShellChannel>(self) -> Result<FtdClient<C>> {
        let username = self.username.ok_or_else(|| SessionError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;

        self.session
            .validate()
            .map_err(|message| SessionError::InvalidConfig { message })?;

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        let mut session = Session::new(self.session, ssh_config.password().cloned());
        if let Some(pattern) = &self.expect_pattern {
            session = session.with_sync_pattern(pattern)?;
        }

        Ok(FtdClient::with_ssh_config(session, ssh_config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_username_required() {
        let err = FtdClientBuilder::new("fw").password("pw").build().unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_invalid_session_config_rejected() {
        let err = FtdClientBuilder::new("fw")
            .username("admin")
            .chunk_size(0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_invalid_expect_pattern_rejected() {
        let err = FtdClientBuilder::new("fw")
            .username("admin")
            .expect_pattern("(unclosed")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Pattern(_)));
    }

    #[test]
    fn test_settings_propagate() {
        let client = FtdClientBuilder::new("10.1.1.1")
            .port(2222)
            .username("admin")
            .password("pw")
            .timeout(Duration::from_secs(9))
            .terminal_size(200, 500)
            .host_key_verification(HostKeyVerification::Disabled)
            .poll_interval(Duration::from_millis(50))
            .max_idle_polls(7)
            .match_scope(MatchScope::Call)
            .debug_capture(true)
            .build()
            .unwrap();

        let ssh = client.ssh_config().unwrap();
        assert_eq!(ssh.socket_addr(), "10.1.1.1:2222");
        assert_eq!(ssh.timeout, Duration::from_secs(9));
        assert_eq!((ssh.terminal_width, ssh.terminal_height), (200, 500));
        assert!(matches!(ssh.host_key_verification, HostKeyVerification::Disabled));

        let config = client.session().config();
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.max_idle_polls, 7);
        assert_eq!(config.match_scope, MatchScope::Call);
        assert!(config.debug_capture);
        assert_eq!(config.chunk_size, 1024);
    }
}
