//! SSH connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For lab use only.
    Disabled,
}

/// SSH connection configuration.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Hard timeout applied to connect and to every channel send/receive.
    pub timeout: Duration,

    /// Terminal width for the PTY.
    pub terminal_width: u32,

    /// Terminal height for the PTY. Kept tall so devices do not paginate.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Default per-call network timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default PTY width.
    pub const DEFAULT_WIDTH: u32 = 160;

    /// Default PTY height.
    pub const DEFAULT_HEIGHT: u32 = 2048;

    /// Create a configuration with defaults for everything but the endpoint.
    pub fn new(host: impl Into<String>, username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            auth,
            timeout: Self::DEFAULT_TIMEOUT,
            terminal_width: Self::DEFAULT_WIDTH,
            terminal_height: Self::DEFAULT_HEIGHT,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The password, if password authentication is used.
    ///
    /// This is the secret scrubbed from captured output and answered to
    /// `sudo` prompts.
    pub fn password(&self) -> Option<&SecretString> {
        match &self.auth {
            AuthMethod::Password(password) => Some(password),
            _ => None,
        }
    }
}

/// Authentication method for SSH connections.
///
/// Credentials are held as [`SecretString`], so `Debug` output never shows
/// them.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// No authentication (for testing only).
    None,

    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = SshConfig::new("10.0.0.1", "admin", AuthMethod::None);
        assert_eq!(config.port, 22);
        assert_eq!(config.terminal_width, 160);
        assert_eq!(config.terminal_height, 2048);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.socket_addr(), "10.0.0.1:22");
        assert!(config.password().is_none());
    }

    #[test]
    fn test_password_accessor() {
        let config = SshConfig::new("fw", "admin", AuthMethod::Password("hunter2".into()));
        assert_eq!(config.password().map(|p| p.expose_secret()), Some("hunter2"));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let config = SshConfig::new("fw", "admin", AuthMethod::Password("hunter2".into()));
        let shown = format!("{config:?}");
        assert!(shown.contains("admin"));
        assert!(!shown.contains("hunter2"));

        let key = AuthMethod::PrivateKey {
            path: "/home/admin/.ssh/id_ed25519".into(),
            passphrase: Some("opensesame".into()),
        };
        assert!(!format!("{key:?}").contains("opensesame"));
    }
}
