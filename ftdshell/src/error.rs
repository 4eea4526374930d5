//! Error types for ftdshell.

use std::io;
use thiserror::Error;

/// Main error type for ftdshell operations.
///
/// Soft synchronization timeouts are not errors; they are reported through
/// [`Outcome`](crate::session::Outcome) so that the session stays usable.
#[derive(Error, Debug)]
pub enum Error {
    /// Failures raised by the byte channel or the SSH layer beneath it.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// An expect pattern failed to compile.
    #[error("Invalid expect pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Session lifecycle misuse.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// File transfer errors.
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Debug capture setup errors.
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
}

/// Transport layer errors (SSH connection, authentication, channel I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts and strict checking is on
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// The shell channel was closed by the remote end
    #[error("Channel closed")]
    Closed,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Session lifecycle errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// No channel attached
    #[error("Session not connected - call connect() first")]
    NotConnected,

    /// A channel is already attached
    #[error("Session already connected")]
    AlreadyConnected,

    /// Invalid configuration in the client builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The transition table has no procedure for this pair of modes
    #[error("No transition from {from} to {to}")]
    NoTransition { from: String, to: String },
}

/// SFTP transfer errors.
#[derive(Error, Debug)]
pub enum TransferError {
    /// SFTP protocol error
    #[error("SFTP error: {0}")]
    Sftp(#[from] russh_sftp::client::error::Error),

    /// Local or remote file I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Debug capture setup errors.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The capture file could not be opened
    #[error("Failed to open capture file: {0}")]
    Io(#[from] io::Error),

    /// A global logger was already installed
    #[error("Logger already installed: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// Result type alias using ftdshell's Error.
pub type Result<T> = std::result::Result<T, Error>;
