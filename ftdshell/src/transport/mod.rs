//! Transport layer: the byte channel the session engine drives.
//!
//! The engine only needs an authenticated, bidirectional byte stream that
//! can be polled for readiness. [`ShellChannel`] is that contract;
//! [`SshShell`] implements it on top of a russh interactive shell.

pub mod config;
#[cfg(test)]
pub(crate) mod mock;
mod sftp;
mod shell;
mod ssh;

use std::future::Future;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use sftp::SftpClient;
pub use shell::SshShell;
pub use ssh::SshTransport;

use crate::error::Result;

/// An interactive byte channel with non-blocking readiness polls.
///
/// Readiness checks never wait. `send` and `recv` may wait, but only after
/// the matching readiness check reported `true`.
pub trait ShellChannel: Send {
    /// Whether a `send` would be accepted right now.
    fn send_ready(&mut self) -> bool;

    /// Whether received data is waiting to be read.
    fn recv_ready(&mut self) -> bool;

    /// Write all of `data` to the channel.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Read at most `max` bytes.
    fn recv(&mut self, max: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Close the channel.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
