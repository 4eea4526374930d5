//! # ftdshell
//!
//! Async SSH session engine and CLI mode state machine for firewall
//! appliance automation.
//!
//! The appliance only offers a prompt-driven console, so automation works
//! the way an operator does: send a line, wait for the prompt to come back,
//! and walk through the right escalation commands before issuing the real
//! one.
//!
//! ## Features
//!
//! - Expect-pattern session engine over any [`ShellChannel`], with bounded
//!   polling and soft timeouts reported as [`Outcome`]
//! - SSH shell adapter via russh (PTY 160x2048, host key verification,
//!   password or key authentication)
//! - Mode state machine covering every move between the regular,
//!   diagnostic CLI, lina, expert and clish contexts
//! - Password redaction in every captured output
//! - SFTP get/put with progress callbacks
//! - Optional capture of raw device output to a log file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ftdshell::FtdClientBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ftdshell::Error> {
//!     let mut client = FtdClientBuilder::new("192.168.1.10")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     client.connect().await?;
//!
//!     client.enter_lina_mode().await?;
//!     let response = client.send_command("show version").await?;
//!     println!("{}", response.result);
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod capture;
pub mod channel;
pub mod client;
pub mod error;
pub mod mode;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use client::{FtdClient, FtdClientBuilder};
pub use error::Error;
pub use mode::{Mode, ModeMachine, TransitionTable};
pub use session::{MatchScope, Outcome, Phase, Response, Session, SessionConfig};
pub use transport::{AuthMethod, HostKeyVerification, SftpClient, ShellChannel, SshConfig, SshShell};
