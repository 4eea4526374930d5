//! Interactive session engine.
//!
//! Drives one [`ShellChannel`] the way an operator would: send a line, poll
//! until output arrives, and stop as soon as the expect pattern shows up.
//! Every wait is a polling loop with a fixed sleep and a ceiling on idle
//! polls; hitting the ceiling is reported as [`Outcome::TimedOut`] rather
//! than an error, and the session stays usable.

mod config;
mod response;

pub use config::{MatchScope, SessionConfig};
pub use response::{Outcome, Phase, Response};

use std::fmt;
use std::time::Instant;

use log::{debug, trace, warn};
use regex::Regex;
use secrecy::SecretString;
use tokio::time::sleep;

use crate::capture::CAPTURE_TARGET;
use crate::channel::patterns::DEFAULT_PROMPT_RE;
use crate::channel::{HistoryBuffer, MASK, Redactor, compile, last_line};
use crate::error::{Result, SessionError};
use crate::transport::ShellChannel;

/// A live interactive session over a [`ShellChannel`].
///
/// All operations take `&mut self`: a session never has more than one
/// command in flight.
pub struct Session<C: ShellChannel> {
    channel: Option<C>,
    config: SessionConfig,

    /// Pattern the connect-time synchronization waits for.
    sync_pattern: Regex,

    history: HistoryBuffer,
    last_prompt: Option<String>,
    redactor: Redactor,

    /// Received text not yet released because it may be the start of the
    /// secret.
    held: String,
}

impl<C: ShellChannel> Session<C> {
    /// Create an unattached session.
    ///
    /// `secret` is scrubbed from everything the session captures.
    pub fn new(config: SessionConfig, secret: Option<SecretString>) -> Self {
        Self {
            channel: None,
            history: HistoryBuffer::new(config.history_limit),
            config,
            sync_pattern: DEFAULT_PROMPT_RE.clone(),
            last_prompt: None,
            redactor: Redactor::new(secret),
            held: String::new(),
        }
    }

    /// Use `pattern` instead of the default prompt pattern when synchronizing
    /// on attach.
    pub fn with_sync_pattern(mut self, pattern: &str) -> Result<Self> {
        self.sync_pattern = compile(pattern)?;
        Ok(self)
    }

    /// Take ownership of `channel` and wait for the device's first prompt.
    ///
    /// Returns [`Outcome::TimedOut`] with [`Phase::Connect`] if the device
    /// stays silent for `max_idle_polls` consecutive polls; the channel
    /// stays attached and it is up to the caller whether to carry on.
    pub async fn attach(&mut self, channel: C) -> Result<Outcome> {
        if self.channel.is_some() {
            return Err(SessionError::AlreadyConnected.into());
        }
        self.channel = Some(channel);
        self.history.clear();
        self.held.clear();
        self.last_prompt = None;
        self.synchronize().await
    }

    async fn synchronize(&mut self) -> Result<Outcome> {
        let poll = self.config.poll_interval;
        let chunk_size = self.config.chunk_size;
        let max_idle = self.config.max_idle_polls;
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;

        let mut idle = 0;
        loop {
            if idle >= max_idle {
                warn!("no prompt after {} idle polls while connecting", idle);
                self.history.extend(&std::mem::take(&mut self.held));
                return Ok(Outcome::TimedOut(Phase::Connect));
            }

            if channel.recv_ready() {
                idle = 0;
                sleep(poll).await;

                let data = channel.recv(chunk_size).await?;
                let raw = String::from_utf8_lossy(&data);
                let text = self.redactor.redact_stream(&mut self.held, &raw);
                trace!("connect: read {} bytes", data.len());
                self.history.extend(&text[..text.len() - self.held.len()]);

                // the whole history, so a prompt split across reads still counts
                if matches_with_held(&self.sync_pattern, self.history.as_str(), &self.held) {
                    debug!("connect: prompt detected");
                    self.history.extend(&std::mem::take(&mut self.held));
                    return Ok(Outcome::Matched);
                }
            } else {
                idle += 1;
                sleep(poll).await;
            }
        }
    }

    /// Send `command` and wait for the default prompt pattern.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let shown = self.redactor.redact(command).into_owned();
        self.exchange(command, &shown, &DEFAULT_PROMPT_RE).await
    }

    /// Send `command` and wait for `pattern`, compiled case-insensitive and
    /// multi-line.
    pub async fn send_command_expect(&mut self, command: &str, pattern: &str) -> Result<Response> {
        let pattern = compile(pattern)?;
        self.send_command_with(command, &pattern).await
    }

    /// Send `command` and wait for an already compiled pattern.
    pub async fn send_command_with(&mut self, command: &str, pattern: &Regex) -> Result<Response> {
        let shown = self.redactor.redact(command).into_owned();
        self.exchange(command, &shown, pattern).await
    }

    /// Answer a password prompt with the session secret.
    pub(crate) async fn send_secret(&mut self, pattern: &Regex) -> Result<Response> {
        let secret = self.redactor.secret().unwrap_or_default().to_string();
        self.exchange(&secret, MASK, pattern).await
    }

    /// One write-then-read cycle. `shown` is what logs and the response
    /// report as the command.
    async fn exchange(&mut self, input: &str, shown: &str, pattern: &Regex) -> Result<Response> {
        let start = Instant::now();
        let poll = self.config.poll_interval;
        let chunk_size = self.config.chunk_size;
        let max_idle = self.config.max_idle_polls;
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;

        let mut idle = 0;
        while !channel.send_ready() {
            idle += 1;
            if idle >= max_idle {
                warn!("channel not writable after {} polls, {:?} not sent", idle, shown);
                return Ok(Response::timed_out(shown, "", Phase::SendReady, start.elapsed()));
            }
            sleep(poll).await;
        }

        channel.send(format!("{input}\n").as_bytes()).await?;
        debug!("sent {:?}", shown);
        sleep(poll).await;

        // Not reset by incoming data: bounds the whole call.
        let mut idle = 0;
        let mut output = String::new();
        self.held.clear();
        loop {
            if idle >= max_idle {
                warn!("no match for {:?} after {} idle polls", shown, idle);
                let rest = std::mem::take(&mut self.held);
                if self.config.debug_capture && !rest.is_empty() {
                    debug!(target: CAPTURE_TARGET, "{}", rest);
                }
                output.push_str(&rest);
                self.history.extend(&rest);
                return Ok(Response::timed_out(
                    shown,
                    output,
                    Phase::ReceiveReady,
                    start.elapsed(),
                ));
            }

            if channel.recv_ready() {
                sleep(poll).await;

                let data = channel.recv(chunk_size).await?;
                let raw = String::from_utf8_lossy(&data);
                // `chunk` may end in part of the secret; that tail stays in
                // `held` until the next read or the end of the call.
                let chunk = self.redactor.redact_stream(&mut self.held, &raw);
                let ready = &chunk[..chunk.len() - self.held.len()];
                output.push_str(ready);
                self.history.extend(ready);

                let matched = match self.config.match_scope {
                    MatchScope::Chunk => pattern.is_match(&chunk),
                    MatchScope::Call => matches_with_held(pattern, &output, &self.held),
                };
                let released = if matched {
                    let rest = std::mem::take(&mut self.held);
                    output.push_str(&rest);
                    self.history.extend(&rest);
                    chunk.as_str()
                } else {
                    ready
                };
                if self.config.debug_capture && !released.is_empty() {
                    debug!(target: CAPTURE_TARGET, "{}", released);
                }

                if matched {
                    let prompt = last_line(&output).to_string();
                    trace!("matched, prompt {:?}", prompt);
                    self.last_prompt = Some(prompt.clone());
                    return Ok(Response::matched(shown, output, prompt, start.elapsed()));
                }
            } else {
                idle += 1;
                sleep(poll).await;
            }
        }
    }

    /// Close the channel and clear captured state. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        self.history.clear();
        self.held.clear();
        self.last_prompt = None;
        if let Some(mut channel) = self.channel.take() {
            channel.close().await?;
            debug!("session closed");
        }
        Ok(())
    }

    /// Whether a channel is attached.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// The final line of the last matched response.
    pub fn last_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    /// Everything received since attach, redacted and bounded by
    /// `history_limit`.
    pub fn history(&self) -> &str {
        self.history.as_str()
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// Match `pattern` against `seen` followed by the text still held back.
fn matches_with_held(pattern: &Regex, seen: &str, held: &str) -> bool {
    if held.is_empty() {
        pattern.is_match(seen)
    } else {
        pattern.is_match(&[seen, held].concat())
    }
}

impl<C: ShellChannel> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.is_open())
            .field("config", &self.config)
            .field("sync_pattern", &self.sync_pattern.as_str())
            .field("history_len", &self.history.len())
            .field("last_prompt", &self.last_prompt)
            .field("redactor", &self.redactor)
            .finish()
    }
}
