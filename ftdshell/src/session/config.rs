//! Timing and matching configuration for the session engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What `send_command` tests the expect pattern against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchScope {
    /// Only the chunk just received. A prompt split across two reads is
    /// missed and the call runs into its idle-poll ceiling.
    #[default]
    Chunk,

    /// Everything received during the current call.
    Call,
}

/// Session engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between readiness checks, also used as the settle delay after
    /// a write and before each read.
    pub poll_interval: Duration,

    /// Maximum bytes requested per read.
    pub chunk_size: usize,

    /// Ceiling on not-ready polls before a wait gives up.
    pub max_idle_polls: u32,

    /// What the expect pattern is tested against in `send_command`.
    pub match_scope: MatchScope,

    /// Maximum bytes of session history retained.
    ///
    /// Must be at least `chunk_size`: connect-time synchronization matches
    /// against history, so it has to hold at least one full read.
    pub history_limit: usize,

    /// Mirror every received chunk to the `ftdshell::capture` log target.
    pub debug_capture: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            chunk_size: 1024,
            max_idle_polls: 100,
            match_scope: MatchScope::Chunk,
            history_limit: 1024 * 1024,
            debug_capture: false,
        }
    }
}

impl SessionConfig {
    /// Upper bound on how long one readiness wait can idle.
    pub fn idle_budget(&self) -> Duration {
        self.poll_interval * self.max_idle_polls
    }

    /// Check the values the engine cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than zero".into());
        }
        if self.max_idle_polls == 0 {
            return Err("max_idle_polls must be greater than zero".into());
        }
        if self.history_limit < self.chunk_size {
            return Err(format!(
                "history_limit ({}) must be at least chunk_size ({})",
                self.history_limit, self.chunk_size
            ));
        }
        Ok(())
    }
}
