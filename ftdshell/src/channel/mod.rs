//! Text-level helpers for the session engine: expect patterns, secret
//! redaction and the bounded history buffer.

mod buffer;
pub mod patterns;
mod redact;

pub use buffer::HistoryBuffer;
pub use patterns::{DEFAULT_PROMPT, compile, last_line};
pub use redact::{MASK, Redactor};
