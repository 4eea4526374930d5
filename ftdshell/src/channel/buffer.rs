//! Bounded session history.
//!
//! Keeps the text received since the connection started, discarding the
//! oldest text once `limit` bytes are exceeded, so that long sessions do
//! not grow memory without bound.

use regex::Regex;

/// Accumulated session output with a byte ceiling.
#[derive(Debug)]
pub struct HistoryBuffer {
    buffer: String,

    /// Maximum retained size in bytes.
    limit: usize,
}

impl HistoryBuffer {
    /// Create an empty history retaining at most `limit` bytes.
    pub fn new(limit: usize) -> Self {
        Self {
            buffer: String::with_capacity(limit.min(4096)),
            limit,
        }
    }

    /// Append text, then drop the oldest text beyond the limit.
    pub fn extend(&mut self, text: &str) {
        self.buffer.push_str(text);

        if self.buffer.len() > self.limit {
            let mut cut = self.buffer.len() - self.limit;
            while !self.buffer.is_char_boundary(cut) {
                cut += 1;
            }
            self.buffer.drain(..cut);
        }
    }

    /// Search the whole retained history.
    pub fn is_match(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.buffer)
    }

    /// The retained history.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Get the current length in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the history is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the history.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut history = HistoryBuffer::new(100);
        history.extend("fw> ");
        history.extend("show version\n");
        assert_eq!(history.as_str(), "fw> show version\n");
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = HistoryBuffer::new(10);
        history.extend("0123456789");
        history.extend("abc");
        assert_eq!(history.as_str(), "3456789abc");
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn test_limit_respects_char_boundaries() {
        let mut history = HistoryBuffer::new(4);
        // 'é' is two bytes; a byte cut at 1 would split it
        history.extend("éabc");
        assert_eq!(history.as_str(), "abc");
    }

    #[test]
    fn test_match_spans_whole_history() {
        let mut history = HistoryBuffer::new(100);
        history.extend("fire");
        history.extend("power> ");
        let re = Regex::new(r"firepower>\s?$").unwrap();
        assert!(history.is_match(&re));
    }

    #[test]
    fn test_clear() {
        let mut history = HistoryBuffer::default();
        history.extend("data");
        history.clear();
        assert!(history.is_empty());
    }
}
