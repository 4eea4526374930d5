//! Scripted in-memory device for exercising the engine without SSH.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::ShellChannel;
use crate::error::{Result, TransportError};

type Responder = Box<dyn FnMut(&str) -> Vec<String> + Send>;

/// Lines written to a [`MockChannel`], shared with the test after the
/// channel has been moved into a session.
#[derive(Clone, Default)]
pub(crate) struct SentLog(Arc<Mutex<Vec<String>>>);

impl SentLog {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// A fake device: every line written is answered with the chunks the
/// responder returns for it.
pub(crate) struct MockChannel {
    pending: VecDeque<Vec<u8>>,
    responder: Responder,
    sent: SentLog,
    send_ready: bool,
    fail_sends: bool,
    closed: Arc<Mutex<bool>>,
}

impl MockChannel {
    /// A device that greets with `banner` chunks and answers with `responder`.
    pub(crate) fn new<F>(banner: &[&str], responder: F) -> Self
    where
        F: FnMut(&str) -> Vec<String> + Send + 'static,
    {
        Self {
            pending: banner.iter().map(|c| c.as_bytes().to_vec()).collect(),
            responder: Box::new(responder),
            sent: SentLog::default(),
            send_ready: true,
            fail_sends: false,
            closed: Arc::new(Mutex::new(false)),
        }
    }

    /// A device that answers every line with a single `prompt` chunk.
    pub(crate) fn with_prompt(prompt: &'static str) -> Self {
        Self::new(&[prompt], move |_| vec![prompt.to_string()])
    }

    /// A device that never answers.
    pub(crate) fn silent() -> Self {
        Self::new(&[], |_| Vec::new())
    }

    pub(crate) fn never_send_ready(mut self) -> Self {
        self.send_ready = false;
        self
    }

    pub(crate) fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub(crate) fn sent(&self) -> SentLog {
        self.sent.clone()
    }

    pub(crate) fn closed_flag(&self) -> Arc<Mutex<bool>> {
        self.closed.clone()
    }
}

impl ShellChannel for MockChannel {
    fn send_ready(&mut self) -> bool {
        self.send_ready
    }

    fn recv_ready(&mut self) -> bool {
        !self.pending.is_empty()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_sends {
            return Err(TransportError::Closed.into());
        }
        let text = String::from_utf8_lossy(data);
        let line = text.strip_suffix('\n').unwrap_or(&text).to_string();
        for chunk in (self.responder)(&line) {
            self.pending.push_back(chunk.into_bytes());
        }
        self.sent.0.lock().unwrap().push(line);
        Ok(())
    }

    async fn recv(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut chunk = self.pending.pop_front().ok_or(TransportError::Closed)?;
        if chunk.len() > max {
            let rest = chunk.split_off(max);
            self.pending.push_front(rest);
        }
        Ok(chunk)
    }

    async fn close(&mut self) -> Result<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}
